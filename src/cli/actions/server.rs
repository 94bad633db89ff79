use crate::{api, cli::telemetry, config::Config};
use anyhow::Result;
use secrecy::SecretString;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub host: String,
    pub db_path: String,
    pub jwt_secret: Option<SecretString>,
    pub jwt_expiry_hours: u64,
    pub bcrypt_cost: u32,
    pub cors_origins: String,
    pub environment: String,
}

impl Args {
    /// Build the runtime configuration; an unset secret keeps the placeholder.
    #[must_use]
    pub fn config(&self) -> Config {
        let config = Config::new()
            .with_host(self.host.clone())
            .with_port(self.port)
            .with_db_path(self.db_path.clone())
            .with_jwt_expiry_hours(self.jwt_expiry_hours)
            .with_bcrypt_cost(self.bcrypt_cost)
            .with_cors_origins(&self.cors_origins)
            .with_environment(self.environment.clone());

        match &self.jwt_secret {
            Some(secret) => config.with_jwt_secret(secret.clone()),
            None => config,
        }
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the configuration is rejected or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let result = api::new(args.config()).await;

    telemetry::shutdown_tracer();

    result
}

fn log_startup_args(args: &Args) {
    let entries = [
        ("listen", format!("{}:{}", args.host, args.port)),
        ("db_path", args.db_path.clone()),
        ("environment", args.environment.clone()),
        ("jwt_secret_set", args.jwt_secret.is_some().to_string()),
        ("jwt_expiry_hours", args.jwt_expiry_hours.to_string()),
        ("bcrypt_cost", args.bcrypt_cost.to_string()),
        ("cors_origins", args.cors_origins.clone()),
    ];
    log_entries("Startup configuration", &entries);
}

fn log_entries(title: &str, entries: &[(&str, String)]) {
    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!("{}\n\n{title}:", conduit_banner());
    for (key, value) in entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn conduit_banner() -> String {
    let short_hash = short_commit(crate::GIT_COMMIT_HASH);
    CONDUIT_BANNER.replace(
        "{VERSION}",
        &format!(" - {} - {}", env!("CARGO_PKG_VERSION"), short_hash),
    )
}

fn short_commit(hash: &str) -> String {
    let trimmed = hash.trim();
    trimmed.get(..7).unwrap_or(trimmed).to_string()
}

const CONDUIT_BANNER: &str = r"
  ___  ___  _ __   __| |_   _(_) |_
 / __|/ _ \| '_ \ / _` | | | | | __|
| (__| (_) | | | | (_| | |_| | | |_
 \___|\___/|_| |_|\__,_|\__,_|_|\__| {VERSION}";

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn args() -> Args {
        Args {
            port: 8080,
            host: "::".to_string(),
            db_path: "/tmp/conduit.db".to_string(),
            jwt_secret: None,
            jwt_expiry_hours: 2,
            bcrypt_cost: 4,
            cors_origins: "http://a.dev, http://b.dev".to_string(),
            environment: "development".to_string(),
        }
    }

    #[test]
    fn config_from_args() {
        let config = args().config();
        assert_eq!(config.bind_address(), "[::]:8080");
        assert_eq!(config.db_path(), "/tmp/conduit.db");
        assert_eq!(config.jwt_ttl().as_secs(), 7200);
        assert_eq!(config.bcrypt_cost(), 4);
        assert_eq!(config.cors_origins(), ["http://a.dev", "http://b.dev"]);
        assert!(config.uses_placeholder_secret());
    }

    #[test]
    fn config_keeps_explicit_secret() {
        let mut args = args();
        args.jwt_secret = Some(SecretString::from("explicit"));
        assert_eq!(args.config().jwt_secret().expose_secret(), "explicit");
    }

    #[test]
    fn short_commit_truncates() {
        assert_eq!(short_commit("0123456789abcdef"), "0123456");
        assert_eq!(short_commit("abc"), "abc");
        assert_eq!(short_commit(" unknown "), "unknown");
    }

    #[test]
    fn banner_has_version() {
        assert!(conduit_banner().contains(env!("CARGO_PKG_VERSION")));
    }
}
