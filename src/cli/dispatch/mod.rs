use crate::cli::{
    actions::{Action, server::Args},
    commands::auth::{ARG_BCRYPT_COST, ARG_JWT_EXPIRY_HOURS, ARG_JWT_SECRET},
};
use crate::config::{
    DEFAULT_BCRYPT_COST, DEFAULT_CORS_ORIGINS, DEFAULT_DB_PATH, DEFAULT_ENVIRONMENT,
    DEFAULT_HOST, DEFAULT_JWT_EXPIRY_HOURS, DEFAULT_PORT,
};
use anyhow::Result;
use secrecy::SecretString;

fn string_arg(matches: &clap::ArgMatches, id: &str, default: &str) -> String {
    matches
        .get_one::<String>(id)
        .cloned()
        .unwrap_or_else(|| default.to_string())
}

/// # Errors
/// Returns an error if the arguments cannot be mapped to an action.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    Ok(Action::Server(Args {
        port: matches
            .get_one::<u16>("port")
            .copied()
            .unwrap_or(DEFAULT_PORT),
        host: string_arg(matches, "host", DEFAULT_HOST),
        db_path: string_arg(matches, "db-path", DEFAULT_DB_PATH),
        jwt_secret: matches
            .get_one::<String>(ARG_JWT_SECRET)
            .map(|secret| SecretString::from(secret.clone())),
        jwt_expiry_hours: matches
            .get_one::<u64>(ARG_JWT_EXPIRY_HOURS)
            .copied()
            .unwrap_or(DEFAULT_JWT_EXPIRY_HOURS),
        bcrypt_cost: matches
            .get_one::<u32>(ARG_BCRYPT_COST)
            .copied()
            .unwrap_or(DEFAULT_BCRYPT_COST),
        cors_origins: string_arg(matches, "cors-origins", DEFAULT_CORS_ORIGINS),
        environment: string_arg(matches, "env", DEFAULT_ENVIRONMENT),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cli::commands;
    use secrecy::ExposeSecret;

    #[test]
    fn maps_matches_to_server_args() {
        temp_env::with_vars_unset(["CONDUIT_JWT_SECRET", "CONDUIT_PORT", "CONDUIT_ENV"], || {
            let matches = commands::new().get_matches_from(vec![
                "conduit",
                "--port",
                "9090",
                "--jwt-secret",
                "top-secret",
                "--env",
                "production",
            ]);

            let Action::Server(args) = handler(&matches).unwrap();
            assert_eq!(args.port, 9090);
            assert_eq!(args.environment, "production");
            assert_eq!(
                args.jwt_secret.as_ref().map(|s| s.expose_secret().to_string()),
                Some("top-secret".to_string())
            );

            let config = args.config();
            assert!(config.is_production());
            assert!(config.validate().is_ok());
        });
    }

    #[test]
    fn missing_secret_falls_back_to_placeholder() {
        temp_env::with_vars_unset(["CONDUIT_JWT_SECRET", "CONDUIT_ENV"], || {
            let matches = commands::new().get_matches_from(vec!["conduit"]);
            let Action::Server(args) = handler(&matches).unwrap();
            assert!(args.jwt_secret.is_none());
            assert!(args.config().uses_placeholder_secret());
        });
    }
}
