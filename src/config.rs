//! Runtime configuration shared by the server, token service and storage.

use anyhow::{Result, anyhow};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_HOST: &str = "::";
pub const DEFAULT_DB_PATH: &str = "./data/conduit.db";
pub const DEFAULT_JWT_EXPIRY_HOURS: u64 = 72;
pub const DEFAULT_BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;
const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;
pub const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000";
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Signing secret used when none is configured. Refused in production.
pub const PLACEHOLDER_JWT_SECRET: &str = "conduit-development-secret-change-me";

#[derive(Clone, Debug)]
pub struct Config {
    host: String,
    port: u16,
    db_path: String,
    jwt_secret: SecretString,
    jwt_ttl: Duration,
    bcrypt_cost: u32,
    cors_origins: Vec<String>,
    environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            db_path: DEFAULT_DB_PATH.to_string(),
            jwt_secret: SecretString::from(PLACEHOLDER_JWT_SECRET),
            jwt_ttl: Duration::from_secs(DEFAULT_JWT_EXPIRY_HOURS * 3600),
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            cors_origins: split_origins(DEFAULT_CORS_ORIGINS),
            environment: DEFAULT_ENVIRONMENT.to_string(),
        }
    }

    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_db_path(mut self, path: impl Into<String>) -> Self {
        self.db_path = path.into();
        self
    }

    #[must_use]
    pub fn with_jwt_secret(mut self, secret: SecretString) -> Self {
        self.jwt_secret = secret;
        self
    }

    #[must_use]
    pub fn with_jwt_expiry_hours(mut self, hours: u64) -> Self {
        self.jwt_ttl = Duration::from_secs(hours.saturating_mul(3600));
        self
    }

    #[must_use]
    pub fn with_jwt_ttl(mut self, ttl: Duration) -> Self {
        self.jwt_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    /// Accepts a comma separated list; blank entries are dropped.
    #[must_use]
    pub fn with_cors_origins(mut self, origins: &str) -> Self {
        self.cors_origins = split_origins(origins);
        self
    }

    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    #[must_use]
    pub fn jwt_secret(&self) -> &SecretString {
        &self.jwt_secret
    }

    #[must_use]
    pub fn jwt_ttl(&self) -> Duration {
        self.jwt_ttl
    }

    #[must_use]
    pub fn bcrypt_cost(&self) -> u32 {
        self.bcrypt_cost
    }

    #[must_use]
    pub fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }

    #[must_use]
    pub fn environment(&self) -> &str {
        &self.environment
    }

    #[must_use]
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    #[must_use]
    pub fn uses_placeholder_secret(&self) -> bool {
        self.jwt_secret.expose_secret() == PLACEHOLDER_JWT_SECRET
    }

    /// Address the listener binds to, bracketing IPv6 hosts.
    #[must_use]
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Checks settings that would make the server insecure or unusable.
    ///
    /// # Errors
    /// Returns an error when the placeholder secret is used in production, the
    /// secret is empty, the token TTL is zero or the bcrypt cost is out of range.
    pub fn validate(&self) -> Result<()> {
        let secret = self.jwt_secret.expose_secret();
        if secret.is_empty() {
            return Err(anyhow!("JWT secret must not be empty"));
        }
        if self.is_production() && self.uses_placeholder_secret() {
            return Err(anyhow!("CONDUIT_JWT_SECRET must be set in production"));
        }
        if self.jwt_ttl.is_zero() {
            return Err(anyhow!("JWT expiry must be greater than zero"));
        }
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.bcrypt_cost) {
            return Err(anyhow!(
                "bcrypt cost must be between {MIN_BCRYPT_COST} and {MAX_BCRYPT_COST}"
            ));
        }
        Ok(())
    }
}

fn split_origins(origins: &str) -> Vec<String> {
    origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(ToString::to_string)
        .collect()
}
