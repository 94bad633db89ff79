//! Stateless HS256 access tokens.
//!
//! Tokens carry the user id and username alongside the registered claims. They
//! are never stored server side, so a token stays valid until `exp` even after
//! the user changes their password.

use crate::{SERVICE_NAME, config::Config};
use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub user_id: i64,
    pub username: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub iss: String,
    pub sub: String,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,
    #[error("Invalid token")]
    Invalid,
    #[error("Token is missing the {0} claim")]
    MissingClaim(&'static str),
    #[error("Failed to sign token: {0}")]
    Signing(jsonwebtoken::errors::Error),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::Invalid,
        }
    }
}

pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    #[must_use]
    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        let key = secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_issuer(&[SERVICE_NAME]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(key),
            decoding: DecodingKey::from_secret(key),
            validation,
            ttl,
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.jwt_secret(), config.jwt_ttl())
    }

    /// Signs a token for the given user, valid from now until now + TTL.
    ///
    /// # Errors
    /// Returns `TokenError::Signing` if encoding fails.
    pub fn issue(&self, user_id: i64, username: &str) -> Result<String, TokenError> {
        self.issue_at(user_id, username, Utc::now().timestamp())
    }

    pub(crate) fn issue_at(
        &self,
        user_id: i64,
        username: &str,
        issued_at: i64,
    ) -> Result<String, TokenError> {
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            user_id,
            username: username.to_string(),
            iat: issued_at,
            nbf: issued_at,
            exp: issued_at.saturating_add(ttl),
            iss: SERVICE_NAME.to_string(),
            sub: format!("user:{user_id}"),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Signing)
    }

    /// Verifies signature, algorithm, issuer and time window with zero leeway.
    ///
    /// # Errors
    /// Returns `TokenError::Expired` past `exp`, `TokenError::Invalid` otherwise.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        Ok(data.claims)
    }

    /// # Errors
    /// Returns `TokenError::MissingClaim` when `user_id` is absent or not an integer.
    pub fn user_id(&self, token: &str) -> Result<i64, TokenError> {
        self.raw_claims(token)?
            .get("user_id")
            .and_then(Value::as_i64)
            .ok_or(TokenError::MissingClaim("user_id"))
    }

    /// # Errors
    /// Returns `TokenError::MissingClaim` when `username` is absent or not a string.
    pub fn username(&self, token: &str) -> Result<String, TokenError> {
        self.raw_claims(token)?
            .get("username")
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .ok_or(TokenError::MissingClaim("username"))
    }

    // Validated like `verify`, but without requiring the private claims to be present.
    fn raw_claims(&self, token: &str) -> Result<Map<String, Value>, TokenError> {
        let data = decode::<Map<String, Value>>(token, &self.decoding, &self.validation)?;
        Ok(data.claims)
    }
}
