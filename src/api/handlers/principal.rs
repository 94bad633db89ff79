//! Authenticated principal extraction.
//!
//! Flow Overview: read `Authorization: Token <jwt>`, verify the token with the
//! shared [`TokenService`], and hand the caller's identity to the handler. The
//! resolved principal is also stored in the request extensions so later
//! extractors in the same request reuse it.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;
use tracing::debug;

use crate::{api::error::ApiError, credentials::TokenService};

const TOKEN_SCHEME: &str = "Token ";

/// Authenticated user context derived from the bearer token.
#[derive(Clone, Debug)]
pub struct Principal {
    pub user_id: i64,
    pub username: String,
    /// The raw token, echoed back by `GET /api/user`.
    pub token: String,
}

/// Resolve the `Authorization` header into a principal, or return 401.
///
/// # Errors
/// `Unauthorized` with a message naming what was wrong with the header or token.
pub fn require_auth(headers: &HeaderMap, tokens: &TokenService) -> Result<Principal, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("Missing authorization header"))?;
    let header = header
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid authorization header format"))?;
    let token = header
        .strip_prefix(TOKEN_SCHEME)
        .ok_or_else(|| ApiError::unauthorized("Invalid authorization header format"))?
        .trim();
    if token.is_empty() {
        return Err(ApiError::unauthorized("Missing token"));
    }

    let claims = tokens.verify(token).map_err(|err| {
        debug!("Rejected token: {err}");
        ApiError::from(err)
    })?;

    Ok(Principal {
        user_id: claims.user_id,
        username: claims.username,
        token: token.to_string(),
    })
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<Self>() {
            return Ok(principal.clone());
        }

        let tokens = parts
            .extensions
            .get::<Arc<TokenService>>()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("TokenService extension is not installed"))?;

        let principal = require_auth(&parts.headers, &tokens)?;
        parts.extensions.insert(principal.clone());
        Ok(principal)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use secrecy::SecretString;
    use std::time::Duration;

    fn service() -> TokenService {
        TokenService::new(
            &SecretString::from("principal-test-secret"),
            Duration::from_secs(3600),
        )
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn message(err: ApiError) -> String {
        match err {
            ApiError::Unauthorized(message) => message,
            other => panic!("expected Unauthorized, got {other:?}"),
        }
    }

    #[test]
    fn valid_token_yields_principal() {
        let tokens = service();
        let token = tokens.issue(7, "alice").unwrap();

        let principal = require_auth(&headers(&format!("Token {token}")), &tokens).unwrap();
        assert_eq!(principal.user_id, 7);
        assert_eq!(principal.username, "alice");
        assert_eq!(principal.token, token);
    }

    #[test]
    fn missing_header() {
        let err = require_auth(&HeaderMap::new(), &service()).unwrap_err();
        assert_eq!(message(err), "Missing authorization header");
    }

    #[test]
    fn wrong_scheme() {
        let tokens = service();
        let token = tokens.issue(7, "alice").unwrap();
        let err = require_auth(&headers(&format!("Bearer {token}")), &tokens).unwrap_err();
        assert_eq!(message(err), "Invalid authorization header format");
    }

    #[test]
    fn empty_token() {
        let err = require_auth(&headers("Token  "), &service()).unwrap_err();
        assert_eq!(message(err), "Missing token");
    }

    #[test]
    fn garbage_token() {
        let err = require_auth(&headers("Token not.a.jwt"), &service()).unwrap_err();
        assert_eq!(message(err), "Invalid token");
    }

    #[test]
    fn expired_token() {
        let tokens = service();
        let issued_at = chrono::Utc::now().timestamp() - 7200;
        let token = tokens.issue_at(7, "alice", issued_at).unwrap();
        let err = require_auth(&headers(&format!("Token {token}")), &tokens).unwrap_err();
        assert_eq!(message(err), "Token has expired");
    }
}
