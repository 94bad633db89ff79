//! Maps domain failures onto HTTP responses.
//!
//! Every error body is JSON: `{"errors": [...]}` for validation failures and
//! `{"error": "..."}` for everything else. Internal details are logged and
//! never returned to the client.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};
use utoipa::ToSchema;

use crate::{
    credentials::{TokenError, password::PasswordError},
    entities::ValidationErrors,
    ownership::OwnershipError,
    storage::{StoreError, UniqueField},
};

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn not_found(message: &str) -> Self {
        Self::NotFound(message.to_string())
    }

    pub fn unauthorized(message: &str) -> Self {
        Self::Unauthorized(message.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::Validation(errors) => (status, Json(errors)).into_response(),
            Self::Internal(err) => {
                error!("Internal error: {err:#}");
                let body = ErrorBody {
                    error: "Internal server error".to_string(),
                };
                (status, Json(body)).into_response()
            }
            other => {
                debug!(status = %status, "request failed: {other}");
                let body = ErrorBody {
                    error: other.to_string(),
                };
                (status, Json(body)).into_response()
            }
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(inner) => Self::Internal(anyhow::Error::new(inner)),
            other => Self::Unauthorized(other.to_string()),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        Self::Internal(anyhow::Error::new(err))
    }
}

impl From<OwnershipError> for ApiError {
    fn from(err: OwnershipError) -> Self {
        match err {
            OwnershipError::NotFound(message) => Self::NotFound(message.to_string()),
            OwnershipError::Forbidden(message) => Self::Forbidden(message.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::not_found("Resource not found"),
            StoreError::EmptySlug => Self::Validation(ValidationErrors::single(
                "title",
                "title must contain at least one letter or digit",
            )),
            StoreError::Conflict(UniqueField::Email) => {
                Self::BadRequest("User with this email already exists".to_string())
            }
            StoreError::Conflict(UniqueField::Username) => {
                Self::BadRequest("User with this username already exists".to_string())
            }
            StoreError::Conflict(UniqueField::Slug) => {
                Self::Conflict("Article with this title already exists".to_string())
            }
            StoreError::Database(err) => Self::Internal(anyhow::Error::new(err)),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!("rejected JSON body: {rejection}");
        Self::BadRequest("Invalid JSON format".to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        debug!("rejected query string: {rejection}");
        Self::BadRequest("Invalid query parameters".to_string())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        debug!("rejected path parameters: {rejection}");
        Self::BadRequest("Invalid path parameters".to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_body_lists_fields() {
        let response =
            ApiError::from(ValidationErrors::single("email", "email is required")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"errors": [{"field": "email", "message": "email is required"}]})
        );
    }

    #[tokio::test]
    async fn internal_error_hides_details() {
        let response = ApiError::Internal(anyhow::anyhow!("disk on fire")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "Internal server error"})
        );
    }

    #[tokio::test]
    async fn token_errors_are_distinct_401s() {
        let expired = ApiError::from(TokenError::Expired).into_response();
        assert_eq!(expired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(expired).await,
            serde_json::json!({"error": "Token has expired"})
        );

        let invalid = ApiError::from(TokenError::Invalid).into_response();
        assert_eq!(
            body_json(invalid).await,
            serde_json::json!({"error": "Invalid token"})
        );
    }

    #[test]
    fn store_errors_map_to_statuses() {
        let cases = [
            (StoreError::NotFound, StatusCode::NOT_FOUND),
            (StoreError::EmptySlug, StatusCode::BAD_REQUEST),
            (StoreError::Conflict(UniqueField::Email), StatusCode::BAD_REQUEST),
            (StoreError::Conflict(UniqueField::Username), StatusCode::BAD_REQUEST),
            (StoreError::Conflict(UniqueField::Slug), StatusCode::CONFLICT),
            (
                StoreError::Database(sqlx::Error::PoolClosed),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn ownership_errors_map_to_statuses() {
        assert_eq!(
            ApiError::from(OwnershipError::Forbidden("nope")).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(OwnershipError::NotFound("gone")).status(),
            StatusCode::NOT_FOUND
        );
    }
}
