//! Registration, login and self-service account endpoints.
//!
//! Flow Overview:
//! 1) Validate the `{"user": ...}` payload, collecting every field error.
//! 2) Check email and username availability so duplicates get a readable 400.
//! 3) Hash passwords off the async runtime and issue a fresh token on success.

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, info};

use super::principal::Principal;
use crate::{
    api::error::{ApiError, ErrorBody},
    config::Config,
    credentials::{TokenService, password},
    entities::{LoginRequest, RegisterRequest, UpdateUserRequest, UserBody, ValidationErrors},
    storage::{
        StoreError,
        users::{
            UserChanges, create_user, find_user_by_email, find_user_by_id, find_user_by_username,
            update_user,
        },
    },
};

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = UserBody),
        (status = 400, description = "Validation failed, malformed JSON or duplicate email/username", body = ValidationErrors),
    ),
    tag = "users"
)]
pub async fn register(
    pool: Extension<SqlitePool>,
    tokens: Extension<Arc<TokenService>>,
    config: Extension<Arc<Config>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(RegisterRequest { user }) = payload?;
    user.validate()?;

    if find_user_by_email(&pool, &user.email).await?.is_some() {
        return Err(ApiError::BadRequest(
            "User with this email already exists".to_string(),
        ));
    }
    if find_user_by_username(&pool, &user.username).await?.is_some() {
        return Err(ApiError::BadRequest(
            "User with this username already exists".to_string(),
        ));
    }

    let password_hash = password::hash(user.password, config.bcrypt_cost()).await?;
    let created = create_user(&pool, &user.username, &user.email, &password_hash).await?;
    let token = tokens.issue(created.id, &created.username)?;

    info!(user_id = created.id, username = %created.username, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(UserBody {
            user: created.to_response(token),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted", body = UserBody),
        (status = 400, description = "Validation failed or malformed JSON", body = ValidationErrors),
        (status = 401, description = "Invalid email or password", body = ErrorBody),
    ),
    tag = "users"
)]
pub async fn login(
    pool: Extension<SqlitePool>,
    tokens: Extension<Arc<TokenService>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(LoginRequest { user: credentials }) = payload?;
    credentials.validate()?;

    let Some(user) = find_user_by_email(&pool, &credentials.email).await? else {
        debug!("Login for unknown email");
        return Err(ApiError::unauthorized("Invalid email or password"));
    };

    if !password::verify(credentials.password, user.password_hash.clone()).await? {
        debug!(user_id = user.id, "Login with wrong password");
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    let token = tokens.issue(user.id, &user.username)?;
    Ok(Json(UserBody {
        user: user.to_response(token),
    }))
}

#[utoipa::path(
    get,
    path = "/api/user",
    responses(
        (status = 200, description = "The authenticated user", body = UserBody),
        (status = 401, description = "Missing, malformed or expired token", body = ErrorBody),
        (status = 404, description = "The token's user no longer exists", body = ErrorBody),
    ),
    security(("token" = [])),
    tag = "users"
)]
pub async fn current_user(
    principal: Principal,
    pool: Extension<SqlitePool>,
) -> Result<impl IntoResponse, ApiError> {
    let user = find_user_by_id(&pool, principal.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(UserBody {
        user: user.to_response(principal.token),
    }))
}

#[utoipa::path(
    put,
    path = "/api/user",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user with a fresh token", body = UserBody),
        (status = 400, description = "Validation failed, malformed JSON or email/username taken", body = ValidationErrors),
        (status = 401, description = "Missing, malformed or expired token", body = ErrorBody),
        (status = 404, description = "The token's user no longer exists", body = ErrorBody),
    ),
    security(("token" = [])),
    tag = "users"
)]
pub async fn update_current_user(
    principal: Principal,
    pool: Extension<SqlitePool>,
    tokens: Extension<Arc<TokenService>>,
    config: Extension<Arc<Config>>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(UpdateUserRequest { user: changes }) = payload?;
    changes.validate()?;

    if changes.is_empty() {
        let user = find_user_by_id(&pool, principal.user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        let token = tokens.issue(user.id, &user.username)?;
        debug!(user_id = user.id, "Empty user update, nothing written");
        return Ok(Json(UserBody {
            user: user.to_response(token),
        }));
    }

    if let Some(email) = &changes.email {
        let taken = find_user_by_email(&pool, email)
            .await?
            .is_some_and(|other| other.id != principal.user_id);
        if taken {
            return Err(ApiError::BadRequest("Email already exists".to_string()));
        }
    }
    if let Some(username) = &changes.username {
        let taken = find_user_by_username(&pool, username)
            .await?
            .is_some_and(|other| other.id != principal.user_id);
        if taken {
            return Err(ApiError::BadRequest("Username already exists".to_string()));
        }
    }

    let password_hash = match changes.password {
        Some(plain) => Some(password::hash(plain, config.bcrypt_cost()).await?),
        None => None,
    };

    let updated = update_user(
        &pool,
        principal.user_id,
        UserChanges {
            username: changes.username,
            email: changes.email,
            password_hash,
            bio: changes.bio,
            image: changes.image,
        },
    )
    .await
    .map_err(|err| match err {
        StoreError::NotFound => ApiError::not_found("User not found"),
        other => ApiError::from(other),
    })?;

    // Username may have changed, so the old token's claims are stale.
    let token = tokens.issue(updated.id, &updated.username)?;

    info!(user_id = updated.id, "User updated");

    Ok(Json(UserBody {
        user: updated.to_response(token),
    }))
}
