use axum::{
    Json,
    extract::{Extension, Path},
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    api::error::{ApiError, ErrorBody},
    entities::ProfileBody,
    storage::users::find_user_by_username,
};

#[utoipa::path(
    get,
    path = "/api/profiles/{username}",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "Public profile; following is always false", body = ProfileBody),
        (status = 404, description = "No user has this username", body = ErrorBody),
    ),
    tag = "profiles"
)]
pub async fn get_profile(
    pool: Extension<SqlitePool>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = find_user_by_username(&pool, &username)
        .await?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;

    Ok(Json(ProfileBody {
        profile: user.to_profile(),
    }))
}
