use axum::{
    Json,
    extract::{
        Extension, Path,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::SqlitePool;
use tracing::info;

use super::principal::Principal;
use crate::{
    api::error::{ApiError, ErrorBody},
    entities::{
        ArticleRow, CommentBody, CommentResponse, CommentsBody, NewCommentRequest,
        ValidationErrors,
    },
    ownership::require_owner,
    storage::{
        articles::find_article_by_slug,
        comments::{create_comment, delete_comment, find_comment, list_comments},
    },
};

async fn load_article(pool: &SqlitePool, slug: &str) -> Result<ArticleRow, ApiError> {
    find_article_by_slug(pool, slug)
        .await?
        .ok_or_else(|| ApiError::not_found("Article not found"))
}

#[utoipa::path(
    get,
    path = "/api/articles/{slug}/comments",
    params(("slug" = String, Path, description = "Article slug")),
    responses(
        (status = 200, description = "Comments, oldest first", body = CommentsBody),
        (status = 404, description = "No article has this slug", body = ErrorBody),
    ),
    tag = "comments"
)]
pub async fn list(
    pool: Extension<SqlitePool>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let article = load_article(&pool, &slug).await?;
    let rows = list_comments(&pool, article.id).await?;

    Ok(Json(CommentsBody {
        comments: rows.into_iter().map(CommentResponse::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/articles/{slug}/comments",
    params(("slug" = String, Path, description = "Article slug")),
    request_body = NewCommentRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentBody),
        (status = 400, description = "Validation failed or malformed JSON", body = ValidationErrors),
        (status = 401, description = "Missing, malformed or expired token", body = ErrorBody),
        (status = 404, description = "No article has this slug", body = ErrorBody),
    ),
    security(("token" = [])),
    tag = "comments"
)]
pub async fn create(
    principal: Principal,
    pool: Extension<SqlitePool>,
    Path(slug): Path<String>,
    payload: Result<Json<NewCommentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(NewCommentRequest { comment }) = payload?;
    comment.validate()?;

    let article = load_article(&pool, &slug).await?;
    let row = create_comment(&pool, article.id, principal.user_id, &comment.body).await?;

    info!(comment_id = row.id, article_id = article.id, "Comment created");

    Ok((
        StatusCode::CREATED,
        Json(CommentBody {
            comment: row.into(),
        }),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/articles/{slug}/comments/{id}",
    params(
        ("slug" = String, Path, description = "Article slug"),
        ("id" = i64, Path, description = "Comment id"),
    ),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 400, description = "Comment id is not a number", body = ErrorBody),
        (status = 401, description = "Missing, malformed or expired token", body = ErrorBody),
        (status = 403, description = "The caller did not write this comment", body = ErrorBody),
        (status = 404, description = "Article or comment not found, or the comment belongs elsewhere", body = ErrorBody),
    ),
    security(("token" = [])),
    tag = "comments"
)]
pub async fn delete(
    principal: Principal,
    pool: Extension<SqlitePool>,
    path: Result<Path<(String, i64)>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path((slug, id)) = path?;

    let article = load_article(&pool, &slug).await?;
    // A comment addressed through another article's path does not exist here.
    let comment = find_comment(&pool, id)
        .await?
        .filter(|comment| comment.article_id == article.id);
    let comment = require_owner(comment, principal.user_id)?;
    delete_comment(&pool, comment.id).await?;

    info!(comment_id = comment.id, article_id = article.id, "Comment deleted");

    Ok(StatusCode::NO_CONTENT)
}
