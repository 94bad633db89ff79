//! Article endpoints.
//!
//! Reads are public. Writes require a principal, and update/delete load the
//! article fresh on every request before checking that the caller wrote it.

use axum::{
    Json,
    extract::{
        Extension, Path, Query,
        rejection::{JsonRejection, QueryRejection},
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
        ArticleBody, ArticleListQuery, ArticleResponse, ArticlesBody, NewArticleRequest,
        UpdateArticleRequest, ValidationErrors,
    },
    ownership::require_owner,
    storage::articles::{
        create_article, delete_article, find_article_by_slug, list_articles, update_article,
    },
};

#[utoipa::path(
    get,
    path = "/api/articles",
    params(ArticleListQuery),
    responses(
        (status = 200, description = "Newest articles first", body = ArticlesBody),
        (status = 400, description = "Malformed query string", body = ErrorBody),
    ),
    tag = "articles"
)]
pub async fn list(
    pool: Extension<SqlitePool>,
    query: Result<Query<ArticleListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let (rows, total) = list_articles(&pool, &query).await?;

    Ok(Json(ArticlesBody {
        articles: rows.into_iter().map(ArticleResponse::from).collect(),
        articles_count: total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/articles/{slug}",
    params(("slug" = String, Path, description = "Article slug")),
    responses(
        (status = 200, description = "The article", body = ArticleBody),
        (status = 404, description = "No article has this slug", body = ErrorBody),
    ),
    tag = "articles"
)]
pub async fn get_article(
    pool: Extension<SqlitePool>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let row = find_article_by_slug(&pool, &slug)
        .await?
        .ok_or_else(|| ApiError::not_found("Article not found"))?;

    Ok(Json(ArticleBody {
        article: row.into(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/articles",
    request_body = NewArticleRequest,
    responses(
        (status = 201, description = "Article created with a unique slug", body = ArticleBody),
        (status = 400, description = "Validation failed or malformed JSON", body = ValidationErrors),
        (status = 401, description = "Missing, malformed or expired token", body = ErrorBody),
        (status = 409, description = "Another request claimed the same slug", body = ErrorBody),
    ),
    security(("token" = [])),
    tag = "articles"
)]
pub async fn create(
    principal: Principal,
    pool: Extension<SqlitePool>,
    payload: Result<Json<NewArticleRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(NewArticleRequest { article }) = payload?;
    article.validate()?;

    let row = create_article(&pool, principal.user_id, &article).await?;

    info!(article_id = row.id, slug = %row.slug, author = %principal.username, "Article created");

    Ok((
        StatusCode::CREATED,
        Json(ArticleBody {
            article: row.into(),
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/api/articles/{slug}",
    params(("slug" = String, Path, description = "Article slug")),
    request_body = UpdateArticleRequest,
    responses(
        (status = 200, description = "Updated article; a new title yields a new slug", body = ArticleBody),
        (status = 400, description = "Validation failed or malformed JSON", body = ValidationErrors),
        (status = 401, description = "Missing, malformed or expired token", body = ErrorBody),
        (status = 403, description = "The caller did not write this article", body = ErrorBody),
        (status = 404, description = "No article has this slug", body = ErrorBody),
        (status = 409, description = "Another request claimed the same slug", body = ErrorBody),
    ),
    security(("token" = [])),
    tag = "articles"
)]
pub async fn update(
    principal: Principal,
    pool: Extension<SqlitePool>,
    Path(slug): Path<String>,
    payload: Result<Json<UpdateArticleRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let current = require_owner(
        find_article_by_slug(&pool, &slug).await?,
        principal.user_id,
    )?;

    let Json(UpdateArticleRequest { article: changes }) = payload?;
    changes.validate()?;

    let row = update_article(&pool, &current, &changes).await?;

    if row.slug != current.slug {
        info!(article_id = row.id, from = %current.slug, to = %row.slug, "Article slug changed");
    }

    Ok(Json(ArticleBody {
        article: row.into(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/articles/{slug}",
    params(("slug" = String, Path, description = "Article slug")),
    responses(
        (status = 204, description = "Article and its comments deleted"),
        (status = 401, description = "Missing, malformed or expired token", body = ErrorBody),
        (status = 403, description = "The caller did not write this article", body = ErrorBody),
        (status = 404, description = "No article has this slug", body = ErrorBody),
    ),
    security(("token" = [])),
    tag = "articles"
)]
pub async fn delete(
    principal: Principal,
    pool: Extension<SqlitePool>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let current = require_owner(
        find_article_by_slug(&pool, &slug).await?,
        principal.user_id,
    )?;
    delete_article(&pool, current.id).await?;

    info!(article_id = current.id, slug = %current.slug, "Article deleted");

    Ok(StatusCode::NO_CONTENT)
}
