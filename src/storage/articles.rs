//! Article persistence and slug allocation.
//!
//! Slugs are derived from the title on create and whenever the title is
//! updated. The collision set is loaded with a prefix `LIKE` so suffixed
//! variants (`hello-world-1`, ...) are included; an update excludes the
//! article's own row, so saving an unchanged title keeps the current slug.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{Instrument, debug};

use super::{StoreError, UniqueField, is_unique_violation, query_span};
use crate::{
    entities::{ArticleListQuery, ArticleRow, NewArticle, UpdateArticle},
    slug::{ensure_unique_slug, generate_slug},
};

const ARTICLE_SELECT: &str = r"
    SELECT
        a.id, a.slug, a.title, a.description, a.body, a.author_id, a.favorites_count,
        a.created_at, a.updated_at,
        u.username AS author_username, u.bio AS author_bio, u.image AS author_image
    FROM articles a
    JOIN users u ON u.id = a.author_id
";

/// Existing slugs sharing the `base` prefix, optionally ignoring one article.
///
/// # Errors
/// Returns a database error if the lookup fails.
pub async fn existing_slugs(
    pool: &SqlitePool,
    base: &str,
    exclude_id: Option<i64>,
) -> Result<Vec<String>, StoreError> {
    let slugs = sqlx::query_scalar::<_, String>(
        r"
        SELECT slug FROM articles
        WHERE slug LIKE ? AND (? IS NULL OR id != ?)
        ORDER BY slug
        ",
    )
    .bind(format!("{base}%"))
    .bind(exclude_id)
    .bind(exclude_id)
    .fetch_all(pool)
    .instrument(query_span("SELECT", "articles"))
    .await?;
    Ok(slugs)
}

async fn allocate_slug(
    pool: &SqlitePool,
    title: &str,
    exclude_id: Option<i64>,
) -> Result<String, StoreError> {
    let base = generate_slug(title);
    if base.is_empty() {
        return Err(StoreError::EmptySlug);
    }
    let existing = existing_slugs(pool, &base, exclude_id).await?;
    let slug = ensure_unique_slug(&base, &existing);
    debug!(base = %base, slug = %slug, taken = existing.len(), "allocated slug");
    Ok(slug)
}

/// Creates an article owned by `author_id` with a freshly allocated slug.
///
/// # Errors
/// `EmptySlug` if the title has no slug characters, `Conflict(Slug)` if another
/// writer claimed the same slug first.
pub async fn create_article(
    pool: &SqlitePool,
    author_id: i64,
    article: &NewArticle,
) -> Result<ArticleRow, StoreError> {
    let slug = allocate_slug(pool, &article.title, None).await?;
    let now = Utc::now();

    let inserted = sqlx::query_scalar::<_, i64>(
        r"
        INSERT INTO articles (slug, title, description, body, author_id, favorites_count, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, 0, ?, ?)
        RETURNING id
        ",
    )
    .bind(&slug)
    .bind(&article.title)
    .bind(&article.description)
    .bind(&article.body)
    .bind(author_id)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .instrument(query_span("INSERT", "articles"))
    .await;

    let id = match inserted {
        Ok(id) => id,
        Err(err) if is_unique_violation(&err) => {
            return Err(StoreError::Conflict(UniqueField::Slug));
        }
        Err(err) => return Err(StoreError::Database(err)),
    };

    find_article_by_id(pool, id)
        .await?
        .ok_or(StoreError::NotFound)
}

/// # Errors
/// Returns a database error if the lookup fails.
pub async fn find_article_by_slug(
    pool: &SqlitePool,
    slug: &str,
) -> Result<Option<ArticleRow>, StoreError> {
    let query = format!("{ARTICLE_SELECT} WHERE a.slug = ?");
    let row = sqlx::query_as::<_, ArticleRow>(&query)
        .bind(slug)
        .fetch_optional(pool)
        .instrument(query_span("SELECT", "articles"))
        .await?;
    Ok(row)
}

/// # Errors
/// Returns a database error if the lookup fails.
pub async fn find_article_by_id(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<ArticleRow>, StoreError> {
    let query = format!("{ARTICLE_SELECT} WHERE a.id = ?");
    let row = sqlx::query_as::<_, ArticleRow>(&query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(query_span("SELECT", "articles"))
        .await?;
    Ok(row)
}

/// Applies the present fields of `changes` to `current`.
///
/// A present title reallocates the slug with `current` excluded from the
/// collision set.
///
/// An update with no fields returns the stored row untouched.
///
/// # Errors
/// `NotFound` if the row vanished, `EmptySlug` or `Conflict(Slug)` as for create.
pub async fn update_article(
    pool: &SqlitePool,
    current: &ArticleRow,
    changes: &UpdateArticle,
) -> Result<ArticleRow, StoreError> {
    if changes.title.is_none() && changes.description.is_none() && changes.body.is_none() {
        return find_article_by_id(pool, current.id)
            .await?
            .ok_or(StoreError::NotFound);
    }

    let slug = match &changes.title {
        Some(title) => allocate_slug(pool, title, Some(current.id)).await?,
        None => current.slug.clone(),
    };

    let updated = sqlx::query(
        r"
        UPDATE articles SET
            slug = ?,
            title = COALESCE(?, title),
            description = COALESCE(?, description),
            body = COALESCE(?, body),
            updated_at = ?
        WHERE id = ?
        ",
    )
    .bind(&slug)
    .bind(changes.title.as_deref())
    .bind(changes.description.as_deref())
    .bind(changes.body.as_deref())
    .bind(Utc::now())
    .bind(current.id)
    .execute(pool)
    .instrument(query_span("UPDATE", "articles"))
    .await;

    match updated {
        Ok(result) if result.rows_affected() == 0 => return Err(StoreError::NotFound),
        Ok(_) => {}
        Err(err) if is_unique_violation(&err) => {
            return Err(StoreError::Conflict(UniqueField::Slug));
        }
        Err(err) => return Err(StoreError::Database(err)),
    }

    find_article_by_id(pool, current.id)
        .await?
        .ok_or(StoreError::NotFound)
}

/// Deletes the article; its comments go with it.
///
/// # Errors
/// `NotFound` if nothing was deleted.
pub async fn delete_article(pool: &SqlitePool, id: i64) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM articles WHERE id = ?")
        .bind(id)
        .execute(pool)
        .instrument(query_span("DELETE", "articles"))
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

/// Newest first page plus the total number of matching articles.
///
/// # Errors
/// Returns a database error if either query fails.
pub async fn list_articles(
    pool: &SqlitePool,
    query: &ArticleListQuery,
) -> Result<(Vec<ArticleRow>, i64), StoreError> {
    let author = query.author();

    let total = sqlx::query_scalar::<_, i64>(
        r"
        SELECT COUNT(*)
        FROM articles a
        JOIN users u ON u.id = a.author_id
        WHERE (? IS NULL OR u.username = ?)
        ",
    )
    .bind(author)
    .bind(author)
    .fetch_one(pool)
    .instrument(query_span("SELECT", "articles"))
    .await?;

    let sql = format!(
        "{ARTICLE_SELECT} WHERE (? IS NULL OR u.username = ?) ORDER BY a.created_at DESC, a.id DESC LIMIT ? OFFSET ?"
    );
    let rows = sqlx::query_as::<_, ArticleRow>(&sql)
        .bind(author)
        .bind(author)
        .bind(query.limit())
        .bind(query.offset())
        .fetch_all(pool)
        .instrument(query_span("SELECT", "articles"))
        .await?;

    Ok((rows, total))
}
