use chrono::Utc;
use sqlx::SqlitePool;
use tracing::Instrument;

use super::{StoreError, query_span};
use crate::entities::{Comment, CommentRow};

const COMMENT_SELECT: &str = r"
    SELECT
        c.id, c.body, c.author_id, c.article_id, c.created_at, c.updated_at,
        u.username AS author_username, u.bio AS author_bio, u.image AS author_image
    FROM comments c
    JOIN users u ON u.id = c.author_id
";

/// # Errors
/// Returns a database error if the insert fails (e.g. the article was deleted).
pub async fn create_comment(
    pool: &SqlitePool,
    article_id: i64,
    author_id: i64,
    body: &str,
) -> Result<CommentRow, StoreError> {
    let now = Utc::now();
    let id = sqlx::query_scalar::<_, i64>(
        r"
        INSERT INTO comments (body, author_id, article_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id
        ",
    )
    .bind(body)
    .bind(author_id)
    .bind(article_id)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .instrument(query_span("INSERT", "comments"))
    .await?;

    let query = format!("{COMMENT_SELECT} WHERE c.id = ?");
    sqlx::query_as::<_, CommentRow>(&query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(query_span("SELECT", "comments"))
        .await?
        .ok_or(StoreError::NotFound)
}

/// Comments on one article, oldest first.
///
/// # Errors
/// Returns a database error if the query fails.
pub async fn list_comments(
    pool: &SqlitePool,
    article_id: i64,
) -> Result<Vec<CommentRow>, StoreError> {
    let query = format!("{COMMENT_SELECT} WHERE c.article_id = ? ORDER BY c.created_at ASC, c.id ASC");
    let rows = sqlx::query_as::<_, CommentRow>(&query)
        .bind(article_id)
        .fetch_all(pool)
        .instrument(query_span("SELECT", "comments"))
        .await?;
    Ok(rows)
}

/// # Errors
/// Returns a database error if the lookup fails.
pub async fn find_comment(pool: &SqlitePool, id: i64) -> Result<Option<Comment>, StoreError> {
    let comment = sqlx::query_as::<_, Comment>(
        "SELECT id, body, author_id, article_id, created_at, updated_at FROM comments WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .instrument(query_span("SELECT", "comments"))
    .await?;
    Ok(comment)
}

/// # Errors
/// `NotFound` if nothing was deleted.
pub async fn delete_comment(pool: &SqlitePool, id: i64) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(id)
        .execute(pool)
        .instrument(query_span("DELETE", "comments"))
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{
        entities::NewArticle,
        storage::{
            articles::{create_article, delete_article},
            connect_in_memory,
            users::create_user,
        },
    };

    async fn setup() -> (SqlitePool, i64, i64) {
        let pool = connect_in_memory().await.unwrap();
        let user = create_user(&pool, "alice", "alice@example.com", "hash")
            .await
            .unwrap();
        let article = create_article(
            &pool,
            user.id,
            &NewArticle {
                title: "Post".to_string(),
                description: "d".to_string(),
                body: "b".to_string(),
            },
        )
        .await
        .unwrap();
        (pool, user.id, article.id)
    }

    #[tokio::test]
    async fn create_list_delete() {
        let (pool, author, article) = setup().await;

        let first = create_comment(&pool, article, author, "first").await.unwrap();
        let second = create_comment(&pool, article, author, "second").await.unwrap();
        assert_eq!(first.author_username, "alice");

        let rows = list_comments(&pool, article).await.unwrap();
        let bodies: Vec<&str> = rows.iter().map(|row| row.body.as_str()).collect();
        assert_eq!(bodies, vec!["first", "second"]);

        let found = find_comment(&pool, second.id).await.unwrap().unwrap();
        assert_eq!(found.article_id, article);
        assert_eq!(found.author_id, author);

        delete_comment(&pool, first.id).await.unwrap();
        assert!(find_comment(&pool, first.id).await.unwrap().is_none());
        assert!(matches!(
            delete_comment(&pool, first.id).await.unwrap_err(),
            StoreError::NotFound
        ));
    }

    #[tokio::test]
    async fn deleting_article_removes_comments() {
        let (pool, author, article) = setup().await;
        let comment = create_comment(&pool, article, author, "bye").await.unwrap();

        delete_article(&pool, article).await.unwrap();
        assert!(find_comment(&pool, comment.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn comment_on_missing_article_fails() {
        let (pool, author, _) = setup().await;
        assert!(create_comment(&pool, 999, author, "orphan").await.is_err());
    }
}
