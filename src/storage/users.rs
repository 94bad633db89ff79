use chrono::Utc;
use sqlx::SqlitePool;
use tracing::Instrument;

use super::{StoreError, UniqueField, is_unique_violation, query_span};
use crate::entities::User;

const USER_COLUMNS: &str =
    "id, username, email, password_hash, bio, image, created_at, updated_at";

/// Column values for a profile update; `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
}

/// Inserts a user with an empty bio and image.
///
/// # Errors
/// `Conflict(Email | Username)` when either is already registered.
pub async fn create_user(
    pool: &SqlitePool,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<User, StoreError> {
    let now = Utc::now();
    let query = format!(
        r"
        INSERT INTO users (username, email, password_hash, bio, image, created_at, updated_at)
        VALUES (?, ?, ?, '', '', ?, ?)
        RETURNING {USER_COLUMNS}
        "
    );

    let inserted = sqlx::query_as::<_, User>(&query)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .instrument(query_span("INSERT", "users"))
        .await;

    match inserted {
        Ok(user) => Ok(user),
        Err(err) if is_unique_violation(&err) => {
            Err(StoreError::Conflict(conflicting_field(pool, Some(email), None).await?))
        }
        Err(err) => Err(StoreError::Database(err)),
    }
}

/// # Errors
/// Returns a database error if the lookup fails.
pub async fn find_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, StoreError> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
    let user = sqlx::query_as::<_, User>(&query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(query_span("SELECT", "users"))
        .await?;
    Ok(user)
}

/// Email comparison is case-insensitive.
///
/// # Errors
/// Returns a database error if the lookup fails.
pub async fn find_user_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<User>, StoreError> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ? COLLATE NOCASE");
    let user = sqlx::query_as::<_, User>(&query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(query_span("SELECT", "users"))
        .await?;
    Ok(user)
}

/// # Errors
/// Returns a database error if the lookup fails.
pub async fn find_user_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<User>, StoreError> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?");
    let user = sqlx::query_as::<_, User>(&query)
        .bind(username)
        .fetch_optional(pool)
        .instrument(query_span("SELECT", "users"))
        .await?;
    Ok(user)
}

/// Applies `changes` and bumps `updated_at`.
///
/// # Errors
/// `NotFound` if the user no longer exists, `Conflict` when the new email or
/// username belongs to someone else.
pub async fn update_user(
    pool: &SqlitePool,
    id: i64,
    changes: UserChanges,
) -> Result<User, StoreError> {
    let query = format!(
        r"
        UPDATE users SET
            username = COALESCE(?, username),
            email = COALESCE(?, email),
            password_hash = COALESCE(?, password_hash),
            bio = COALESCE(?, bio),
            image = COALESCE(?, image),
            updated_at = ?
        WHERE id = ?
        RETURNING {USER_COLUMNS}
        "
    );

    let updated = sqlx::query_as::<_, User>(&query)
        .bind(changes.username.as_deref())
        .bind(changes.email.as_deref())
        .bind(changes.password_hash.as_deref())
        .bind(changes.bio.as_deref())
        .bind(changes.image.as_deref())
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(pool)
        .instrument(query_span("UPDATE", "users"))
        .await;

    match updated {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(StoreError::NotFound),
        Err(err) if is_unique_violation(&err) => {
            let field = conflicting_field(pool, changes.email.as_deref(), Some(id)).await?;
            Err(StoreError::Conflict(field))
        }
        Err(err) => Err(StoreError::Database(err)),
    }
}

// Works out which unique column collided by looking the email up again.
async fn conflicting_field(
    pool: &SqlitePool,
    email: Option<&str>,
    exclude_id: Option<i64>,
) -> Result<UniqueField, StoreError> {
    let Some(email) = email else {
        return Ok(UniqueField::Username);
    };
    let taken = find_user_by_email(pool, email)
        .await?
        .is_some_and(|user| Some(user.id) != exclude_id);
    Ok(if taken {
        UniqueField::Email
    } else {
        UniqueField::Username
    })
}
