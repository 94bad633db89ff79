//! SQLite persistence for users, articles and comments.
//!
//! All access goes through a pool capped at one connection, so statements are
//! serialized. Unique constraints stay authoritative: a lost race between the
//! slug lookup and the insert surfaces as [`StoreError::Conflict`].

use anyhow::{Context, Result};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use std::{fmt, path::Path, str::FromStr, time::Duration};
use thiserror::Error;
use tracing::{Instrument, Span, debug, info_span};

pub mod articles;
pub mod comments;
pub mod migrations;
pub mod users;

/// Column guarded by a `UNIQUE` constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    Username,
    Slug,
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Email => "email",
            Self::Username => "username",
            Self::Slug => "slug",
        })
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("title does not contain any characters usable in a slug")]
    EmptySlug,
    #[error("{0} already exists")]
    Conflict(UniqueField),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Opens (creating if needed) the database file and applies pending migrations.
///
/// # Errors
/// Returns an error if the parent directory cannot be created, the file cannot
/// be opened or a migration fails.
pub async fn connect(path: &str) -> Result<SqlitePool> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create database directory: {}", parent.display()))?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open database: {path}"))?;

    migrations::run(&pool).await?;
    Ok(pool)
}

/// Private in-memory database with the schema applied; it lives as long as the pool.
///
/// # Errors
/// Returns an error if SQLite cannot be opened or a migration fails.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    // The single connection must never be recycled or the database disappears.
    let pool = SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .context("Failed to open in-memory database")?;

    migrations::run(&pool).await?;
    Ok(pool)
}

/// Round trip used by `/health`.
///
/// # Errors
/// Returns the driver error when the connection is unusable.
pub async fn ping(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .instrument(query_span("PING", "none"))
        .await?;
    debug!("database ping ok");
    Ok(())
}

pub(crate) fn query_span(operation: &'static str, table: &'static str) -> Span {
    info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = operation,
        db.sql.table = table
    )
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}
