//! Forward-only schema migrations embedded in the binary.
//!
//! Each file carries an `-- +migrate Up` section (applied) and an optional
//! `-- +migrate Down` section (ignored). Applied files are recorded by name in
//! `schema_migrations`, and each one runs in its own transaction.

use anyhow::{Context, Result, anyhow};
use sqlx::SqlitePool;
use std::collections::HashSet;
use tracing::{Instrument, info};

use super::query_span;

const UP_MARKER: &str = "-- +migrate Up";
const DOWN_MARKER: &str = "-- +migrate Down";

struct Migration {
    filename: &'static str,
    content: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        filename: "0001_create_users.sql",
        content: include_str!("../../migrations/0001_create_users.sql"),
    },
    Migration {
        filename: "0002_create_articles.sql",
        content: include_str!("../../migrations/0002_create_articles.sql"),
    },
    Migration {
        filename: "0003_create_comments.sql",
        content: include_str!("../../migrations/0003_create_comments.sql"),
    },
];

/// Returns the statements between the Up and Down markers, without comment lines.
#[must_use]
pub fn extract_up(content: &str) -> String {
    let mut lines = Vec::new();
    let mut in_up = false;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed == UP_MARKER {
            in_up = true;
            continue;
        }
        if trimmed == DOWN_MARKER {
            break;
        }
        if in_up && !trimmed.starts_with("--") {
            lines.push(line);
        }
    }

    lines.join("\n").trim().to_string()
}

/// Applies every embedded migration not yet listed in `schema_migrations`.
///
/// Returns the filenames applied by this call.
///
/// # Errors
/// Returns an error if a file has no Up section or a statement fails; the
/// failing file's transaction is rolled back.
pub async fn run(pool: &SqlitePool) -> Result<Vec<&'static str>> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            filename TEXT PRIMARY KEY,
            applied_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        ",
    )
    .execute(pool)
    .instrument(query_span("CREATE", "schema_migrations"))
    .await
    .context("Failed to create schema_migrations table")?;

    let applied: HashSet<String> =
        sqlx::query_scalar::<_, String>("SELECT filename FROM schema_migrations")
            .fetch_all(pool)
            .instrument(query_span("SELECT", "schema_migrations"))
            .await
            .context("Failed to read applied migrations")?
            .into_iter()
            .collect();

    let mut pending: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|migration| !applied.contains(migration.filename))
        .collect();
    pending.sort_by_key(|migration| migration.filename);

    let mut newly_applied = Vec::with_capacity(pending.len());
    for migration in pending {
        apply(pool, migration)
            .await
            .with_context(|| format!("Failed to apply migration {}", migration.filename))?;
        info!("Applied migration: {}", migration.filename);
        newly_applied.push(migration.filename);
    }

    Ok(newly_applied)
}

async fn apply(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    let up = extract_up(migration.content);
    if up.is_empty() {
        return Err(anyhow!("no Up section found in {}", migration.filename));
    }

    let mut tx = pool.begin().await?;
    sqlx::raw_sql(&up)
        .execute(&mut *tx)
        .instrument(query_span("MIGRATE", "schema"))
        .await?;
    sqlx::query("INSERT INTO schema_migrations (filename) VALUES (?)")
        .bind(migration.filename)
        .execute(&mut *tx)
        .instrument(query_span("INSERT", "schema_migrations"))
        .await?;
    tx.commit().await?;

    Ok(())
}
