//! Database schema and migrations
//!
//! Each migration is a SQL script under `migrations/`, applied once in
//! version order inside its own transaction and recorded in the
//! `migrations` table. Connection pragmas (WAL, foreign keys) come from
//! the pool's connect options, not from here.

use crate::error::{AppError, Result};
use sqlx::sqlite::SqlitePool;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: include_str!("migrations/001_initial_schema.sql"),
}];

/// Tables the repository reads and writes
const REQUIRED_TABLES: &[&str] = &["users", "todos"];

/// Bring the schema up to date and check the tables the app relies on
pub async fn initialize_database(pool: &SqlitePool) -> Result<()> {
    tracing::info!("Initializing database schema");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    let current_version = schema_version(pool).await?;
    tracing::info!("Current database version: {}", current_version);

    for migration in MIGRATIONS.iter().filter(|m| m.version > current_version) {
        apply_migration(pool, migration).await?;
    }

    verify_schema(pool).await?;

    tracing::info!("Database initialization complete");
    Ok(())
}

/// Highest applied migration version, 0 on a fresh database
pub async fn schema_version(pool: &SqlitePool) -> Result<i64> {
    let version: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM migrations")
        .fetch_one(pool)
        .await?;
    Ok(version)
}

async fn apply_migration(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    tracing::info!(
        "Applying migration {} ({})",
        migration.version,
        migration.name
    );

    let mut tx = pool.begin().await?;

    // The script may hold several statements
    sqlx::raw_sql(migration.sql).execute(&mut *tx).await?;

    sqlx::query("INSERT INTO migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!("Migration {} applied", migration.version);
    Ok(())
}

/// Fail when a table the repository needs is missing, and warn when the
/// connection does not enforce the `todos.user_id` cascade.
async fn verify_schema(pool: &SqlitePool) -> Result<()> {
    for &table in REQUIRED_TABLES {
        let found: Option<String> =
            sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(table)
                .fetch_optional(pool)
                .await?;

        if found.is_none() {
            return Err(AppError::Config(format!(
                "Database schema is missing table `{}`",
                table
            )));
        }
    }

    let foreign_keys: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
        .fetch_one(pool)
        .await?;
    if foreign_keys == 0 {
        tracing::warn!("Foreign keys are off; deleting a user will not remove their todos");
    }

    Ok(())
}
