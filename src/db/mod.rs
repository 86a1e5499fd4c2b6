//! Database layer for the diary server.
//!
//! Provides SQLite connection pooling and one query module per record
//! type. Every query module exposes the same repository surface:
//! `create_*`, `list_*` (owner-scoped), `get_*`, `update_*`, `delete_*`.

mod articles;
mod categories;
mod entries;
pub mod pool;
mod users;

pub use articles::*;
pub use categories::*;
pub use entries::*;
pub use users::*;

use crate::Result;
use tracing::info;

use pool::PoolConfig;

/// Type alias for the SQLite connection pool.
pub type DbPool = sqlx::SqlitePool;

/// Open a private in-memory database with the schema applied.
///
/// Uses a single connection so every query sees the same database.
pub async fn open_in_memory() -> Result<DbPool> {
    let pool = pool::connect(":memory:", &PoolConfig::in_memory()).await?;
    initialize_schema(&pool).await?;
    Ok(pool)
}

/// Initialize the database schema.
///
/// Applies the complete schema from schema.sql. Uses IF NOT EXISTS
/// clauses so it's safe to run multiple times.
pub async fn initialize_schema(pool: &DbPool) -> Result<()> {
    let schema = include_str!("../../schema.sql");

    info!("Initializing database schema");

    for statement in schema.split(';') {
        // Strip comment lines, keeping only actual SQL
        let clean_stmt: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");
        let clean_stmt = clean_stmt.trim();
        if clean_stmt.is_empty() {
            continue;
        }
        sqlx::query(clean_stmt).execute(pool).await?;
    }

    info!("Database schema initialized successfully");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_schema_initialization() {
        let pool = open_in_memory().await.unwrap();

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name"
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        let table_names: Vec<&str> = tables.iter().map(|(n,)| n.as_str()).collect();

        assert_eq!(
            table_names,
            vec!["api_tokens", "articles", "categories", "entries", "users"]
        );
    }

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let pool = open_in_memory().await.unwrap();
        initialize_schema(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let pool = open_in_memory().await.unwrap();
        let (enabled,): (i64,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(enabled, 1);
    }
}
