//! SQLite connection pool for the diary store.
//!
//! Every connection runs with foreign keys on, so deleting a user or a
//! category cascades through the schema.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};

use super::DbPool;
use crate::config::DatabaseConfig;
use crate::Result;

const IN_MEMORY: &str = ":memory:";

/// How the store's connection pool is sized and how long writers wait.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    /// How long a writer waits on SQLite's write lock before failing.
    pub busy_timeout: Duration,
    /// Hold one connection for the pool's lifetime. An in-memory
    /// database is gone once its last connection closes.
    pub pin_connection: bool,
}

impl PoolConfig {
    pub fn from_config(database: &DatabaseConfig) -> Self {
        Self {
            max_connections: database.max_connections,
            busy_timeout: Duration::from_secs(database.busy_timeout_secs),
            pin_connection: database.path == IN_MEMORY,
        }
    }

    /// A private in-memory store on a single connection.
    pub fn in_memory() -> Self {
        Self {
            max_connections: 1,
            busy_timeout: Duration::from_secs(5),
            pin_connection: true,
        }
    }
}

/// Open the store at `path`, creating the file and its directory if needed.
pub async fn connect(path: &str, config: &PoolConfig) -> Result<DbPool> {
    if path != IN_MEMORY {
        if let Some(dir) = std::path::Path::new(path).parent() {
            if !dir.as_os_str().is_empty() {
                tokio::fs::create_dir_all(dir).await?;
            }
        }
    }

    let connect = SqliteConnectOptions::from_str(path)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(config.busy_timeout)
        .foreign_keys(true);

    let mut options = SqlitePoolOptions::new().max_connections(config.max_connections);
    if config.pin_connection {
        options = options
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }

    Ok(options.connect_with(connect).await?)
}

/// Round-trip a trivial query.
pub async fn ping(pool: &DbPool) -> Result<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Connection counts reported by `/health`.
#[derive(Debug, Clone, Copy)]
pub struct PoolStats {
    pub open: u32,
    pub idle: u32,
    pub max: u32,
}

impl PoolStats {
    pub fn of(pool: &DbPool) -> Self {
        Self {
            open: pool.size(),
            idle: pool.num_idle() as u32,
            max: pool.options().get_max_connections(),
        }
    }
}
