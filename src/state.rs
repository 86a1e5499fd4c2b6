//! Application state for the diary server.
//!
//! Contains the shared state that is passed to all handlers.

use crate::db::pool::{self, PoolConfig};
use crate::db::DbPool;
use crate::services::AuthService;
use crate::{config, Result};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: DbPool,
    /// Password and API token service.
    pub auth: AuthService,
}

impl AppState {
    /// Create a new application state from the global configuration.
    ///
    /// Opens the database pool and applies the schema.
    pub async fn new() -> Result<Self> {
        let config = config::config();

        let pool_config = PoolConfig::from_config(&config.database);
        let db = pool::connect(&config.database.path, &pool_config).await?;

        crate::db::initialize_schema(&db).await?;

        Ok(Self::with_pool(db))
    }

    /// Build state around an existing pool (schema already applied).
    pub fn with_pool(db: DbPool) -> Self {
        let auth = AuthService::new(db.clone(), config::config().auth.clone());
        Self { db, auth }
    }
}
