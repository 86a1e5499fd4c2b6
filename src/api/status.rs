//! Status Routes
//!
//! Routes:
//! - GET /health - Liveness plus a database ping (200 or 503)

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::db::pool::{self, PoolStats};
use crate::AppState;

/// Build status routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub database: DatabaseStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Serialize)]
pub struct DatabaseStatus {
    pub connected: bool,
    pub pool_size: u32,
    pub idle_connections: u32,
}

/// Health check.
///
/// GET /health
///
/// Returns 503 when the database does not answer.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let connected = match pool::ping(&state.db).await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Database health check failed");
            false
        }
    };

    let stats = PoolStats::of(&state.db);
    let status = if connected {
        HealthStatus::Healthy
    } else {
        HealthStatus::Unhealthy
    };
    let code = if connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION").into(),
            timestamp: Utc::now(),
            database: DatabaseStatus {
                connected,
                pool_size: stats.open,
                idle_connections: stats.idle,
            },
        }),
    )
}
