//! API Routes for the diary server
//!
//! This module combines all API routes into a single router.
//! Every resource route is served under both `/api/v1` and `/api/v2`.

mod articles;
mod auth;
mod categories;
mod entries;
pub mod status;
mod users;
pub mod validate;

use axum::Router;

use crate::middleware::require_token;
use crate::{AppState, Error};

/// Build the complete API router.
///
/// Route structure:
/// - /health - Health check (public)
/// - /api/{v1,v2}/accounts/registration/, /get-token/ - Account access (public)
/// - /api/{v1,v2}/entries/, /categories/, /users/, /auth/ - Token-protected
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(status::routes())
        .nest("/api/v1", versioned_routes(state.clone()))
        .nest("/api/v2", versioned_routes(state))
        .fallback(not_found)
}

/// JSON 404 for any path no route matches.
async fn not_found() -> Error {
    Error::NotFound("No route matches this path".into())
}

/// Routes shared by every API version.
fn versioned_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(auth::public_routes())
        .merge(protected_routes(state))
}

/// Protected routes that require a token.
fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(entries::routes())
        .merge(categories::routes())
        .merge(articles::routes())
        .merge(users::routes())
        .merge(auth::routes())
        // Unknown paths stay 404 rather than 401
        .route_layer(axum::middleware::from_fn_with_state(state, require_token))
}

/// The API with state applied, ready to serve.
pub fn router(state: AppState) -> Router {
    routes(state.clone()).with_state(state)
}
