//! API token authentication middleware.
//!
//! Accepts tokens from:
//! - `Authorization: Bearer {token}` headers
//! - `Authorization: Token {token}` headers
//! - `?token={token}` query string parameters
//!
//! Token format: `diary_{prefix}_{secret}`. Tokens are looked up by prefix,
//! verified against the stored SHA-256 hash, and rejected when revoked or
//! expired. Query string tokens are URL-decoded before validation.

use axum::{
    body::Body,
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use super::AuthUser;
use crate::{db, error::Error, AppState};

const HEADER_SCHEMES: [&str; 2] = ["Bearer ", "Token "];

/// Extract token from Authorization header or query string.
///
/// The header wins over the query parameter.
pub(crate) fn extract_token_from_request(req: &Request<Body>) -> Option<String> {
    if let Some(auth_header) = req.headers().get(AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            for scheme in HEADER_SCHEMES {
                if let Some(token) = auth_str.strip_prefix(scheme) {
                    let token = token.trim();
                    if !token.is_empty() {
                        return Some(token.to_string());
                    }
                }
            }
        }
    }

    if let Some(query) = req.uri().query() {
        for part in query.split('&') {
            if let Some(token) = part.strip_prefix("token=") {
                if let Ok(decoded) = urlencoding::decode(token) {
                    return Some(decoded.into_owned());
                }
                return Some(token.to_string());
            }
        }
    }

    None
}

/// Middleware that requires a valid API token.
///
/// Injects `AuthUser` into request extensions on success.
///
/// # Errors
///
/// Returns 401 Unauthorized if:
/// - No token is present in the header or query string
/// - The token is malformed, unknown or revoked
/// - The token has expired
///
/// # Example
///
/// ```rust,ignore
/// use axum::{Router, middleware};
/// use diary::middleware::require_token;
///
/// let app = Router::new()
///     .route("/entries/", post(create_entry))
///     .layer(middleware::from_fn_with_state(state.clone(), require_token));
/// ```
pub async fn require_token(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Error> {
    let token = extract_token_from_request(&req).ok_or(Error::Unauthenticated)?;

    let auth_user = state.auth.authenticate(&token).await?;
    debug!(user_id = auth_user.user_id, "Authenticated request");

    // Fire and forget
    let pool = state.db.clone();
    let token_id = auth_user.token_id;
    tokio::spawn(async move {
        if let Err(e) = db::update_api_token_last_used(&pool, token_id).await {
            warn!(error = %e, token_id, "Failed to record token use");
        }
    });

    req.extensions_mut().insert(auth_user);

    Ok(next.run(req).await)
}
