//! Middleware for the diary server.
//!
//! - `token_auth` - API token validation; resolves the caller to an `AuthUser`

mod token_auth;

pub use token_auth::require_token;

use crate::error::Result;
use crate::services::{authorize, Owned};

/// Identity of the caller, resolved from their API token.
///
/// Inserted into request extensions by `require_token` and passed
/// explicitly into every query that is scoped to the caller.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
    /// Token used for this request (revoked on logout).
    pub token_id: i64,
}

impl AuthUser {
    /// Fail with `Forbidden` unless this user owns `record`.
    pub fn authorize<T: Owned>(&self, record: &T) -> Result<()> {
        authorize(Some(self), record)
    }
}
