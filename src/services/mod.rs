//! Service layer for the diary server.
//!
//! - Auth (registration, login, API token lifecycle)
//! - Permissions (record ownership checks)

mod auth;
pub mod permissions;

pub use auth::{
    constant_time_eq, hash_password, hash_token, token_prefix, verify_password, AuthService,
    NewAccount,
};
pub use permissions::{authorize, Owned};
