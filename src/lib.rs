//! Diary - personal diary and bookmarking REST backend
//!
//! Users keep diary entries and file bookmarked articles into categories.
//! Every record is private to the user who created it.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;

pub use config::config;
pub use error::{Error, Result};
pub use state::AppState;
