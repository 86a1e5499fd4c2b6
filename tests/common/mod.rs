//! Shared helpers for the HTTP integration tests.
//!
//! Every test gets its own in-memory database behind the real router.

#![allow(dead_code)]

use axum::http::HeaderValue;
use axum_test::TestServer;
use diary::api;
use diary::db::{self, CreateUser};
use diary::AppState;

/// A user created directly in the store, with a live token.
pub struct TestUser {
    pub id: i64,
    pub username: String,
    pub token: String,
}

/// Build the full router over a fresh in-memory database.
pub async fn build_test_app() -> (TestServer, AppState) {
    let pool = db::open_in_memory()
        .await
        .expect("Failed to create test database");
    let state = AppState::with_pool(pool);
    let server = TestServer::new(api::router(state.clone())).expect("Failed to create test server");
    (server, state)
}

/// Insert a user and issue them a token.
///
/// Skips argon2: the stored hash is unusable, so this user can only
/// authenticate with the returned token.
pub async fn create_test_user(state: &AppState, username: &str) -> TestUser {
    let user = db::create_user(
        &state.db,
        CreateUser {
            username: username.to_string(),
            email: Some(format!("{}@example.com", username)),
            password_hash: "!".to_string(),
        },
    )
    .await
    .expect("Failed to create test user");

    let token = state
        .auth
        .issue_token(&state.db, user.id, "test")
        .await
        .expect("Failed to create test token");

    TestUser {
        id: user.id,
        username: user.username,
        token,
    }
}

/// `Authorization: Bearer {token}`
pub fn bearer_auth(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}
