//! Account and token endpoints.
//!
//! Routes:
//! - POST /accounts/registration/ - Create an account (public)
//! - POST /get-token/ - Exchange username/password for a token (public)
//! - GET /auth/me/ - Current user
//! - POST /auth/logout/ - Revoke the token used for this request

use axum::{extract::State, http::StatusCode, routing::get, routing::post, Extension, Json, Router};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};

use super::users::UserResponse;
use super::validate;
use crate::{
    db,
    error::{Error, Result},
    middleware::AuthUser,
    services::NewAccount,
    AppState,
};

/// Routes reachable without a token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/accounts/registration/", post(register))
        .route("/get-token/", post(obtain_token))
}

/// Routes that need the caller's identity.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me/", get(me))
        .route("/auth/logout/", post(logout))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegistrationRequest {
    pub username: String,
    pub password1: String,
    pub password2: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegistrationResponse {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub detail: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Register a new account and return its first token.
///
/// POST /accounts/registration/
async fn register(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<RegistrationRequest>, Error>,
) -> Result<(StatusCode, Json<RegistrationResponse>)> {
    let username = validate::username(&request.username)?;
    let email = validate::email(request.email)?;
    validate::password(
        &request.password1,
        &request.password2,
        state.auth.config().min_password_length,
    )?;

    let (user, token) = state
        .auth
        .register(NewAccount {
            username,
            email,
            password: request.password1,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegistrationResponse {
            id: user.id,
            username: user.username,
            email: user.email,
            token,
        }),
    ))
}

/// POST /get-token/
async fn obtain_token(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<TokenRequest>, Error>,
) -> Result<Json<TokenResponse>> {
    let (_, token) = state.auth.login(&request.username, &request.password).await?;
    Ok(Json(TokenResponse { token }))
}

/// GET /auth/me/
async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let user = db::get_user(&state.db, auth.user_id).await?;
    Ok(Json(user.into()))
}

/// POST /auth/logout/
async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<LogoutResponse>> {
    state.auth.revoke_token(auth.token_id).await?;
    Ok(Json(LogoutResponse {
        detail: "Successfully logged out.".to_string(),
    }))
}
