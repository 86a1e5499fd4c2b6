//! User directory endpoints.
//!
//! Any authenticated caller may list and look up users. Only public
//! fields are exposed.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::Serialize;

use crate::{
    db::{self, User},
    error::{Error, Result},
    AppState,
};

/// Build user routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/", get(list_users))
        .route("/users/:id/", get(get_user))
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

/// GET /users/
async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>> {
    let users = db::list_users(&state.db).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// GET /users/:id/
async fn get_user(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, Error>,
) -> Result<Json<UserResponse>> {
    let user = db::get_user(&state.db, id).await?;
    Ok(Json(user.into()))
}
