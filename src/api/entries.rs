//! Diary entry endpoints.
//!
//! Routes:
//! - POST /entries/ - Create an entry
//! - GET /entries/ - List the caller's entries
//! - GET /entries/:id/ - Get an entry
//! - PUT /entries/:id/ - Replace an entry
//! - PATCH /entries/:id/ - Partially update an entry
//! - DELETE /entries/:id/ - Delete an entry

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::validate::{self, MAX_TEXT_LENGTH};
use crate::{
    db::{self, CreateEntry, Entry, UpdateEntry},
    error::{Error, Result},
    middleware::AuthUser,
    AppState,
};

/// Build entry routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/entries/", get(list_entries).post(create_entry))
        .route(
            "/entries/:id/",
            get(get_entry)
                .put(replace_entry)
                .patch(update_entry)
                .delete(delete_entry),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Full entry payload (create and PUT).
#[derive(Debug, Deserialize)]
pub struct EntryRequest {
    pub content: String,
}

/// Partial entry payload (PATCH).
#[derive(Debug, Deserialize)]
pub struct PatchEntryRequest {
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EntryResponse {
    pub id: i64,
    pub content: String,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl From<Entry> for EntryResponse {
    fn from(entry: Entry) -> Self {
        Self {
            id: entry.id,
            content: entry.content,
            owner: entry.owner,
            created_at: entry.created_at,
            modified_at: entry.modified_at,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// List the caller's entries.
///
/// GET /entries/
async fn list_entries(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<EntryResponse>>> {
    let entries = db::list_entries_by_owner(&state.db, auth.user_id).await?;
    Ok(Json(entries.into_iter().map(EntryResponse::from).collect()))
}

/// Create an entry owned by the caller.
///
/// POST /entries/
async fn create_entry(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Json(request), _): WithRejection<Json<EntryRequest>, Error>,
) -> Result<(StatusCode, Json<EntryResponse>)> {
    let content = validate::required_text("content", &request.content, MAX_TEXT_LENGTH)?;

    let entry = db::create_entry(
        &state.db,
        CreateEntry {
            owner_id: auth.user_id,
            content,
        },
    )
    .await?;

    info!(user_id = auth.user_id, entry_id = entry.id, "Created entry");

    Ok((StatusCode::CREATED, Json(entry.into())))
}

/// Load an entry and check the caller owns it.
async fn owned_entry(state: &AppState, auth: &AuthUser, id: i64) -> Result<Entry> {
    let entry = db::get_entry(&state.db, id).await?;
    auth.authorize(&entry)?;
    Ok(entry)
}

/// GET /entries/:id/
async fn get_entry(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, Error>,
) -> Result<Json<EntryResponse>> {
    let entry = owned_entry(&state, &auth, id).await?;
    Ok(Json(entry.into()))
}

/// PUT /entries/:id/
async fn replace_entry(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, Error>,
    WithRejection(Json(request), _): WithRejection<Json<EntryRequest>, Error>,
) -> Result<Json<EntryResponse>> {
    owned_entry(&state, &auth, id).await?;

    let update = UpdateEntry {
        content: Some(validate::required_text(
            "content",
            &request.content,
            MAX_TEXT_LENGTH,
        )?),
    };

    let entry = db::update_entry(&state.db, id, update).await?;
    Ok(Json(entry.into()))
}

/// PATCH /entries/:id/
async fn update_entry(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, Error>,
    WithRejection(Json(request), _): WithRejection<Json<PatchEntryRequest>, Error>,
) -> Result<Json<EntryResponse>> {
    owned_entry(&state, &auth, id).await?;

    let update = UpdateEntry {
        content: request
            .content
            .map(|c| validate::required_text("content", &c, MAX_TEXT_LENGTH))
            .transpose()?,
    };

    let entry = db::update_entry(&state.db, id, update).await?;
    Ok(Json(entry.into()))
}

/// DELETE /entries/:id/
async fn delete_entry(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, Error>,
) -> Result<StatusCode> {
    owned_entry(&state, &auth, id).await?;
    db::delete_entry(&state.db, id).await?;

    info!(user_id = auth.user_id, entry_id = id, "Deleted entry");

    Ok(StatusCode::NO_CONTENT)
}
