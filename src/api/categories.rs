//! Bookmark category endpoints.
//!
//! Routes:
//! - POST /categories/ - Create a category
//! - GET /categories/ - List the caller's categories
//! - GET /categories/:id/ - Get a category
//! - PUT /categories/:id/ - Replace a category
//! - PATCH /categories/:id/ - Partially update a category
//! - DELETE /categories/:id/ - Delete a category and its articles

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
    db::{self, Category, CreateCategory, UpdateCategory},
    error::{Error, Result},
    middleware::AuthUser,
    AppState,
};

/// Build category routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories/", get(list_categories).post(create_category))
        .route(
            "/categories/:id/",
            get(get_category)
                .put(replace_category)
                .patch(update_category)
                .delete(delete_category),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PatchCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            description: category.description,
            owner: category.owner,
            created_at: category.created_at,
            modified_at: category.modified_at,
        }
    }
}

fn category_name(name: &str) -> Result<String> {
    validate::required_text("name", name, MAX_TEXT_LENGTH)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /categories/
async fn list_categories(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<CategoryResponse>>> {
    let categories = db::list_categories_by_owner(&state.db, auth.user_id).await?;
    Ok(Json(categories.into_iter().map(CategoryResponse::from).collect()))
}

/// POST /categories/
async fn create_category(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Json(request), _): WithRejection<Json<CategoryRequest>, Error>,
) -> Result<(StatusCode, Json<CategoryResponse>)> {
    let category = db::create_category(
        &state.db,
        CreateCategory {
            owner_id: auth.user_id,
            name: category_name(&request.name)?,
            description: validate::optional_text(request.description),
        },
    )
    .await?;

    info!(user_id = auth.user_id, category_id = category.id, "Created category");

    Ok((StatusCode::CREATED, Json(category.into())))
}

/// Load a category and check the caller owns it.
pub(super) async fn owned_category(state: &AppState, auth: &AuthUser, id: i64) -> Result<Category> {
    let category = db::get_category(&state.db, id).await?;
    auth.authorize(&category)?;
    Ok(category)
}

/// GET /categories/:id/
async fn get_category(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, Error>,
) -> Result<Json<CategoryResponse>> {
    let category = owned_category(&state, &auth, id).await?;
    Ok(Json(category.into()))
}

/// PUT /categories/:id/
///
/// An omitted description clears it.
async fn replace_category(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, Error>,
    WithRejection(Json(request), _): WithRejection<Json<CategoryRequest>, Error>,
) -> Result<Json<CategoryResponse>> {
    owned_category(&state, &auth, id).await?;

    let update = UpdateCategory {
        name: Some(category_name(&request.name)?),
        description: Some(validate::optional_text(request.description)),
    };

    let category = db::update_category(&state.db, id, update).await?;
    Ok(Json(category.into()))
}

/// PATCH /categories/:id/
async fn update_category(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, Error>,
    WithRejection(Json(request), _): WithRejection<Json<PatchCategoryRequest>, Error>,
) -> Result<Json<CategoryResponse>> {
    owned_category(&state, &auth, id).await?;

    let update = UpdateCategory {
        name: request.name.as_deref().map(category_name).transpose()?,
        description: request
            .description
            .map(|d| validate::optional_text(Some(d))),
    };

    let category = db::update_category(&state.db, id, update).await?;
    Ok(Json(category.into()))
}

/// DELETE /categories/:id/
async fn delete_category(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, Error>,
) -> Result<StatusCode> {
    owned_category(&state, &auth, id).await?;
    db::delete_category(&state.db, id).await?;

    info!(user_id = auth.user_id, category_id = id, "Deleted category");

    Ok(StatusCode::NO_CONTENT)
}
