//! Bookmarked article endpoints, nested under their category.
//!
//! Routes:
//! - POST /categories/:category_id/articles/ - Bookmark an article
//! - GET /categories/:category_id/articles/ - List the category's articles
//! - GET /categories/:category_id/articles/:id/ - Get an article
//! - PUT /categories/:category_id/articles/:id/ - Replace an article
//! - PATCH /categories/:category_id/articles/:id/ - Partially update an article
//! - DELETE /categories/:category_id/articles/:id/ - Delete an article
//!
//! The path category must exist and belong to the caller for every route.

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

use super::categories::owned_category;
use super::validate::{self, MAX_TEXT_LENGTH};
use crate::{
    db::{self, Article, CreateArticle, UpdateArticle},
    error::{Error, Result},
    middleware::AuthUser,
    AppState,
};

/// Build article routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/categories/:category_id/articles/",
            get(list_articles).post(create_article),
        )
        .route(
            "/categories/:category_id/articles/:id/",
            get(get_article)
                .put(replace_article)
                .patch(update_article)
                .delete(delete_article),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ArticleRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    #[serde(default)]
    pub read_status: bool,
}

#[derive(Debug, Deserialize)]
pub struct PatchArticleRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub read_status: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ArticleResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub read_status: bool,
    pub category: i64,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl From<Article> for ArticleResponse {
    fn from(article: Article) -> Self {
        Self {
            id: article.id,
            title: article.title,
            description: article.description,
            url: article.url,
            read_status: article.read_status,
            category: article.category_id,
            owner: article.owner,
            created_at: article.created_at,
            modified_at: article.modified_at,
        }
    }
}

fn article_title(title: &str) -> Result<String> {
    validate::required_text("title", title, MAX_TEXT_LENGTH)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /categories/:category_id/articles/
async fn list_articles(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Path(category_id), _): WithRejection<Path<i64>, Error>,
) -> Result<Json<Vec<ArticleResponse>>> {
    owned_category(&state, &auth, category_id).await?;

    let articles = db::list_articles(&state.db, category_id, auth.user_id).await?;
    Ok(Json(articles.into_iter().map(ArticleResponse::from).collect()))
}

/// POST /categories/:category_id/articles/
async fn create_article(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Path(category_id), _): WithRejection<Path<i64>, Error>,
    WithRejection(Json(request), _): WithRejection<Json<ArticleRequest>, Error>,
) -> Result<(StatusCode, Json<ArticleResponse>)> {
    owned_category(&state, &auth, category_id).await?;

    let article = db::create_article(
        &state.db,
        CreateArticle {
            owner_id: auth.user_id,
            category_id,
            title: article_title(&request.title)?,
            description: validate::optional_text(request.description),
            url: validate::article_url(&request.url)?,
            read_status: request.read_status,
        },
    )
    .await?;

    info!(
        user_id = auth.user_id,
        category_id,
        article_id = article.id,
        "Created article"
    );

    Ok((StatusCode::CREATED, Json(article.into())))
}

/// Load an article from an owned category and check the caller owns it.
async fn owned_article(
    state: &AppState,
    auth: &AuthUser,
    category_id: i64,
    id: i64,
) -> Result<Article> {
    owned_category(state, auth, category_id).await?;
    let article = db::get_article(&state.db, category_id, id).await?;
    auth.authorize(&article)?;
    Ok(article)
}

/// GET /categories/:category_id/articles/:id/
async fn get_article(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Path((category_id, id)), _): WithRejection<Path<(i64, i64)>, Error>,
) -> Result<Json<ArticleResponse>> {
    let article = owned_article(&state, &auth, category_id, id).await?;
    Ok(Json(article.into()))
}

/// PUT /categories/:category_id/articles/:id/
async fn replace_article(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Path((category_id, id)), _): WithRejection<Path<(i64, i64)>, Error>,
    WithRejection(Json(request), _): WithRejection<Json<ArticleRequest>, Error>,
) -> Result<Json<ArticleResponse>> {
    owned_article(&state, &auth, category_id, id).await?;

    let update = UpdateArticle {
        title: Some(article_title(&request.title)?),
        description: Some(validate::optional_text(request.description)),
        url: Some(validate::article_url(&request.url)?),
        read_status: Some(request.read_status),
    };

    let article = db::update_article(&state.db, category_id, id, update).await?;
    Ok(Json(article.into()))
}

/// PATCH /categories/:category_id/articles/:id/
async fn update_article(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Path((category_id, id)), _): WithRejection<Path<(i64, i64)>, Error>,
    WithRejection(Json(request), _): WithRejection<Json<PatchArticleRequest>, Error>,
) -> Result<Json<ArticleResponse>> {
    owned_article(&state, &auth, category_id, id).await?;

    let update = UpdateArticle {
        title: request.title.as_deref().map(article_title).transpose()?,
        description: request
            .description
            .map(|d| validate::optional_text(Some(d))),
        url: request
            .url
            .as_deref()
            .map(validate::article_url)
            .transpose()?,
        read_status: request.read_status,
    };

    let article = db::update_article(&state.db, category_id, id, update).await?;
    Ok(Json(article.into()))
}

/// DELETE /categories/:category_id/articles/:id/
async fn delete_article(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Path((category_id, id)), _): WithRejection<Path<(i64, i64)>, Error>,
) -> Result<StatusCode> {
    owned_article(&state, &auth, category_id, id).await?;
    db::delete_article(&state.db, category_id, id).await?;

    info!(user_id = auth.user_id, category_id, article_id = id, "Deleted article");

    Ok(StatusCode::NO_CONTENT)
}
