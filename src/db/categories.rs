//! Bookmark category database queries.
//!
//! Deleting a category removes its articles through the
//! `articles.category_id` cascade.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite};

use super::DbPool;

// ============================================================================
// Types
// ============================================================================

/// Category record, joined with the owner's username.
#[derive(Debug, Clone, FromRow)]
pub struct Category {
    pub id: i64,
    pub owner_id: i64,
    pub owner: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Input for creating a new category.
#[derive(Debug, Clone)]
pub struct CreateCategory {
    pub owner_id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// Input for updating a category.
///
/// `description: Some(None)` clears the column; `None` leaves it alone.
#[derive(Debug, Clone, Default)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

const SELECT_CATEGORY: &str = r#"
    SELECT c.id, c.owner_id, u.username AS owner, c.name, c.description,
           c.created_at, c.modified_at
    FROM categories c
    JOIN users u ON u.id = c.owner_id
"#;

fn duplicate_name(err: sqlx::Error) -> Error {
    Error::from_unique_violation(err, "A category with this name already exists")
}

// ============================================================================
// Queries
// ============================================================================

/// Create a new category.
pub async fn create_category(pool: &DbPool, input: CreateCategory) -> Result<Category> {
    let now = Utc::now();

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO categories (owner_id, name, description, created_at, modified_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(input.owner_id)
    .bind(&input.name)
    .bind(&input.description)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(duplicate_name)?;

    get_category(pool, id).await
}

/// Get a category by ID.
pub async fn get_category(pool: &DbPool, id: i64) -> Result<Category> {
    sqlx::query_as::<_, Category>(&format!("{SELECT_CATEGORY} WHERE c.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Category not found: {}", id)))
}

/// List a user's categories.
pub async fn list_categories_by_owner(pool: &DbPool, owner_id: i64) -> Result<Vec<Category>> {
    sqlx::query_as::<_, Category>(&format!(
        "{SELECT_CATEGORY} WHERE c.owner_id = ? ORDER BY c.id"
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await
    .map_err(Error::Database)
}

/// Update a category. Always refreshes `modified_at`.
pub async fn update_category(pool: &DbPool, id: i64, input: UpdateCategory) -> Result<Category> {
    let mut query = QueryBuilder::<Sqlite>::new("UPDATE categories SET modified_at = ");
    query.push_bind(Utc::now());

    if let Some(name) = input.name {
        query.push(", name = ").push_bind(name);
    }
    if let Some(description) = input.description {
        query.push(", description = ").push_bind(description);
    }

    query.push(" WHERE id = ").push_bind(id);

    let result = query.build().execute(pool).await.map_err(duplicate_name)?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Category not found: {}", id)));
    }

    get_category(pool, id).await
}

/// Delete a category and, by cascade, its articles.
pub async fn delete_category(pool: &DbPool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM categories WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Category not found: {}", id)));
    }

    Ok(())
}
