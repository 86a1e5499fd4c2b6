//! Diary entry database queries.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite};

use super::DbPool;

// ============================================================================
// Types
// ============================================================================

/// Entry record, joined with the owner's username.
#[derive(Debug, Clone, FromRow)]
pub struct Entry {
    pub id: i64,
    pub owner_id: i64,
    pub owner: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Input for creating a new entry.
#[derive(Debug, Clone)]
pub struct CreateEntry {
    pub owner_id: i64,
    pub content: String,
}

/// Input for updating an entry. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateEntry {
    pub content: Option<String>,
}

const SELECT_ENTRY: &str = r#"
    SELECT e.id, e.owner_id, u.username AS owner, e.content, e.created_at, e.modified_at
    FROM entries e
    JOIN users u ON u.id = e.owner_id
"#;

// ============================================================================
// Queries
// ============================================================================

/// Create a new entry.
pub async fn create_entry(pool: &DbPool, input: CreateEntry) -> Result<Entry> {
    let now = Utc::now();

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO entries (owner_id, content, created_at, modified_at)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(input.owner_id)
    .bind(&input.content)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| Error::from_unique_violation(e, "An entry with this content already exists"))?;

    get_entry(pool, id).await
}

/// Get an entry by ID.
pub async fn get_entry(pool: &DbPool, id: i64) -> Result<Entry> {
    sqlx::query_as::<_, Entry>(&format!("{SELECT_ENTRY} WHERE e.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Entry not found: {}", id)))
}

/// List a user's entries.
/// Uses idx_entries_owner index.
pub async fn list_entries_by_owner(pool: &DbPool, owner_id: i64) -> Result<Vec<Entry>> {
    sqlx::query_as::<_, Entry>(&format!("{SELECT_ENTRY} WHERE e.owner_id = ? ORDER BY e.id"))
        .bind(owner_id)
        .fetch_all(pool)
        .await
        .map_err(Error::Database)
}

/// Update an entry. Always refreshes `modified_at`.
pub async fn update_entry(pool: &DbPool, id: i64, input: UpdateEntry) -> Result<Entry> {
    let mut query = QueryBuilder::<Sqlite>::new("UPDATE entries SET modified_at = ");
    query.push_bind(Utc::now());

    if let Some(content) = input.content {
        query.push(", content = ").push_bind(content);
    }

    query.push(" WHERE id = ").push_bind(id);

    let result = query
        .build()
        .execute(pool)
        .await
        .map_err(|e| Error::from_unique_violation(e, "An entry with this content already exists"))?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Entry not found: {}", id)));
    }

    get_entry(pool, id).await
}

/// Delete an entry.
pub async fn delete_entry(pool: &DbPool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM entries WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Entry not found: {}", id)));
    }

    Ok(())
}
