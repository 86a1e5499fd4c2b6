//! User and API token database queries.
//!
//! Credential storage only ever sees hashes: argon2 PHC strings for
//! passwords and hex SHA-256 digests for API tokens.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteExecutor};

use super::DbPool;

// ============================================================================
// User Types
// ============================================================================

/// User record from the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Input for creating a new user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
}

// ============================================================================
// API Token Types
// ============================================================================

/// API token record.
#[derive(Debug, Clone, FromRow)]
pub struct ApiToken {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub token_prefix: String,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_used: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl ApiToken {
    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|exp| exp < Utc::now()).unwrap_or(false)
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}

/// Input for creating an API token.
#[derive(Debug, Clone)]
pub struct CreateApiToken {
    pub user_id: i64,
    pub name: String,
    pub token_prefix: String,
    pub token_hash: String,
    pub expires_at: Option<DateTime<Utc>>,
}

// ============================================================================
// User Queries
// ============================================================================

/// Create a new user.
///
/// Accepts any executor so registration can run inside a transaction.
pub async fn create_user<'e, E>(executor: E, input: CreateUser) -> Result<User>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, email, password_hash, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&input.username)
    .bind(&input.email)
    .bind(&input.password_hash)
    .bind(Utc::now())
    .fetch_one(executor)
    .await
    .map_err(|e| {
        Error::from_unique_violation(
            e,
            format!("A user with username '{}' already exists", input.username),
        )
    })
}

/// Get a user by ID.
pub async fn get_user(pool: &DbPool, id: i64) -> Result<User> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("User not found: {}", id)))
}

/// Get a user by username (login lookup).
pub async fn get_user_by_username(pool: &DbPool, username: &str) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await
        .map_err(Error::Database)
}

/// List all users in creation order.
pub async fn list_users(pool: &DbPool) -> Result<Vec<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id")
        .fetch_all(pool)
        .await
        .map_err(Error::Database)
}

/// Update user's last login timestamp.
pub async fn update_last_login(pool: &DbPool, id: i64) -> Result<()> {
    sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete a user. Entries, categories, articles and tokens cascade.
pub async fn delete_user(pool: &DbPool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("User not found: {}", id)));
    }

    Ok(())
}

// ============================================================================
// API Token Queries
// ============================================================================

/// Create a new API token.
pub async fn create_api_token<'e, E>(executor: E, input: CreateApiToken) -> Result<ApiToken>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, ApiToken>(
        r#"
        INSERT INTO api_tokens (user_id, name, token_prefix, token_hash, created_at, expires_at)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(input.user_id)
    .bind(&input.name)
    .bind(&input.token_prefix)
    .bind(&input.token_hash)
    .bind(Utc::now())
    .bind(input.expires_at)
    .fetch_one(executor)
    .await
    .map_err(Error::Database)
}

/// Get API tokens by prefix.
/// Uses idx_api_tokens_prefix index.
pub async fn get_api_tokens_by_prefix(pool: &DbPool, prefix: &str) -> Result<Vec<ApiToken>> {
    sqlx::query_as::<_, ApiToken>(
        r#"
        SELECT * FROM api_tokens
        WHERE token_prefix = ?
        "#,
    )
    .bind(prefix)
    .fetch_all(pool)
    .await
    .map_err(Error::Database)
}

/// List all API tokens for a user.
/// Uses idx_api_tokens_user index.
pub async fn list_user_api_tokens(pool: &DbPool, user_id: i64) -> Result<Vec<ApiToken>> {
    sqlx::query_as::<_, ApiToken>(
        r#"
        SELECT * FROM api_tokens
        WHERE user_id = ?
        ORDER BY id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(Error::Database)
}

/// Update token's last_used timestamp.
pub async fn update_api_token_last_used(pool: &DbPool, id: i64) -> Result<()> {
    sqlx::query("UPDATE api_tokens SET last_used = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Revoke an API token. Revoking twice keeps the first timestamp.
pub async fn revoke_api_token(pool: &DbPool, id: i64) -> Result<()> {
    let result = sqlx::query(
        "UPDATE api_tokens SET revoked_at = COALESCE(revoked_at, ?) WHERE id = ?",
    )
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("API token not found: {}", id)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn new_user(username: &str) -> CreateUser {
        CreateUser {
            username: username.to_string(),
            email: Some(format!("{}@example.com", username)),
            password_hash: "!".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let pool = open_in_memory().await.unwrap();

        let user = create_user(&pool, new_user("nerd")).await.unwrap();
        assert_eq!(user.username, "nerd");
        assert_eq!(user.email, Some("nerd@example.com".to_string()));
        assert!(user.last_login.is_none());

        let fetched = get_user(&pool, user.id).await.unwrap();
        assert_eq!(fetched.id, user.id);

        let by_name = get_user_by_username(&pool, "nerd").await.unwrap().unwrap();
        assert_eq!(by_name.id, user.id);
        assert!(get_user_by_username(&pool, "nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let pool = open_in_memory().await.unwrap();

        create_user(&pool, new_user("nerd")).await.unwrap();
        let err = create_user(&pool, new_user("nerd")).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_missing_user_is_not_found() {
        let pool = open_in_memory().await.unwrap();
        assert!(matches!(get_user(&pool, 42).await, Err(Error::NotFound(_))));
        assert!(matches!(delete_user(&pool, 42).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_token_lifecycle() {
        let pool = open_in_memory().await.unwrap();
        let user = create_user(&pool, new_user("nerd")).await.unwrap();

        let token = create_api_token(
            &pool,
            CreateApiToken {
                user_id: user.id,
                name: "cli".to_string(),
                token_prefix: "abcd1234".to_string(),
                token_hash: "hash123".to_string(),
                expires_at: None,
            },
        )
        .await
        .unwrap();
        assert!(!token.is_revoked());
        assert!(!token.is_expired());

        let found = get_api_tokens_by_prefix(&pool, "abcd1234").await.unwrap();
        assert_eq!(found.len(), 1);

        update_api_token_last_used(&pool, token.id).await.unwrap();
        revoke_api_token(&pool, token.id).await.unwrap();

        let tokens = list_user_api_tokens(&pool, user.id).await.unwrap();
        assert!(tokens[0].is_revoked());
        assert!(tokens[0].last_used.is_some());
    }

    #[tokio::test]
    async fn test_expired_token_detection() {
        let pool = open_in_memory().await.unwrap();
        let user = create_user(&pool, new_user("nerd")).await.unwrap();

        let token = create_api_token(
            &pool,
            CreateApiToken {
                user_id: user.id,
                name: "old".to_string(),
                token_prefix: "old12345".to_string(),
                token_hash: "hash-old".to_string(),
                expires_at: Some(Utc::now() - chrono::Duration::days(1)),
            },
        )
        .await
        .unwrap();
        assert!(token.is_expired());
    }

    #[tokio::test]
    async fn test_delete_user_cascades_tokens() {
        let pool = open_in_memory().await.unwrap();
        let user = create_user(&pool, new_user("nerd")).await.unwrap();
        create_api_token(
            &pool,
            CreateApiToken {
                user_id: user.id,
                name: "cli".to_string(),
                token_prefix: "abcd1234".to_string(),
                token_hash: "hash123".to_string(),
                expires_at: None,
            },
        )
        .await
        .unwrap();

        delete_user(&pool, user.id).await.unwrap();
        assert!(get_api_tokens_by_prefix(&pool, "abcd1234")
            .await
            .unwrap()
            .is_empty());
    }
}
