//! Account and API token service.
//!
//! Passwords are stored as argon2 PHC strings. API tokens have the form
//! `diary_{prefix}_{secret}`: the 8-char prefix is stored in clear for
//! lookup and the whole token is stored as a SHA-256 digest.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use sqlx::SqliteExecutor;
use tracing::{debug, info};

use crate::config::AuthConfig;
use crate::db::{self, CreateApiToken, CreateUser, DbPool, User};
use crate::middleware::AuthUser;
use crate::{Error, Result};

const TOKEN_PREFIX: &str = "diary_";
const TOKEN_LOOKUP_LEN: usize = 8;
const TOKEN_SECRET_LEN: usize = 32;

/// Validated registration input. The password is still in clear.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: Option<String>,
    pub password: String,
}

/// Handles credentials: registration, login and token lifecycle.
#[derive(Clone)]
pub struct AuthService {
    db: DbPool,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(db: DbPool, config: AuthConfig) -> Self {
        Self { db, config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Create a user and issue their first API token.
    ///
    /// Both writes share one transaction, so a failed token insert leaves
    /// no orphaned account behind.
    pub async fn register(&self, account: NewAccount) -> Result<(User, String)> {
        let password_hash = hash_password(account.password).await?;

        let mut tx = self.db.begin().await?;

        let user = db::create_user(
            &mut *tx,
            CreateUser {
                username: account.username,
                email: account.email,
                password_hash,
            },
        )
        .await?;

        let token = self.issue_token(&mut *tx, user.id, "registration").await?;

        tx.commit().await?;

        info!(user_id = user.id, username = %user.username, "Registered user");

        Ok((user, token))
    }

    /// Verify a username/password pair and issue a fresh token.
    pub async fn login(&self, username: &str, password: &str) -> Result<(User, String)> {
        let user = db::get_user_by_username(&self.db, username)
            .await?
            .ok_or(Error::InvalidCredentials)?;

        if !verify_password(password.to_string(), user.password_hash.clone()).await? {
            debug!(username = %username, "Rejected login");
            return Err(Error::InvalidCredentials);
        }

        db::update_last_login(&self.db, user.id).await?;
        let token = self.issue_token(&self.db, user.id, "login").await?;

        info!(user_id = user.id, "User logged in");

        Ok((user, token))
    }

    /// Mint a new token for a user and store its hash.
    ///
    /// Returns the only copy of the clear token.
    pub async fn issue_token<'e, E>(&self, executor: E, user_id: i64, name: &str) -> Result<String>
    where
        E: SqliteExecutor<'e>,
    {
        let token = generate_token();
        let prefix = token_prefix(&token)
            .ok_or_else(|| Error::Internal("Generated malformed token".into()))?
            .to_string();

        let expires_at = self
            .config
            .token_ttl_days
            .map(|days| Utc::now() + Duration::days(days));

        db::create_api_token(
            executor,
            CreateApiToken {
                user_id,
                name: name.to_string(),
                token_prefix: prefix,
                token_hash: hash_token(&token),
                expires_at,
            },
        )
        .await?;

        Ok(token)
    }

    /// Resolve a clear token to the identity it was issued to.
    pub async fn authenticate(&self, token: &str) -> Result<AuthUser> {
        let prefix = token_prefix(token).ok_or(Error::InvalidToken)?;
        let token_hash = hash_token(token);

        let stored = db::get_api_tokens_by_prefix(&self.db, prefix)
            .await?
            .into_iter()
            .find(|candidate| constant_time_eq(&token_hash, &candidate.token_hash))
            .ok_or(Error::InvalidToken)?;

        if stored.is_revoked() {
            return Err(Error::InvalidToken);
        }
        if stored.is_expired() {
            return Err(Error::TokenExpired);
        }

        let user = match db::get_user(&self.db, stored.user_id).await {
            Ok(user) => user,
            Err(Error::NotFound(_)) => return Err(Error::InvalidToken),
            Err(e) => return Err(e),
        };

        Ok(AuthUser {
            user_id: user.id,
            username: user.username,
            token_id: stored.id,
        })
    }

    /// Revoke a token by id.
    pub async fn revoke_token(&self, token_id: i64) -> Result<()> {
        db::revoke_api_token(&self.db, token_id).await?;
        info!(token_id, "Revoked API token");
        Ok(())
    }
}

fn generate_token() -> String {
    format!(
        "{}{}_{}",
        TOKEN_PREFIX,
        nanoid::nanoid!(TOKEN_LOOKUP_LEN),
        nanoid::nanoid!(TOKEN_SECRET_LEN)
    )
}

/// The lookup prefix of a well-formed token.
///
/// The nanoid alphabet includes `_`, so the prefix is taken by position
/// rather than by splitting.
pub fn token_prefix(token: &str) -> Option<&str> {
    let body = token.strip_prefix(TOKEN_PREFIX)?;
    let prefix = body.get(..TOKEN_LOOKUP_LEN)?;
    let secret = body.get(TOKEN_LOOKUP_LEN..)?.strip_prefix('_')?;
    if secret.is_empty() {
        return None;
    }
    Some(prefix)
}

/// Hash a token using SHA-256.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Constant-time string comparison.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

/// Hash a password with argon2 on the blocking pool.
pub async fn hash_password(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
    })
    .await
    .map_err(|e| Error::Internal(format!("Password hashing task failed: {}", e)))?
    .map_err(Error::from)
}

/// Check a password against a stored PHC string.
///
/// An unparseable stored hash never matches.
pub async fn verify_password(password: String, password_hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || match PasswordHash::new(&password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    })
    .await
    .map_err(|e| Error::Internal(format!("Password verification task failed: {}", e)))
}
