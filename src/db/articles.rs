//! Bookmarked article database queries.
//!
//! Articles are always addressed through their category: every lookup
//! takes the `(category_id, id)` pair.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite};

use super::DbPool;

// ============================================================================
// Types
// ============================================================================

/// Article record, joined with the owner's username.
#[derive(Debug, Clone, FromRow)]
pub struct Article {
    pub id: i64,
    pub owner_id: i64,
    pub owner: String,
    pub category_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub read_status: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Input for creating a new article.
#[derive(Debug, Clone)]
pub struct CreateArticle {
    pub owner_id: i64,
    pub category_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub read_status: bool,
}

/// Input for updating an article.
#[derive(Debug, Clone, Default)]
pub struct UpdateArticle {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub url: Option<String>,
    pub read_status: Option<bool>,
}

const SELECT_ARTICLE: &str = r#"
    SELECT a.id, a.owner_id, u.username AS owner, a.category_id, a.title,
           a.description, a.url, a.read_status, a.created_at, a.modified_at
    FROM articles a
    JOIN users u ON u.id = a.owner_id
"#;

// ============================================================================
// Queries
// ============================================================================

/// Create a new article under a category.
pub async fn create_article(pool: &DbPool, input: CreateArticle) -> Result<Article> {
    let now = Utc::now();

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO articles
            (owner_id, category_id, title, description, url, read_status, created_at, modified_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(input.owner_id)
    .bind(input.category_id)
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.url)
    .bind(input.read_status)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    get_article(pool, input.category_id, id).await
}

/// Get an article by ID within a category.
pub async fn get_article(pool: &DbPool, category_id: i64, id: i64) -> Result<Article> {
    sqlx::query_as::<_, Article>(&format!(
        "{SELECT_ARTICLE} WHERE a.category_id = ? AND a.id = ?"
    ))
    .bind(category_id)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Article not found: {}", id)))
}

/// List a user's articles in one category.
/// Uses idx_articles_category index.
pub async fn list_articles(pool: &DbPool, category_id: i64, owner_id: i64) -> Result<Vec<Article>> {
    sqlx::query_as::<_, Article>(&format!(
        "{SELECT_ARTICLE} WHERE a.category_id = ? AND a.owner_id = ? ORDER BY a.id"
    ))
    .bind(category_id)
    .bind(owner_id)
    .fetch_all(pool)
    .await
    .map_err(Error::Database)
}

/// Update an article. Always refreshes `modified_at`.
pub async fn update_article(
    pool: &DbPool,
    category_id: i64,
    id: i64,
    input: UpdateArticle,
) -> Result<Article> {
    let mut query = QueryBuilder::<Sqlite>::new("UPDATE articles SET modified_at = ");
    query.push_bind(Utc::now());

    if let Some(title) = input.title {
        query.push(", title = ").push_bind(title);
    }
    if let Some(description) = input.description {
        query.push(", description = ").push_bind(description);
    }
    if let Some(url) = input.url {
        query.push(", url = ").push_bind(url);
    }
    if let Some(read_status) = input.read_status {
        query.push(", read_status = ").push_bind(read_status);
    }

    query
        .push(" WHERE category_id = ")
        .push_bind(category_id)
        .push(" AND id = ")
        .push_bind(id);

    let result = query.build().execute(pool).await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Article not found: {}", id)));
    }

    get_article(pool, category_id, id).await
}

/// Delete an article.
pub async fn delete_article(pool: &DbPool, category_id: i64, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM articles WHERE category_id = ? AND id = ?")
        .bind(category_id)
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Article not found: {}", id)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{
        create_category, create_entry, create_user, delete_category, delete_user, open_in_memory,
        CreateCategory, CreateEntry, CreateUser,
    };

    async fn setup() -> (DbPool, i64, i64) {
        let pool = open_in_memory().await.unwrap();
        let user = create_user(
            &pool,
            CreateUser {
                username: "reader".to_string(),
                email: None,
                password_hash: "!".to_string(),
            },
        )
        .await
        .unwrap();
        let category = create_category(
            &pool,
            CreateCategory {
                owner_id: user.id,
                name: "Rust".to_string(),
                description: None,
            },
        )
        .await
        .unwrap();
        (pool, user.id, category.id)
    }

    fn new_article(owner_id: i64, category_id: i64, title: &str) -> CreateArticle {
        CreateArticle {
            owner_id,
            category_id,
            title: title.to_string(),
            description: None,
            url: "https://doc.rust-lang.org/book/".to_string(),
            read_status: false,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_article() {
        let (pool, owner_id, category_id) = setup().await;

        let article = create_article(&pool, new_article(owner_id, category_id, "The Book"))
            .await
            .unwrap();
        assert_eq!(article.category_id, category_id);
        assert_eq!(article.owner, "reader");
        assert!(!article.read_status);

        let fetched = get_article(&pool, category_id, article.id).await.unwrap();
        assert_eq!(fetched.title, "The Book");
        assert_eq!(fetched.url, article.url);
    }

    #[tokio::test]
    async fn test_article_lookup_requires_matching_category() {
        let (pool, owner_id, category_id) = setup().await;
        let article = create_article(&pool, new_article(owner_id, category_id, "The Book"))
            .await
            .unwrap();

        assert!(matches!(
            get_article(&pool, category_id + 1, article.id).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_mark_article_read() {
        let (pool, owner_id, category_id) = setup().await;
        let article = create_article(&pool, new_article(owner_id, category_id, "The Book"))
            .await
            .unwrap();

        let updated = update_article(
            &pool,
            category_id,
            article.id,
            UpdateArticle {
                read_status: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(updated.read_status);
        assert_eq!(updated.title, "The Book");
    }

    #[tokio::test]
    async fn test_delete_category_cascades_articles() {
        let (pool, owner_id, category_id) = setup().await;
        let article = create_article(&pool, new_article(owner_id, category_id, "The Book"))
            .await
            .unwrap();

        delete_category(&pool, category_id).await.unwrap();

        assert!(matches!(
            get_article(&pool, category_id, article.id).await,
            Err(Error::NotFound(_))
        ));
        assert!(list_articles(&pool, category_id, owner_id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_delete_article() {
        let (pool, owner_id, category_id) = setup().await;
        let article = create_article(&pool, new_article(owner_id, category_id, "The Book"))
            .await
            .unwrap();

        delete_article(&pool, category_id, article.id).await.unwrap();
        assert!(matches!(
            delete_article(&pool, category_id, article.id).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_user_cascades_everything_they_own() {
        let (pool, owner_id, category_id) = setup().await;
        create_article(&pool, new_article(owner_id, category_id, "The Book"))
            .await
            .unwrap();
        create_entry(
            &pool,
            CreateEntry {
                owner_id,
                content: "Dear Diary".to_string(),
            },
        )
        .await
        .unwrap();

        delete_user(&pool, owner_id).await.unwrap();

        for table in ["entries", "categories", "articles", "api_tokens"] {
            let (remaining,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
                .fetch_one(&pool)
                .await
                .unwrap();
            assert_eq!(remaining, 0, "{} should be empty", table);
        }
    }
}
