//! HTTP integration tests for categories and their articles.

mod common;

use axum::http::{header::AUTHORIZATION, StatusCode};
use axum_test::TestServer;
use common::{bearer_auth, build_test_app, create_test_user, TestUser};
use rstest::rstest;
use serde_json::{json, Value};

async fn create_category(server: &TestServer, user: &TestUser, name: &str) -> Value {
    let response = server
        .post("/api/v1/categories/")
        .add_header(AUTHORIZATION, bearer_auth(&user.token))
        .json(&json!({ "name": name, "description": "reading list" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json()
}

async fn create_article(server: &TestServer, user: &TestUser, category_id: &Value) -> Value {
    let response = server
        .post(&format!("/api/v1/categories/{}/articles/", category_id))
        .add_header(AUTHORIZATION, bearer_auth(&user.token))
        .json(&json!({
            "title": "The Rust Book",
            "url": "https://doc.rust-lang.org/book/",
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json()
}

#[tokio::test]
async fn test_category_round_trip() {
    let (server, state) = build_test_app().await;
    let user = create_test_user(&state, "reader").await;

    let created = create_category(&server, &user, "Rust").await;
    assert_eq!(created["owner"], "reader");
    assert_eq!(created["description"], "reading list");

    let fetched: Value = server
        .get(&format!("/api/v1/categories/{}/", created["id"]))
        .add_header(AUTHORIZATION, bearer_auth(&user.token))
        .await
        .json();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_duplicate_category_name_conflicts() {
    let (server, state) = build_test_app().await;
    let alice = create_test_user(&state, "alice").await;
    let bob = create_test_user(&state, "bob").await;

    create_category(&server, &alice, "Rust").await;

    // Names are unique across all users
    let response = server
        .post("/api/v1/categories/")
        .add_header(AUTHORIZATION, bearer_auth(&bob.token))
        .json(&json!({ "name": "Rust" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_category_put_clears_description_patch_keeps_it() {
    let (server, state) = build_test_app().await;
    let user = create_test_user(&state, "reader").await;
    let category = create_category(&server, &user, "Rust").await;
    let path = format!("/api/v1/categories/{}/", category["id"]);

    let patched: Value = server
        .patch(&path)
        .add_header(AUTHORIZATION, bearer_auth(&user.token))
        .json(&json!({ "name": "Rustlang" }))
        .await
        .json();
    assert_eq!(patched["name"], "Rustlang");
    assert_eq!(patched["description"], "reading list");

    let replaced: Value = server
        .put(&path)
        .add_header(AUTHORIZATION, bearer_auth(&user.token))
        .json(&json!({ "name": "Rust" }))
        .await
        .json();
    assert_eq!(replaced["name"], "Rust");
    assert!(replaced["description"].is_null());
}

#[tokio::test]
async fn test_article_round_trip() {
    let (server, state) = build_test_app().await;
    let user = create_test_user(&state, "reader").await;
    let category = create_category(&server, &user, "Rust").await;

    let created = create_article(&server, &user, &category["id"]).await;
    assert_eq!(created["category"], category["id"]);
    assert_eq!(created["owner"], "reader");
    assert_eq!(created["read_status"], false);
    assert!(created["description"].is_null());

    let fetched: Value = server
        .get(&format!(
            "/api/v1/categories/{}/articles/{}/",
            category["id"], created["id"]
        ))
        .add_header(AUTHORIZATION, bearer_auth(&user.token))
        .await
        .json();
    assert_eq!(fetched, created);

    let listed: Vec<Value> = server
        .get(&format!("/api/v1/categories/{}/articles/", category["id"]))
        .add_header(AUTHORIZATION, bearer_auth(&user.token))
        .await
        .json();
    assert_eq!(listed, vec![created]);
}

#[tokio::test]
async fn test_article_in_foreign_category_is_forbidden() {
    let (server, state) = build_test_app().await;
    let owner = create_test_user(&state, "owner").await;
    let intruder = create_test_user(&state, "intruder").await;
    let category = create_category(&server, &owner, "Private").await;

    let response = server
        .post(&format!("/api/v1/categories/{}/articles/", category["id"]))
        .add_header(AUTHORIZATION, bearer_auth(&intruder.token))
        .json(&json!({ "title": "Sneaky", "url": "https://example.com" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = server
        .get(&format!("/api/v1/categories/{}/articles/", category["id"]))
        .add_header(AUTHORIZATION, bearer_auth(&intruder.token))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_other_user_cannot_touch_article() {
    let (server, state) = build_test_app().await;
    let owner = create_test_user(&state, "owner").await;
    let intruder = create_test_user(&state, "intruder").await;
    let category = create_category(&server, &owner, "Rust").await;
    let article = create_article(&server, &owner, &category["id"]).await;
    let path = format!(
        "/api/v1/categories/{}/articles/{}/",
        category["id"], article["id"]
    );

    let response = server
        .get(&path)
        .add_header(AUTHORIZATION, bearer_auth(&intruder.token))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = server
        .patch(&path)
        .add_header(AUTHORIZATION, bearer_auth(&intruder.token))
        .json(&json!({ "read_status": true }))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = server
        .delete(&path)
        .add_header(AUTHORIZATION, bearer_auth(&intruder.token))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_mark_article_read() {
    let (server, state) = build_test_app().await;
    let user = create_test_user(&state, "reader").await;
    let category = create_category(&server, &user, "Rust").await;
    let article = create_article(&server, &user, &category["id"]).await;
    let path = format!(
        "/api/v1/categories/{}/articles/{}/",
        category["id"], article["id"]
    );

    let response = server
        .patch(&path)
        .add_header(AUTHORIZATION, bearer_auth(&user.token))
        .json(&json!({ "read_status": true, "category": 999 }))
        .await;
    response.assert_status_ok();
    let patched: Value = response.json();
    assert_eq!(patched["read_status"], true);
    assert_eq!(patched["title"], "The Rust Book");
    assert_eq!(patched["category"], category["id"]);
}

#[tokio::test]
async fn test_article_under_wrong_category_is_not_found() {
    let (server, state) = build_test_app().await;
    let user = create_test_user(&state, "reader").await;
    let rust = create_category(&server, &user, "Rust").await;
    let sql = create_category(&server, &user, "SQL").await;
    let article = create_article(&server, &user, &rust["id"]).await;

    let response = server
        .get(&format!(
            "/api/v1/categories/{}/articles/{}/",
            sql["id"], article["id"]
        ))
        .add_header(AUTHORIZATION, bearer_auth(&user.token))
        .await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_articles_of_missing_category_are_not_found() {
    let (server, state) = build_test_app().await;
    let user = create_test_user(&state, "reader").await;

    let response = server
        .get("/api/v1/categories/404/articles/")
        .add_header(AUTHORIZATION, bearer_auth(&user.token))
        .await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_deleting_category_removes_articles() {
    let (server, state) = build_test_app().await;
    let user = create_test_user(&state, "reader").await;
    let category = create_category(&server, &user, "Rust").await;
    let article = create_article(&server, &user, &category["id"]).await;

    let response = server
        .delete(&format!("/api/v1/categories/{}/", category["id"]))
        .add_header(AUTHORIZATION, bearer_auth(&user.token))
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let response = server
        .get(&format!(
            "/api/v1/categories/{}/articles/{}/",
            category["id"], article["id"]
        ))
        .add_header(AUTHORIZATION, bearer_auth(&user.token))
        .await;
    response.assert_status_not_found();

    let (remaining,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM articles")
        .fetch_one(&state.db)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}

#[rstest]
#[case(json!({ "title": "No URL" }))]
#[case(json!({ "title": "Bad URL", "url": "not a url" }))]
#[case(json!({ "title": "FTP", "url": "ftp://example.com/file" }))]
#[case(json!({ "title": "", "url": "https://example.com" }))]
#[case(json!({ "title": "Long URL", "url": format!("https://example.com/{}", "a".repeat(200)) }))]
#[tokio::test]
async fn test_article_validation(#[case] payload: Value) {
    let (server, state) = build_test_app().await;
    let user = create_test_user(&state, "reader").await;
    let category = create_category(&server, &user, "Rust").await;

    let response = server
        .post(&format!("/api/v1/categories/{}/articles/", category["id"]))
        .add_header(AUTHORIZATION, bearer_auth(&user.token))
        .json(&payload)
        .await;
    response.assert_status_bad_request();
}
