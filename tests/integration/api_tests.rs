//! API integration tests
//!
//! These run against a live server started with a bootstrap owner, e.g.
//! `LIBRARY_BOOTSTRAP__OWNER_EMAIL=owner@example.org LIBRARY_BOOTSTRAP__OWNER_PASSWORD=change-me`.

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080";

fn owner_credentials() -> (String, String) {
    (
        std::env::var("TEST_OWNER_EMAIL").unwrap_or_else(|_| "owner@example.org".to_string()),
        std::env::var("TEST_OWNER_PASSWORD").unwrap_or_else(|_| "change-me".to_string()),
    )
}

/// Suffix keeping emails and ISBNs unique across runs
fn unique() -> String {
    chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default().to_string()
}

async fn login(client: &Client, email: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

async fn owner_token(client: &Client) -> String {
    let (email, password) = owner_credentials();
    login(client, &email, &password).await
}

async fn send(
    client: &Client,
    method: reqwest::Method,
    path: &str,
    token: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = client
        .request(method, format!("{}{}", BASE_URL, path))
        .bearer_auth(token);
    if let Some(body) = body {
        request = request.json(&body);
    }
    let response = request.send().await.expect("Failed to send request");
    let status = response.status();
    let body = response.json().await.unwrap_or(Value::Null);
    (status, body)
}

struct Fixture {
    library_id: i64,
    admin_token: String,
    reader_id: i64,
    reader_token: String,
}

/// Library + admin + reader, all created through the API
async fn fixture(client: &Client) -> Fixture {
    let owner = owner_token(client).await;
    let tag = unique();

    let (status, body) = send(
        client,
        reqwest::Method::POST,
        "/api/library",
        &owner,
        Some(json!({ "name": format!("Branch {}", tag), "city": "Lyon" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let library_id = body["library"]["id"].as_i64().unwrap();

    let admin_email = format!("admin-{}@example.org", tag);
    let (status, _) = send(
        client,
        reqwest::Method::POST,
        "/api/admin",
        &owner,
        Some(json!({
            "name": "Admin",
            "email": admin_email,
            "password": "admin-pass",
            "library_ids": [library_id]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let admin_token = login(client, &admin_email, "admin-pass").await;

    let reader_email = format!("reader-{}@example.org", tag);
    let (status, body) = send(
        client,
        reqwest::Method::POST,
        "/api/user",
        &admin_token,
        Some(json!({
            "name": "Reader",
            "email": reader_email,
            "password": "reader-pass",
            "library_ids": [library_id]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let reader_id = body["user"]["id"].as_i64().unwrap();
    let reader_token = login(client, &reader_email, "reader-pass").await;

    Fixture {
        library_id,
        admin_token,
        reader_id,
        reader_token,
    }
}

async fn add_book(client: &Client, fx: &Fixture, copies: i64) -> String {
    let isbn = format!("isbn-{}", unique());
    let (status, _) = send(
        client,
        reqwest::Method::POST,
        "/api/book",
        &fx.admin_token,
        Some(json!({
            "isbn": isbn,
            "title": "Dune",
            "authors": "Frank Herbert",
            "total_copies": copies,
            "library_id": fx.library_id
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    isbn
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();
    let (email, _) = owner_credentials();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": email, "password": "wrong" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_protected_route_requires_token() {
    let client = Client::new();

    let response = client
        .get(format!("{}/api/issues", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_reader_on_admin_route_is_forbidden() {
    let client = Client::new();
    let fx = fixture(&client).await;

    let (status, body) = send(&client, reqwest::Method::GET, "/api/issues", &fx.reader_token, None).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["required_role"], "admin");
    assert_eq!(body["your_role"], "user");
}

#[tokio::test]
#[ignore]
async fn test_request_approve_exhausts_copies() {
    let client = Client::new();
    let fx = fixture(&client).await;
    let isbn = add_book(&client, &fx, 1).await;

    let (status, body) = send(
        &client,
        reqwest::Method::POST,
        "/api/issue",
        &fx.reader_token,
        Some(json!({ "isbn": isbn })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let request_id = body["request"]["id"].as_i64().unwrap();

    // a second pending request for the same book is refused
    let (status, _) = send(
        &client,
        reqwest::Method::POST,
        "/api/issue",
        &fx.reader_token,
        Some(json!({ "isbn": isbn })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let path = format!("/api/issue/approve/{}", request_id);
    let (status, body) = send(&client, reqwest::Method::PUT, &path, &fx.admin_token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["request"]["approval_date"].is_i64());
    assert!(body["request"]["approver_id"].is_i64());

    let (status, _) = send(&client, reqwest::Method::PUT, &path, &fx.admin_token, None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = send(
        &client,
        reqwest::Method::GET,
        &format!("/api/books/{}", isbn),
        &fx.reader_token,
        None,
    )
    .await;
    assert_eq!(body["book"]["available_copies"], 0);

    let (status, body) = send(
        &client,
        reqwest::Method::POST,
        "/api/issue",
        &fx.reader_token,
        Some(json!({ "isbn": isbn })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Book not available for issue");
}

#[tokio::test]
#[ignore]
async fn test_disapprove_removes_request() {
    let client = Client::new();
    let fx = fixture(&client).await;
    let isbn = add_book(&client, &fx, 2).await;

    let (_, body) = send(
        &client,
        reqwest::Method::POST,
        "/api/issue",
        &fx.reader_token,
        Some(json!({ "isbn": isbn })),
    )
    .await;
    let request_id = body["request"]["id"].as_i64().unwrap();

    let (status, _) = send(
        &client,
        reqwest::Method::PUT,
        &format!("/api/issue/disapprove/{}", request_id),
        &fx.admin_token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &client,
        reqwest::Method::GET,
        &format!("/api/issue/request/{}", request_id),
        &fx.admin_token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_direct_issue_and_return() {
    let client = Client::new();
    let fx = fixture(&client).await;
    let isbn = add_book(&client, &fx, 2).await;

    let (status, body) = send(
        &client,
        reqwest::Method::POST,
        &format!("/api/issue/book/{}", isbn),
        &fx.admin_token,
        Some(json!({ "user_id": fx.reader_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let issue = &body["issue"];
    let issue_date = issue["issue_date"].as_i64().unwrap();
    assert_eq!(issue["expected_return_date"].as_i64().unwrap(), issue_date + 14 * 86_400);
    assert_eq!(issue["return_date"], 0);
    assert_eq!(issue["issue_status"], "issued");
    let issue_id = issue["id"].as_i64().unwrap();

    let path = format!("/api/issue/return/{}", issue_id);
    let (status, body) = send(&client, reqwest::Method::PUT, &path, &fx.admin_token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["issue"]["issue_status"], "returned");

    let (status, _) = send(&client, reqwest::Method::PUT, &path, &fx.admin_token, None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = send(
        &client,
        reqwest::Method::GET,
        &format!("/api/books/{}", isbn),
        &fx.admin_token,
        None,
    )
    .await;
    assert_eq!(body["book"]["available_copies"], 2);
}

#[tokio::test]
#[ignore]
async fn test_direct_issue_unknown_reader() {
    let client = Client::new();
    let fx = fixture(&client).await;
    let isbn = add_book(&client, &fx, 1).await;

    let (status, _) = send(
        &client,
        reqwest::Method::POST,
        &format!("/api/issue/book/{}", isbn),
        &fx.admin_token,
        Some(json!({ "user_id": i32::MAX })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
