//! Requests whose credentials do not verify are treated as anonymous, and a
//! protected route then answers 401 without saying why.

use axum::http::{Method, StatusCode, header};
use chrono::TimeDelta;

use crate::auth::{Role, TokenCodec};
use crate::e2e_tests::helpers::*;
use crate::testing::TEST_SECRET;

async fn assert_unauthorized(app: &TestApp, authorization: Option<&str>) {
    let mut req = request(Method::GET, "/api/tasks", None, None);
    if let Some(value) = authorization {
        req.headers_mut()
            .insert(header::AUTHORIZATION, value.parse().expect("header value"));
    }
    let response = app.send(req).await;
    assert_api_error(&response, StatusCode::UNAUTHORIZED, "Unauthorized", "/api/tasks");
}

#[tokio::test]
async fn test_missing_header() {
    let app = TestApp::new();
    assert_unauthorized(&app, None).await;
}

#[tokio::test]
async fn test_wrong_scheme_and_empty_token() {
    let app = TestApp::new();
    let token = app.token_for(42, Role::User);
    assert_unauthorized(&app, Some(&format!("Basic {token}"))).await;
    assert_unauthorized(&app, Some(&format!("bearer {token}"))).await;
    assert_unauthorized(&app, Some("Bearer    ")).await;
}

#[tokio::test]
async fn test_malformed_token() {
    let app = TestApp::new();
    assert_unauthorized(&app, Some("Bearer abc.def")).await;
    assert_unauthorized(&app, Some("Bearer not-a-token-at-all")).await;
}

#[tokio::test]
async fn test_tampered_token() {
    let app = TestApp::new();
    let token = app.token_for(42, Role::User);
    let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
    // Keep the user's signature, swap in a payload claiming ADMIN.
    let admin = app.token_for(42, Role::Admin);
    parts[1] = admin.split('.').nth(1).expect("payload").to_string();
    assert_unauthorized(&app, Some(&format!("Bearer {}", parts.join(".")))).await;
}

#[tokio::test]
async fn test_expired_token() {
    let app = TestApp::new();
    let expired = TokenCodec::new(TEST_SECRET, TimeDelta::zero())
        .expect("codec")
        .issue_access_token(42, "u@example.com", "USER")
        .expect("issue");
    assert_unauthorized(&app, Some(&format!("Bearer {expired}"))).await;
}

#[tokio::test]
async fn test_foreign_secret() {
    let app = TestApp::new();
    let foreign = TokenCodec::new(
        b"a-completely-different-secret-of-enough-length",
        TimeDelta::minutes(15),
    )
    .expect("codec")
    .issue_access_token(42, "u@example.com", "USER")
    .expect("issue");
    assert_unauthorized(&app, Some(&format!("Bearer {foreign}"))).await;
}

#[tokio::test]
async fn test_public_routes_ignore_bad_tokens() {
    let app = TestApp::new();
    let response = app.get("/health", Some("garbage")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "UP");
}
