//! Registration and login issue tokens the rest of the API accepts.

use axum::http::StatusCode;
use serde_json::json;

use crate::e2e_tests::helpers::*;

#[tokio::test]
async fn test_register_then_use_token() {
    let app = TestApp::new();
    let registered = app
        .post(
            "/api/auth/register",
            None,
            &json!({ "email": " New.User@Example.com ", "password": "secret1" }),
        )
        .await;
    assert_eq!(registered.status, StatusCode::OK);
    let token = registered.body["accessToken"]
        .as_str()
        .expect("token")
        .to_string();

    let claims = app.codec.verify(&token).expect("valid token");
    assert_eq!(claims.sub, "new.user@example.com");
    assert_eq!(claims.role.as_deref(), Some("USER"));

    let tasks = app.get("/api/tasks", Some(&token)).await;
    assert_eq!(tasks.status, StatusCode::OK);
    assert_eq!(tasks.body["totalElements"], 0);

    let admin_only = app.get("/api/admin/users", Some(&token)).await;
    assert_eq!(admin_only.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_duplicate_registration() {
    let app = TestApp::new();
    let body = json!({ "email": "dup@example.com", "password": "secret1" });
    assert_eq!(
        app.post("/api/auth/register", None, &body).await.status,
        StatusCode::OK
    );

    let again = app
        .post(
            "/api/auth/register",
            None,
            &json!({ "email": "DUP@example.com", "password": "another1" }),
        )
        .await;
    assert_api_error(
        &again,
        StatusCode::CONFLICT,
        "Email already exists: dup@example.com",
        "/api/auth/register",
    );
}

#[tokio::test]
async fn test_register_validation() {
    let app = TestApp::new();
    let response = app
        .post(
            "/api/auth/register",
            None,
            &json!({ "email": "not-an-email", "password": "123" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let message = response.body["message"].as_str().expect("message");
    assert!(message.contains("email"));
    assert!(message.contains("password"));
}

#[tokio::test]
async fn test_login() {
    let app = TestApp::new();
    let credentials = json!({ "email": "login@example.com", "password": "secret1" });
    app.post("/api/auth/register", None, &credentials).await;

    let ok = app.post("/api/auth/login", None, &credentials).await;
    assert_eq!(ok.status, StatusCode::OK);
    let token = ok.body["accessToken"].as_str().expect("token");
    assert!(app.codec.verify(token).is_ok());

    for body in [
        json!({ "email": "login@example.com", "password": "wrong-password" }),
        json!({ "email": "nobody@example.com", "password": "secret1" }),
    ] {
        let denied = app.post("/api/auth/login", None, &body).await;
        assert_api_error(
            &denied,
            StatusCode::UNAUTHORIZED,
            "Invalid email or password",
            "/api/auth/login",
        );
    }
}
