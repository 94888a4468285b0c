//! Common helpers for end-to-end tests.

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;

use crate::auth::{Argon2PasswordHasher, Role, TokenCodec};
use crate::routes::{AppState, router};
use crate::store::{InMemoryTaskStore, InMemoryUserStore, TaskStore, UserStore};
use crate::tasks::{NewTask, TaskStatus};
use crate::testing::test_codec;
use crate::users::NewUser;

/// A full application over fresh in-memory stores.
pub struct TestApp {
    pub router: Router,
    pub codec: Arc<TokenCodec>,
    pub users: Arc<InMemoryUserStore>,
    pub tasks: Arc<InMemoryTaskStore>,
}

/// A response with its body decoded as JSON (`Value::Null` when empty).
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        let codec = Arc::new(test_codec(15));
        let users = Arc::new(InMemoryUserStore::new());
        let tasks = Arc::new(InMemoryTaskStore::new());
        let state = AppState::new(
            Arc::clone(&codec),
            Arc::clone(&users) as Arc<dyn UserStore>,
            Arc::clone(&tasks) as Arc<dyn TaskStore>,
            Arc::new(Argon2PasswordHasher::new()),
        );
        Self {
            router: router(state),
            codec,
            users,
            tasks,
        }
    }

    /// Issue a valid token without touching the user store.
    #[allow(clippy::expect_used)]
    pub fn token_for(&self, uid: i64, role: Role) -> String {
        self.codec
            .issue_access_token(uid, &format!("user{uid}@example.com"), role.as_str())
            .expect("issue token")
    }

    #[allow(clippy::expect_used)]
    pub fn add_user(&self, email: &str, role: Role) -> i64 {
        self.users
            .insert(NewUser {
                email: email.to_string(),
                password_hash: "not-a-real-hash".to_string(),
                role,
            })
            .expect("insert user")
            .id
    }

    /// Insert a task directly, bypassing the assignee check.
    #[allow(clippy::expect_used)]
    pub fn add_task(&self, owner_id: Option<i64>, title: &str) -> i64 {
        self.tasks
            .insert(NewTask {
                owner_id,
                title: title.to_string(),
                description: None,
                status: TaskStatus::Todo,
                deadline: None,
            })
            .expect("insert task")
            .id
    }

    /// Send `request` through the router.
    #[allow(clippy::expect_used)]
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("JSON body")
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(request(Method::GET, uri, token, None)).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: &Value) -> TestResponse {
        self.send(request(Method::POST, uri, token, Some(body))).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: &Value) -> TestResponse {
        self.send(request(Method::PUT, uri, token, Some(body))).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: &Value) -> TestResponse {
        self.send(request(Method::PATCH, uri, token, Some(body))).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(request(Method::DELETE, uri, token, None)).await
    }
}

/// Build a request with an optional bearer token and JSON body.
#[allow(clippy::expect_used)]
pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<&Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).expect("valid request")
}

/// Assert that `response` is an error in the uniform shape.
pub fn assert_api_error(response: &TestResponse, status: StatusCode, message: &str, path: &str) {
    assert_eq!(response.status, status, "body: {}", response.body);
    assert_eq!(response.body["status"], status.as_u16());
    assert_eq!(
        response.body["error"],
        status.canonical_reason().unwrap_or_default()
    );
    assert_eq!(response.body["message"], message);
    assert_eq!(response.body["path"], path);
    assert!(response.body["timestamp"].is_string());
}
