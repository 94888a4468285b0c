//! HTTP surface: shared state, router wiring and the handlers.
//!
//! Route groups and their guards:
//! - public: `/health`, `/api/auth/*`
//! - authenticated: `/api/tasks/**` (401 without a principal)
//! - admin: `/api/admin/users/**`, `/api/users` (401 without a principal,
//!   403 for non-admins)
//!
//! Finer decisions (admin-only task writes, ownership) are made by the
//! services once the resource has been looked up.

pub mod extract;

mod auth;
mod tasks;
mod users;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Request,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post},
};
use serde_json::{Value, json};

use crate::auth::middleware::{assign_request_id, authenticate, require_admin, require_authenticated};
use crate::auth::{AuthService, PasswordHasher, TokenCodec};
use crate::error::{AppError, respond_with_api_error};
use crate::store::{TaskStore, UserStore};
use crate::tasks::TaskService;
use crate::users::UserAdminService;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub codec: Arc<TokenCodec>,
    pub auth: Arc<AuthService>,
    pub tasks: Arc<TaskService>,
    pub users: Arc<UserAdminService>,
}

impl AppState {
    #[must_use]
    pub fn new(
        codec: Arc<TokenCodec>,
        user_store: Arc<dyn UserStore>,
        task_store: Arc<dyn TaskStore>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            auth: Arc::new(AuthService::new(
                Arc::clone(&user_store),
                hasher,
                Arc::clone(&codec),
            )),
            tasks: Arc::new(TaskService::new(
                Arc::clone(&task_store),
                Arc::clone(&user_store),
            )),
            users: Arc::new(UserAdminService::new(user_store, task_store)),
            codec,
        }
    }
}

/// Build the application router with every layer applied.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login));

    let authenticated = Router::new()
        .route("/api/tasks", get(tasks::list).post(tasks::create))
        .route(
            "/api/tasks/{id}",
            get(tasks::get).put(tasks::update).delete(tasks::delete),
        )
        .route("/api/tasks/{id}/status", patch(tasks::update_status))
        .route_layer(from_fn(require_authenticated));

    let admin = Router::new()
        .route("/api/admin/users", get(users::list))
        .route("/api/admin/users/{id}", axum::routing::delete(users::delete))
        .route("/api/admin/users/{id}/role", patch(users::update_role))
        .route("/api/users", get(users::search))
        .route_layer(from_fn(require_admin));

    Router::new()
        .merge(public)
        .merge(authenticated)
        .merge(admin)
        .fallback(no_route)
        .layer(from_fn_with_state(Arc::clone(&state.codec), authenticate))
        .layer(from_fn(respond_with_api_error))
        .layer(from_fn(assign_request_id))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "UP" }))
}

async fn no_route(request: Request) -> AppError {
    AppError::NotFound(format!(
        "No endpoint {} {}",
        request.method(),
        request.uri().path()
    ))
}
