use axum::extract::State;

use super::AppState;
use super::extract::ApiJson;
use crate::auth::{AuthResponse, LoginRequest, RegisterRequest};
use crate::error::AppError;

// Password hashing is CPU-bound, so both handlers leave the async workers.

pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<ApiJson<AuthResponse>, AppError> {
    let auth = state.auth;
    run_blocking(move || auth.register(&request)).await.map(ApiJson)
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<ApiJson<AuthResponse>, AppError> {
    let auth = state.auth;
    run_blocking(move || auth.login(&request)).await.map(ApiJson)
}

/// Run `f` on the blocking pool inside the current request span.
async fn run_blocking<T, F>(f: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
{
    let span = tracing::Span::current();
    tokio::task::spawn_blocking(move || span.in_scope(f))
        .await
        .map_err(|e| AppError::Internal(format!("blocking task failed: {e}")))?
}
