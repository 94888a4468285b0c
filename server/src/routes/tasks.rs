use axum::{extract::State, http::StatusCode};

use super::AppState;
use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::auth::Authenticated;
use crate::error::AppError;
use crate::store::Page;
use crate::tasks::{
    TaskCreateRequest, TaskListQuery, TaskResponse, TaskStatusUpdateRequest, TaskUpdateRequest,
};

pub async fn create(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    ApiJson(request): ApiJson<TaskCreateRequest>,
) -> Result<ApiJson<TaskResponse>, AppError> {
    state.tasks.create(&principal, request).map(ApiJson)
}

pub async fn get(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiJson<TaskResponse>, AppError> {
    state.tasks.get(&principal, id).map(ApiJson)
}

pub async fn update(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<TaskUpdateRequest>,
) -> Result<ApiJson<TaskResponse>, AppError> {
    state.tasks.admin_update(&principal, id, request).map(ApiJson)
}

pub async fn update_status(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<TaskStatusUpdateRequest>,
) -> Result<ApiJson<TaskResponse>, AppError> {
    let status = request.required_status()?;
    state.tasks.update_status(&principal, id, status).map(ApiJson)
}

pub async fn delete(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, AppError> {
    state.tasks.delete(&principal, id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    ApiQuery(query): ApiQuery<TaskListQuery>,
) -> Result<ApiJson<Page<TaskResponse>>, AppError> {
    state.tasks.list(&principal, &query).map(ApiJson)
}
