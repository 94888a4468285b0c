use axum::{extract::State, http::StatusCode};
use serde::Deserialize;

use super::AppState;
use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::auth::Authenticated;
use crate::error::AppError;
use crate::store::{Page, PageRequest};
use crate::users::{UpdateUserRoleRequest, UserAdminResponse, UserOption};

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub q: Option<String>,
    pub page: Option<usize>,
    pub size: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserSearchQuery {
    #[serde(default)]
    pub q: String,
}

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UserListQuery>,
) -> Result<ApiJson<Page<UserAdminResponse>>, AppError> {
    state
        .users
        .list(query.q.as_deref(), PageRequest::new(query.page, query.size))
        .map(ApiJson)
}

pub async fn update_role(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<UpdateUserRoleRequest>,
) -> Result<ApiJson<UserAdminResponse>, AppError> {
    state.users.update_role(id, &request).map(ApiJson)
}

pub async fn delete(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, AppError> {
    state.users.delete(&principal, id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn search(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UserSearchQuery>,
) -> Result<ApiJson<Vec<UserOption>>, AppError> {
    state.users.search(&query.q).map(ApiJson)
}
