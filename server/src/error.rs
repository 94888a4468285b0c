//! Boundary error type and the uniform error payload.
//!
//! Handlers and layers return [`AppError`]. Its `IntoResponse` impl renders the
//! payload and tags the response with the error; [`respond_with_api_error`]
//! then re-renders tagged responses with the request path, so failures raised
//! before a handler runs and failures raised inside one end up in the same
//! shape.
//!
//! # Invariants
//! - Every error response body is an [`ApiError`].
//! - Internal details never reach the caller; they are logged instead.

use axum::{
    Json,
    extract::{
        Request,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::{AccessError, DenialReason, IssueError, PasswordHashError};
use crate::store::StoreError;

/// Wire shape of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// When the error was rendered (ISO-8601, UTC).
    pub timestamp: DateTime<Utc>,
    /// HTTP status code.
    pub status: u16,
    /// HTTP reason phrase for `status`.
    pub error: String,
    /// Human-readable description.
    pub message: String,
    /// Request path that produced the error.
    pub path: String,
}

/// Failures surfaced to HTTP callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppError {
    /// A protected route was called without a verified principal.
    #[error("Unauthorized")]
    Unauthorized,
    /// Login with an unknown email or a wrong password.
    #[error("Invalid email or password")]
    BadCredentials,
    /// Authenticated, but not allowed to do this.
    #[error("{0}")]
    Forbidden(DenialReason),
    /// An operation refused regardless of privilege, e.g. self-delete.
    #[error("{0}")]
    InvalidOperation(String),
    /// Input failed validation or could not be parsed.
    #[error("{0}")]
    BadRequest(String),
    /// The looked-up resource does not exist.
    #[error("{0}")]
    NotFound(String),
    /// A uniqueness or integrity rule would be violated.
    #[error("{0}")]
    Conflict(String),
    /// The path exists but does not accept this method.
    #[error("Request method '{0}' is not supported")]
    MethodNotAllowed(String),
    /// Anything else. The detail is logged, never returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized | Self::BadCredentials => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::InvalidOperation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the caller.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// Build the wire payload for this error at `path`.
    #[must_use]
    pub fn to_api_error(&self, path: &str) -> ApiError {
        let status = self.status();
        ApiError {
            timestamp: Utc::now(),
            status: status.as_u16(),
            error: status.canonical_reason().unwrap_or_default().to_string(),
            message: self.public_message(),
            path: path.to_string(),
        }
    }

    /// Render the full response for this error at `path`.
    #[must_use]
    pub fn render(&self, path: &str) -> Response {
        let mut response = (self.status(), Json(self.to_api_error(path))).into_response();
        response.extensions_mut().insert(self.clone());
        response
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // The path is filled in by `respond_with_api_error`.
        self.render("")
    }
}

/// Outermost error layer: logs every failure once and re-renders tagged
/// responses with the request path.
///
/// The router's own method mismatch response carries no tag and no body; it
/// is rendered here as [`AppError::MethodNotAllowed`].
pub async fn respond_with_api_error(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let method = request.method().to_string();
    let response = next.run(request).await;

    let error = match response.extensions().get::<AppError>() {
        Some(error) => error.clone(),
        None if response.status() == StatusCode::METHOD_NOT_ALLOWED => {
            AppError::MethodNotAllowed(method)
        }
        None => return response,
    };

    match &error {
        AppError::Internal(detail) => {
            tracing::error!("request failed (path={}, error={})", path, detail);
        }
        other => {
            tracing::warn!(
                "request failed (path={}, status={}, message={})",
                path,
                other.status().as_u16(),
                other
            );
        }
    }

    let mut rendered = error.render(&path);
    for (name, value) in response.headers() {
        if !rendered.headers().contains_key(name) {
            rendered.headers_mut().insert(name.clone(), value.clone());
        }
    }
    rendered
}

impl From<AccessError> for AppError {
    fn from(error: AccessError) -> Self {
        match error {
            AccessError::Forbidden(reason) => Self::Forbidden(reason),
            AccessError::InvalidOperation(message) => Self::InvalidOperation(message.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::DuplicateEmail(_) => Self::Conflict("Data integrity violation".to_string()),
            StoreError::LockPoisoned | StoreError::Missing(_) => Self::Internal(error.to_string()),
        }
    }
}

impl From<PasswordHashError> for AppError {
    fn from(error: PasswordHashError) -> Self {
        Self::Internal(error.to_string())
    }
}

impl From<IssueError> for AppError {
    fn from(error: IssueError) -> Self {
        Self::Internal(error.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("json body rejected: {rejection}");
        Self::BadRequest("Malformed JSON request".to_string())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(format!("Invalid path parameter: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(format!("Invalid query parameter: {}", rejection.body_text()))
    }
}
