//! Request and response bodies for the task routes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Task, TaskStatus};
use crate::error::AppError;

pub const TITLE_MAX_CHARS: usize = 200;
pub const DESCRIPTION_MAX_CHARS: usize = 5000;

/// Body of `POST /api/tasks`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCreateRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub assignee_id: Option<i64>,
}

impl TaskCreateRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_fields(&self.title, self.description.as_deref())
    }
}

/// Body of `PUT /api/tasks/{id}`. `status` is left unchanged when absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdateRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub deadline: Option<NaiveDate>,
    pub assignee_id: Option<i64>,
}

impl TaskUpdateRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_fields(&self.title, self.description.as_deref())
    }
}

/// Body of `PATCH /api/tasks/{id}/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskStatusUpdateRequest {
    pub status: Option<TaskStatus>,
}

impl TaskStatusUpdateRequest {
    pub fn required_status(&self) -> Result<TaskStatus, AppError> {
        self.status
            .ok_or_else(|| AppError::BadRequest("status: must not be null".to_string()))
    }
}

/// Query string of `GET /api/tasks`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListQuery {
    pub status: Option<TaskStatus>,
    pub deadline_from: Option<NaiveDate>,
    pub deadline_to: Option<NaiveDate>,
    pub page: Option<usize>,
    pub size: Option<usize>,
}

impl TaskListQuery {
    /// Inclusive range, only when both bounds are present.
    #[must_use]
    pub fn deadline_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.deadline_from.zip(self.deadline_to)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: i64,
    pub assignee_id: Option<i64>,
    pub assignee_email: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub deadline: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskResponse {
    #[must_use]
    pub fn new(task: Task, assignee_email: Option<String>) -> Self {
        Self {
            id: task.id,
            assignee_id: task.owner_id,
            assignee_email,
            title: task.title,
            description: task.description,
            status: task.status,
            deadline: task.deadline,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

fn validate_fields(title: &str, description: Option<&str>) -> Result<(), AppError> {
    let mut problems = Vec::new();
    if title.trim().is_empty() {
        problems.push("title: must not be blank".to_string());
    } else if title.chars().count() > TITLE_MAX_CHARS {
        problems.push(format!("title: size must be at most {TITLE_MAX_CHARS}"));
    }
    if description.is_some_and(|d| d.chars().count() > DESCRIPTION_MAX_CHARS) {
        problems.push(format!(
            "description: size must be at most {DESCRIPTION_MAX_CHARS}"
        ));
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err(AppError::BadRequest(problems.join("; ")))
    }
}
