//! Task operations with ownership checks.
//!
//! # Pre-conditions
//! - The router has already required an authenticated caller, and the admin
//!   role on admin-only routes.
//!
//! # Post-conditions
//! - `get` and `update_status` fetch the task first (404 when absent) and only
//!   then decide access, so an unknown id never leaks as a 403.
//!
//! # Invariants
//! - A non-admin only ever sees or changes tasks assigned to them.

use std::sync::Arc;

use super::{
    NewTask, Task, TaskCreateRequest, TaskListQuery, TaskResponse, TaskStatus,
    TaskUpdateRequest,
};
use crate::auth::{Principal, Role, policy};
use crate::error::AppError;
use crate::store::{Page, PageRequest, TaskFilter, TaskStore, UserStore};

pub struct TaskService {
    tasks: Arc<dyn TaskStore>,
    users: Arc<dyn UserStore>,
}

impl TaskService {
    #[must_use]
    pub fn new(tasks: Arc<dyn TaskStore>, users: Arc<dyn UserStore>) -> Self {
        Self { tasks, users }
    }

    /// Create a task, optionally assigned to an existing user. Admin only.
    pub fn create(
        &self,
        principal: &Principal,
        request: TaskCreateRequest,
    ) -> Result<TaskResponse, AppError> {
        policy::require_role(Some(principal), Role::Admin)?;
        request.validate()?;
        tracing::info!(
            "task create requested (assigneeId={:?}, deadline={:?})",
            request.assignee_id,
            request.deadline
        );
        self.require_assignee_exists(request.assignee_id)?;

        let task = self.tasks.insert(NewTask {
            owner_id: request.assignee_id,
            title: request.title,
            description: request.description,
            status: TaskStatus::default(),
            deadline: request.deadline,
        })?;
        tracing::info!(
            "task created (taskId={}, assigneeId={:?}, status={})",
            task.id,
            task.owner_id,
            task.status
        );
        self.to_response(task)
    }

    /// Fetch one task the caller owns, or any task for admins.
    pub fn get(&self, principal: &Principal, task_id: i64) -> Result<TaskResponse, AppError> {
        tracing::debug!(
            "task get requested (taskId={}, userId={}, role={})",
            task_id,
            principal.subject_id,
            principal.role
        );
        let task = self.find(task_id)?;
        policy::require_owner_or_admin(principal, task.owner_id)?;
        self.to_response(task)
    }

    /// Replace a task's fields. Admin only; `status` changes only when given.
    pub fn admin_update(
        &self,
        principal: &Principal,
        task_id: i64,
        request: TaskUpdateRequest,
    ) -> Result<TaskResponse, AppError> {
        policy::require_role(Some(principal), Role::Admin)?;
        request.validate()?;
        tracing::info!(
            "task update requested (taskId={}, assigneeId={:?}, status={:?}, deadline={:?})",
            task_id,
            request.assignee_id,
            request.status,
            request.deadline
        );
        let mut task = self.find(task_id)?;
        self.require_assignee_exists(request.assignee_id)?;

        task.title = request.title;
        task.description = request.description;
        if let Some(status) = request.status {
            task.status = status;
        }
        task.deadline = request.deadline;
        task.owner_id = request.assignee_id;

        let task = self.tasks.save(task)?;
        tracing::info!(
            "task update success (taskId={}, assigneeId={:?}, status={})",
            task.id,
            task.owner_id,
            task.status
        );
        self.to_response(task)
    }

    /// Move a task to `status`. Users may only move their own tasks.
    pub fn update_status(
        &self,
        principal: &Principal,
        task_id: i64,
        status: TaskStatus,
    ) -> Result<TaskResponse, AppError> {
        let principal = policy::require_any_role(Some(principal), &[Role::Admin, Role::User])?;
        tracing::info!(
            "task status update requested (taskId={}, userId={}, newStatus={})",
            task_id,
            principal.subject_id,
            status
        );
        let mut task = self.find(task_id)?;
        policy::require_owner_or_admin(principal, task.owner_id)?;

        task.status = status;
        let task = self.tasks.save(task)?;
        tracing::info!("task status updated (taskId={}, status={})", task.id, task.status);
        self.to_response(task)
    }

    /// Delete a task. Admin only.
    pub fn delete(&self, principal: &Principal, task_id: i64) -> Result<(), AppError> {
        policy::require_role(Some(principal), Role::Admin)?;
        tracing::info!("task delete requested (taskId={task_id})");
        if !self.tasks.delete(task_id)? {
            tracing::warn!("task delete failed: task not found (taskId={task_id})");
            return Err(not_found());
        }
        tracing::info!("task deleted (taskId={task_id})");
        Ok(())
    }

    /// Page through tasks: every task for admins, assigned tasks otherwise.
    pub fn list(
        &self,
        principal: &Principal,
        query: &TaskListQuery,
    ) -> Result<Page<TaskResponse>, AppError> {
        let filter = TaskFilter {
            owner_id: (!principal.is_admin()).then_some(principal.subject_id),
            status: query.status,
            deadline_range: query.deadline_range(),
        };
        let page = PageRequest::new(query.page, query.size);
        tracing::debug!(
            "task list requested (userId={}, filter={:?}, page={}, size={})",
            principal.subject_id,
            filter,
            page.page,
            page.size
        );
        let tasks = self.tasks.list(&filter, page)?;
        tracing::debug!(
            "task list returned (userId={}, totalElements={})",
            principal.subject_id,
            tasks.total_elements
        );

        let content = tasks
            .content
            .into_iter()
            .map(|task| self.to_response(task))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page {
            content,
            page: tasks.page,
            size: tasks.size,
            total_elements: tasks.total_elements,
            total_pages: tasks.total_pages,
        })
    }

    fn find(&self, task_id: i64) -> Result<Task, AppError> {
        self.tasks.find_by_id(task_id)?.ok_or_else(|| {
            tracing::warn!("task lookup failed: task not found (taskId={task_id})");
            not_found()
        })
    }

    fn require_assignee_exists(&self, assignee_id: Option<i64>) -> Result<(), AppError> {
        let Some(id) = assignee_id else {
            return Ok(());
        };
        if self.users.find_by_id(id)?.is_none() {
            tracing::warn!("task assignee not found (assigneeId={id})");
            return Err(AppError::BadRequest(format!("User not found: {id}")));
        }
        Ok(())
    }

    fn to_response(&self, task: Task) -> Result<TaskResponse, AppError> {
        let email = match task.owner_id {
            Some(id) => self.users.find_by_id(id)?.map(|user| user.email),
            None => None,
        };
        Ok(TaskResponse::new(task, email))
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Task not found".to_string())
}
