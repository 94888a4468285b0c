//! Admin operations on user accounts.
//!
//! Callers must already have passed the admin role check; `delete`
//! additionally refuses to let an admin remove their own account.

use std::sync::Arc;

use super::{UpdateUserRoleRequest, UserAdminResponse, UserOption};
use crate::auth::{Principal, Role, policy};
use crate::error::AppError;
use crate::store::{Page, PageRequest, TaskStore, UserStore};

/// Maximum number of results returned by [`UserAdminService::search`].
pub const SEARCH_LIMIT: usize = 20;

pub struct UserAdminService {
    users: Arc<dyn UserStore>,
    tasks: Arc<dyn TaskStore>,
}

impl UserAdminService {
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>, tasks: Arc<dyn TaskStore>) -> Self {
        Self { users, tasks }
    }

    /// Page through users, optionally filtered by an email fragment.
    pub fn list(
        &self,
        query: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<UserAdminResponse>, AppError> {
        let fragment = query.map(str::trim).filter(|q| !q.is_empty());
        tracing::debug!(
            "admin users list requested (query={:?}, page={}, size={})",
            fragment,
            page.page,
            page.size
        );
        let users = self.users.list(fragment, page)?;
        tracing::debug!(
            "admin users list returned (totalElements={})",
            users.total_elements
        );
        Ok(users.map(UserAdminResponse::from))
    }

    /// Change a user's role.
    ///
    /// The new role only takes effect in tokens issued after the change.
    pub fn update_role(
        &self,
        target_id: i64,
        request: &UpdateUserRoleRequest,
    ) -> Result<UserAdminResponse, AppError> {
        let Some(role_name) = request.role.as_deref() else {
            return Err(AppError::BadRequest("role: must not be null".to_string()));
        };
        tracing::info!(
            "admin role update requested (targetUserId={}, newRole={})",
            target_id,
            role_name
        );
        let role: Role = role_name
            .parse()
            .map_err(|_| AppError::BadRequest(format!("Unknown role: {role_name}")))?;

        let Some(mut user) = self.users.find_by_id(target_id)? else {
            tracing::warn!("admin role update failed: user not found (targetUserId={target_id})");
            return Err(AppError::NotFound("User not found".to_string()));
        };
        user.role = role;
        let user = self.users.save(user)?;

        tracing::info!(
            "admin role updated (targetUserId={}, role={})",
            user.id,
            user.role
        );
        Ok(user.into())
    }

    /// Delete a user account other than the caller's own.
    ///
    /// The assigned-tasks check and the delete take separate store locks, and
    /// `TaskService` checks an assignee against the user store the same way.
    /// A task assigned while its assignee is being deleted can therefore keep
    /// an `owner_id` with no matching user. Readers already treat a missing
    /// assignee as absent (`assigneeEmail` is `null`).
    pub fn delete(&self, principal: &Principal, target_id: i64) -> Result<(), AppError> {
        tracing::info!(
            "admin delete requested (targetUserId={}, adminId={})",
            target_id,
            principal.subject_id
        );
        policy::require_not_self(principal, target_id)?;

        if self.users.find_by_id(target_id)?.is_none() {
            tracing::warn!("admin delete failed: user not found (targetUserId={target_id})");
            return Err(AppError::NotFound("User not found".to_string()));
        }
        if self.tasks.exists_by_owner(target_id)? {
            tracing::warn!(
                "admin delete rejected: user still has assigned tasks (targetUserId={target_id})"
            );
            return Err(AppError::Conflict("Data integrity violation".to_string()));
        }

        self.users.delete(target_id)?;
        tracing::info!(
            "admin delete success (targetUserId={}, adminId={})",
            target_id,
            principal.subject_id
        );
        Ok(())
    }

    /// Up to [`SEARCH_LIMIT`] users matching `query`; a blank query yields nothing.
    pub fn search(&self, query: &str) -> Result<Vec<UserOption>, AppError> {
        let query = query.trim();
        if query.is_empty() {
            tracing::debug!("admin user search skipped: empty query");
            return Ok(Vec::new());
        }
        let found: Vec<UserOption> = self
            .users
            .search_by_email(query, SEARCH_LIMIT)?
            .into_iter()
            .map(|u| UserOption {
                id: u.id,
                email: u.email,
            })
            .collect();
        tracing::debug!(
            "admin user search result (query='{}', count={})",
            query,
            found.len()
        );
        Ok(found)
    }
}
