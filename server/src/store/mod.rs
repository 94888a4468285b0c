//! Persistence interfaces for users and tasks.
//!
//! The authorization core only needs to look records up; everything here is a
//! narrow repository seam with an in-memory implementation in [`memory`].
//!
//! # Invariants
//! - Ids are assigned by the store, are positive, and are never reused.
//! - User emails are unique (case-sensitive; callers normalize first).

pub mod memory;

use chrono::NaiveDate;
use serde::Serialize;

use crate::tasks::{NewTask, Task, TaskStatus};
use crate::users::{NewUser, User};

pub use memory::{InMemoryTaskStore, InMemoryUserStore};

/// Errors that can occur in a store operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A store lock was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    LockPoisoned,
    /// An insert would violate email uniqueness.
    #[error("email already exists: {0}")]
    DuplicateEmail(String),
    /// An update targeted a record that does not exist.
    #[error("record not found: {0}")]
    Missing(i64),
}

/// A zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
}

impl PageRequest {
    pub const DEFAULT_SIZE: usize = 20;
    pub const MAX_SIZE: usize = 100;

    /// Build a page request, clamping `size` into `1..=MAX_SIZE`.
    #[must_use]
    pub fn new(page: Option<usize>, size: Option<usize>) -> Self {
        Self {
            page: page.unwrap_or(0),
            size: size
                .unwrap_or(Self::DEFAULT_SIZE)
                .clamp(1, Self::MAX_SIZE),
        }
    }

    const fn offset(self) -> usize {
        self.page.saturating_mul(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results plus totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: usize,
    pub size: usize,
    pub total_elements: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Slice an already ordered result set.
    #[must_use]
    pub fn from_ordered(items: Vec<T>, request: PageRequest) -> Self {
        let total_elements = items.len();
        let content = items
            .into_iter()
            .skip(request.offset())
            .take(request.size)
            .collect();
        Self {
            content,
            page: request.page,
            size: request.size,
            total_elements,
            total_pages: total_elements.div_ceil(request.size),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

/// Filters applied when listing tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Only tasks assigned to this user.
    pub owner_id: Option<i64>,
    pub status: Option<TaskStatus>,
    /// Inclusive deadline range.
    pub deadline_range: Option<(NaiveDate, NaiveDate)>,
}

impl TaskFilter {
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(owner_id) = self.owner_id {
            if task.owner_id != Some(owner_id) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }
        if let Some((from, to)) = self.deadline_range {
            match task.deadline {
                Some(deadline) if deadline >= from && deadline <= to => {}
                _ => return false,
            }
        }
        true
    }
}

/// User repository.
pub trait UserStore: Send + Sync {
    fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;

    fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.find_by_email(email)?.is_some())
    }

    /// Persist a new user and return it with its assigned id.
    fn insert(&self, user: NewUser) -> Result<User, StoreError>;

    /// Overwrite an existing user.
    fn save(&self, user: User) -> Result<User, StoreError>;

    /// Remove a user, returning whether it existed.
    fn delete(&self, id: i64) -> Result<bool, StoreError>;

    /// Page through users ordered by id, optionally filtered by a
    /// case-insensitive email fragment.
    fn list(
        &self,
        email_fragment: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<User>, StoreError>;

    /// Up to `limit` users whose email contains `fragment`
    /// (case-insensitive), ordered by email.
    fn search_by_email(&self, fragment: &str, limit: usize) -> Result<Vec<User>, StoreError>;
}

/// Task repository.
pub trait TaskStore: Send + Sync {
    fn find_by_id(&self, id: i64) -> Result<Option<Task>, StoreError>;

    /// Persist a new task and return it with its assigned id and timestamps.
    fn insert(&self, task: NewTask) -> Result<Task, StoreError>;

    /// Overwrite an existing task, refreshing `updated_at`.
    fn save(&self, task: Task) -> Result<Task, StoreError>;

    /// Remove a task, returning whether it existed.
    fn delete(&self, id: i64) -> Result<bool, StoreError>;

    /// Page through matching tasks ordered by id.
    fn list(&self, filter: &TaskFilter, page: PageRequest) -> Result<Page<Task>, StoreError>;

    /// Whether any task is assigned to `owner_id`.
    fn exists_by_owner(&self, owner_id: i64) -> Result<bool, StoreError>;
}
