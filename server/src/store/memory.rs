//! In-memory stores.
//!
//! # Thread Safety
//!
//! Each store guards its table with an `RwLock`, allowing concurrent lookups
//! with exclusive access for writes. A poisoned lock surfaces as
//! `StoreError::LockPoisoned` rather than a panic.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use chrono::Utc;

use super::{Page, PageRequest, StoreError, TaskFilter, TaskStore, UserStore};
use crate::tasks::{NewTask, Task};
use crate::users::{NewUser, User};

#[derive(Debug, Default)]
struct UserTable {
    last_id: i64,
    by_id: BTreeMap<i64, User>,
    id_by_email: HashMap<String, i64>,
}

/// User store backed by an in-process map.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    table: RwLock<UserTable>,
}

impl InMemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for InMemoryUserStore {
    fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let table = self.table.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(table.by_id.get(&id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let table = self.table.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(table
            .id_by_email
            .get(email)
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let mut table = self.table.write().map_err(|_| StoreError::LockPoisoned)?;
        if table.id_by_email.contains_key(&user.email) {
            return Err(StoreError::DuplicateEmail(user.email));
        }

        table.last_id += 1;
        let stored = User {
            id: table.last_id,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: Utc::now(),
        };
        table.id_by_email.insert(stored.email.clone(), stored.id);
        table.by_id.insert(stored.id, stored.clone());
        drop(table);

        Ok(stored)
    }

    fn save(&self, user: User) -> Result<User, StoreError> {
        let mut table = self.table.write().map_err(|_| StoreError::LockPoisoned)?;
        let Some(previous_email) = table.by_id.get(&user.id).map(|u| u.email.clone()) else {
            return Err(StoreError::Missing(user.id));
        };

        if previous_email != user.email {
            if table.id_by_email.contains_key(&user.email) {
                return Err(StoreError::DuplicateEmail(user.email));
            }
            table.id_by_email.remove(&previous_email);
            table.id_by_email.insert(user.email.clone(), user.id);
        }
        table.by_id.insert(user.id, user.clone());
        drop(table);

        Ok(user)
    }

    fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut table = self.table.write().map_err(|_| StoreError::LockPoisoned)?;
        let Some(removed) = table.by_id.remove(&id) else {
            return Ok(false);
        };
        table.id_by_email.remove(&removed.email);
        Ok(true)
    }

    fn list(
        &self,
        email_fragment: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<User>, StoreError> {
        let needle = email_fragment.map(str::to_lowercase);
        let table = self.table.read().map_err(|_| StoreError::LockPoisoned)?;
        let matching = table
            .by_id
            .values()
            .filter(|u| {
                needle
                    .as_deref()
                    .is_none_or(|n| u.email.to_lowercase().contains(n))
            })
            .cloned()
            .collect();
        drop(table);

        Ok(Page::from_ordered(matching, page))
    }

    fn search_by_email(&self, fragment: &str, limit: usize) -> Result<Vec<User>, StoreError> {
        let needle = fragment.to_lowercase();
        let table = self.table.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut matching: Vec<User> = table
            .by_id
            .values()
            .filter(|u| u.email.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        drop(table);

        matching.sort_by(|a, b| a.email.cmp(&b.email));
        matching.truncate(limit);
        Ok(matching)
    }
}

#[derive(Debug, Default)]
struct TaskTable {
    last_id: i64,
    by_id: BTreeMap<i64, Task>,
}

/// Task store backed by an in-process map.
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    table: RwLock<TaskTable>,
}

impl InMemoryTaskStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskStore for InMemoryTaskStore {
    fn find_by_id(&self, id: i64) -> Result<Option<Task>, StoreError> {
        let table = self.table.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(table.by_id.get(&id).cloned())
    }

    fn insert(&self, task: NewTask) -> Result<Task, StoreError> {
        let mut table = self.table.write().map_err(|_| StoreError::LockPoisoned)?;
        table.last_id += 1;
        let now = Utc::now();
        let stored = Task {
            id: table.last_id,
            owner_id: task.owner_id,
            title: task.title,
            description: task.description,
            status: task.status,
            deadline: task.deadline,
            created_at: now,
            updated_at: now,
        };
        table.by_id.insert(stored.id, stored.clone());
        drop(table);

        Ok(stored)
    }

    fn save(&self, mut task: Task) -> Result<Task, StoreError> {
        let mut table = self.table.write().map_err(|_| StoreError::LockPoisoned)?;
        if !table.by_id.contains_key(&task.id) {
            return Err(StoreError::Missing(task.id));
        }
        task.updated_at = Utc::now();
        table.by_id.insert(task.id, task.clone());
        drop(table);

        Ok(task)
    }

    fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut table = self.table.write().map_err(|_| StoreError::LockPoisoned)?;
        Ok(table.by_id.remove(&id).is_some())
    }

    fn list(&self, filter: &TaskFilter, page: PageRequest) -> Result<Page<Task>, StoreError> {
        let table = self.table.read().map_err(|_| StoreError::LockPoisoned)?;
        let matching = table
            .by_id
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        drop(table);

        Ok(Page::from_ordered(matching, page))
    }

    fn exists_by_owner(&self, owner_id: i64) -> Result<bool, StoreError> {
        let table = self.table.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(table
            .by_id
            .values()
            .any(|t| t.owner_id == Some(owner_id)))
    }
}
