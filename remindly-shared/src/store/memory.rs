//! In-process store for tests and local demos
//!
//! All state sits behind a single async mutex, so every operation (the
//! two-step redemption included) is atomic with respect to the others.
//!
//! Two switches simulate backend trouble:
//!
//! - [`MemoryStore::set_offline`]: every operation fails
//! - [`MemoryStore::set_read_only`]: reads succeed, writes fail
//!
//! Both fail with `StoreError::Database(sqlx::Error::PoolTimedOut)`, the same
//! error a saturated PostgreSQL pool produces.
//!
//! # Example
//!
//! ```
//! use remindly_shared::models::user::CreateUser;
//! use remindly_shared::store::{MemoryStore, UserStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! store.insert_user(CreateUser {
//!     email: "user@example.com".to_string(),
//!     password_hash: "$argon2id$...".to_string(),
//! }).await?;
//!
//! assert!(store.user_exists("user@example.com").await?);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{PendingRegistrationStore, Store, StoreError, StoreResult, TaskStore, UserStore};
use crate::models::pending_registration::{PendingRegistration, UpsertPendingRegistration};
use crate::models::task::{CreateTask, Task};
use crate::models::user::{CreateUser, User};

#[derive(Debug, Default)]
struct State {
    users: HashMap<String, User>,
    /// Keyed by email; at most one per address
    pending: HashMap<String, PendingRegistration>,
    /// Insertion order is creation order
    tasks: Vec<Task>,
}

/// Store backed by in-process maps
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    offline: AtomicBool,
    read_only: AtomicBool,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent operation fail (or succeed again)
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Makes every subsequent write fail (or succeed again)
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    fn check_read(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    fn check_write(&self) -> StoreResult<()> {
        self.check_read()?;
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

impl State {
    fn insert_user(&mut self, data: CreateUser) -> StoreResult<User> {
        if self.users.contains_key(&data.email) {
            return Err(StoreError::Duplicate(format!(
                "user {} already exists",
                data.email
            )));
        }

        let user = User {
            email: data.email,
            password_hash: data.password_hash,
            subscribed: false,
            created_at: Utc::now(),
        };
        self.users.insert(user.email.clone(), user.clone());

        Ok(user)
    }

    fn pending_email_for_token(&self, token_hash: &str) -> Option<String> {
        self.pending
            .values()
            .find(|p| p.token_hash == token_hash)
            .map(|p| p.email.clone())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.check_read()?;
        Ok(self.state.lock().await.users.get(email).cloned())
    }

    async fn user_exists(&self, email: &str) -> StoreResult<bool> {
        self.check_read()?;
        Ok(self.state.lock().await.users.contains_key(email))
    }

    async fn insert_user(&self, data: CreateUser) -> StoreResult<User> {
        self.check_write()?;
        self.state.lock().await.insert_user(data)
    }

    async fn set_subscribed(&self, email: &str, subscribed: bool) -> StoreResult<bool> {
        self.check_write()?;
        let mut state = self.state.lock().await;

        match state.users.get_mut(email) {
            Some(user) => {
                user.subscribed = subscribed;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_subscribed_emails(&self) -> StoreResult<Vec<String>> {
        self.check_read()?;
        let state = self.state.lock().await;

        let mut emails: Vec<String> = state
            .users
            .values()
            .filter(|u| u.subscribed)
            .map(|u| u.email.clone())
            .collect();
        emails.sort();

        Ok(emails)
    }

    async fn delete_user(&self, email: &str) -> StoreResult<bool> {
        self.check_write()?;
        let mut state = self.state.lock().await;

        if state.users.remove(email).is_none() {
            return Ok(false);
        }
        state.tasks.retain(|t| t.owner_email != email);
        state.pending.remove(email);

        Ok(true)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        self.check_write()?;
        let mut state = self.state.lock().await;

        if !state.users.contains_key(&data.owner_email) {
            return Err(StoreError::MissingReference(format!(
                "user {} does not exist",
                data.owner_email
            )));
        }

        let task = Task {
            id: Uuid::new_v4(),
            owner_email: data.owner_email,
            text: data.text,
            created_at: Utc::now(),
        };
        state.tasks.push(task.clone());

        Ok(task)
    }

    async fn get_tasks(&self, owner_email: &str) -> StoreResult<Vec<Task>> {
        self.check_read()?;
        let state = self.state.lock().await;

        Ok(state
            .tasks
            .iter()
            .filter(|t| t.owner_email == owner_email)
            .cloned()
            .collect())
    }

    async fn delete_task(&self, owner_email: &str, id: Uuid) -> StoreResult<bool> {
        self.check_write()?;
        let mut state = self.state.lock().await;

        let before = state.tasks.len();
        state
            .tasks
            .retain(|t| !(t.id == id && t.owner_email == owner_email));

        Ok(state.tasks.len() < before)
    }

    async fn clear_tasks(&self, owner_email: &str) -> StoreResult<u64> {
        self.check_write()?;
        let mut state = self.state.lock().await;

        let before = state.tasks.len();
        state.tasks.retain(|t| t.owner_email != owner_email);

        Ok((before - state.tasks.len()) as u64)
    }
}

#[async_trait]
impl PendingRegistrationStore for MemoryStore {
    async fn find_pending_by_token(
        &self,
        token_hash: &str,
    ) -> StoreResult<Option<PendingRegistration>> {
        self.check_read()?;
        let state = self.state.lock().await;

        Ok(state
            .pending
            .values()
            .find(|p| p.token_hash == token_hash)
            .cloned())
    }

    async fn pending_exists_for_email(&self, email: &str) -> StoreResult<bool> {
        self.check_read()?;
        Ok(self.state.lock().await.pending.contains_key(email))
    }

    async fn upsert_pending_registration(
        &self,
        data: UpsertPendingRegistration,
    ) -> StoreResult<Option<PendingRegistration>> {
        self.check_write()?;
        let mut state = self.state.lock().await;

        if state.users.contains_key(&data.email) {
            return Ok(None);
        }

        if let Some(owner) = state.pending_email_for_token(&data.token_hash) {
            if owner != data.email {
                return Err(StoreError::Duplicate(
                    "token digest already in use".to_string(),
                ));
            }
        }

        let now = Utc::now();
        let pending = match state.pending.get_mut(&data.email) {
            Some(existing) => {
                existing.password_hash = data.password_hash;
                existing.token_hash = data.token_hash;
                existing.updated_at = now;
                existing.clone()
            }
            None => {
                let pending = PendingRegistration {
                    email: data.email,
                    password_hash: data.password_hash,
                    token_hash: data.token_hash,
                    created_at: now,
                    updated_at: now,
                };
                state.pending.insert(pending.email.clone(), pending.clone());
                pending
            }
        };

        Ok(Some(pending))
    }

    async fn delete_pending(&self, token_hash: &str) -> StoreResult<bool> {
        self.check_write()?;
        let mut state = self.state.lock().await;

        match state.pending_email_for_token(token_hash) {
            Some(email) => Ok(state.pending.remove(&email).is_some()),
            None => Ok(false),
        }
    }

    async fn redeem_pending(&self, token_hash: &str) -> StoreResult<Option<User>> {
        self.check_write()?;
        let mut state = self.state.lock().await;

        let Some(email) = state.pending_email_for_token(token_hash) else {
            return Ok(None);
        };

        // Insert first so a duplicate leaves the pending row in place,
        // matching a rolled back transaction.
        let Some(pending) = state.pending.get(&email).cloned() else {
            return Ok(None);
        };
        let user = state.insert_user(CreateUser {
            email: pending.email,
            password_hash: pending.password_hash,
        })?;
        state.pending.remove(&email);

        Ok(Some(user))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> StoreResult<()> {
        self.check_read()
    }
}
