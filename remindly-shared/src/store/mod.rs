//! Persistence boundary
//!
//! The registration workflow, the reminder scheduler and the HTTP handlers
//! talk to storage through these traits rather than to `sqlx` directly.
//!
//! # Implementations
//!
//! - [`PgStore`]: PostgreSQL, delegating to the model methods in [`crate::models`]
//! - [`MemoryStore`]: in-process maps for tests and local demos
//!
//! "Not found" is never an error: lookups return `Ok(None)` and deletes or
//! updates return `Ok(false)`.
//!
//! Token parameters are always SHA-256 digests (see [`crate::auth::token`]);
//! stores never see raw tokens.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::pending_registration::{PendingRegistration, UpsertPendingRegistration};
use crate::models::task::{CreateTask, Task};
use crate::models::user::{CreateUser, User};

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend failed (connection, query, transaction)
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    /// A unique constraint was violated
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    /// A referenced row does not exist
    #[error("Missing referenced record: {0}")]
    MissingReference(String),
}

impl StoreError {
    /// Classifies a raw `sqlx` error, pulling constraint violations out of
    /// the generic database class
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::Duplicate(db_err.message().to_string());
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::MissingReference(db_err.message().to_string());
            }
        }

        StoreError::Database(err)
    }
}

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Verified user accounts
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Looks up a user by normalised email
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Returns true if a verified user exists for the email
    async fn user_exists(&self, email: &str) -> StoreResult<bool>;

    /// Inserts a user, unsubscribed
    ///
    /// Fails with [`StoreError::Duplicate`] if the email is taken.
    async fn insert_user(&self, data: CreateUser) -> StoreResult<User>;

    /// Sets the reminder subscription flag, returning false if no such user
    async fn set_subscribed(&self, email: &str, subscribed: bool) -> StoreResult<bool>;

    /// Emails of every subscribed user
    async fn list_subscribed_emails(&self) -> StoreResult<Vec<String>>;

    /// Deletes a user, their tasks and any pending registration for the email
    ///
    /// Returns false if no such user exists.
    async fn delete_user(&self, email: &str) -> StoreResult<bool>;
}

/// Per-user to-do lists
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Appends a task to the owner's list
    ///
    /// Fails with [`StoreError::MissingReference`] if the owner does not exist.
    async fn create_task(&self, data: CreateTask) -> StoreResult<Task>;

    /// A user's tasks in creation order
    async fn get_tasks(&self, owner_email: &str) -> StoreResult<Vec<Task>>;

    /// Deletes one of the owner's tasks, returning false if it does not exist
    async fn delete_task(&self, owner_email: &str, id: Uuid) -> StoreResult<bool>;

    /// Empties the owner's list, returning the number of tasks removed
    async fn clear_tasks(&self, owner_email: &str) -> StoreResult<u64>;
}

/// Sign-ups waiting for email confirmation
#[async_trait]
pub trait PendingRegistrationStore: Send + Sync {
    /// Looks up a pending registration by token digest
    async fn find_pending_by_token(&self, token_hash: &str)
        -> StoreResult<Option<PendingRegistration>>;

    /// Returns true if the email has an unconfirmed registration
    async fn pending_exists_for_email(&self, email: &str) -> StoreResult<bool>;

    /// Creates the pending registration or rotates the existing one's token
    ///
    /// Returns `Ok(None)` without writing anything if a verified user owns the
    /// email. The check and the write are one atomic step.
    async fn upsert_pending_registration(
        &self,
        data: UpsertPendingRegistration,
    ) -> StoreResult<Option<PendingRegistration>>;

    /// Discards a pending registration, returning false if the token is unknown
    async fn delete_pending(&self, token_hash: &str) -> StoreResult<bool>;

    /// Atomically removes the pending registration and inserts its user
    ///
    /// Returns `Ok(None)` if the token is unknown. Of several concurrent calls
    /// with the same token, at most one returns a user.
    async fn redeem_pending(&self, token_hash: &str) -> StoreResult<Option<User>>;
}

/// Everything the services need from storage
#[async_trait]
pub trait Store: UserStore + TaskStore + PendingRegistrationStore {
    /// Verifies the backend is reachable
    async fn health_check(&self) -> StoreResult<()>;
}
