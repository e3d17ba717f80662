//! PostgreSQL store
//!
//! A thin adapter from the store traits to the model methods. All SQL lives
//! in [`crate::models`]; this file only maps errors.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{PendingRegistrationStore, Store, StoreError, StoreResult, TaskStore, UserStore};
use crate::db::pool;
use crate::models::pending_registration::{PendingRegistration, UpsertPendingRegistration};
use crate::models::task::{CreateTask, Task};
use crate::models::user::{CreateUser, User};

/// Store backed by a PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wraps an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        User::find_by_email(&self.pool, email)
            .await
            .map_err(StoreError::from_sqlx)
    }

    async fn user_exists(&self, email: &str) -> StoreResult<bool> {
        User::exists(&self.pool, email)
            .await
            .map_err(StoreError::from_sqlx)
    }

    async fn insert_user(&self, data: CreateUser) -> StoreResult<User> {
        User::create(&self.pool, data)
            .await
            .map_err(StoreError::from_sqlx)
    }

    async fn set_subscribed(&self, email: &str, subscribed: bool) -> StoreResult<bool> {
        User::set_subscribed(&self.pool, email, subscribed)
            .await
            .map_err(StoreError::from_sqlx)
    }

    async fn list_subscribed_emails(&self) -> StoreResult<Vec<String>> {
        User::list_subscribed_emails(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)
    }

    async fn delete_user(&self, email: &str) -> StoreResult<bool> {
        User::delete(&self.pool, email)
            .await
            .map_err(StoreError::from_sqlx)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        Task::create(&self.pool, data)
            .await
            .map_err(StoreError::from_sqlx)
    }

    async fn get_tasks(&self, owner_email: &str) -> StoreResult<Vec<Task>> {
        Task::list_by_owner(&self.pool, owner_email)
            .await
            .map_err(StoreError::from_sqlx)
    }

    async fn delete_task(&self, owner_email: &str, id: Uuid) -> StoreResult<bool> {
        Task::delete(&self.pool, owner_email, id)
            .await
            .map_err(StoreError::from_sqlx)
    }

    async fn clear_tasks(&self, owner_email: &str) -> StoreResult<u64> {
        Task::delete_all_by_owner(&self.pool, owner_email)
            .await
            .map_err(StoreError::from_sqlx)
    }
}

#[async_trait]
impl PendingRegistrationStore for PgStore {
    async fn find_pending_by_token(
        &self,
        token_hash: &str,
    ) -> StoreResult<Option<PendingRegistration>> {
        PendingRegistration::find_by_token_hash(&self.pool, token_hash)
            .await
            .map_err(StoreError::from_sqlx)
    }

    async fn pending_exists_for_email(&self, email: &str) -> StoreResult<bool> {
        PendingRegistration::exists_for_email(&self.pool, email)
            .await
            .map_err(StoreError::from_sqlx)
    }

    async fn upsert_pending_registration(
        &self,
        data: UpsertPendingRegistration,
    ) -> StoreResult<Option<PendingRegistration>> {
        PendingRegistration::upsert(&self.pool, data)
            .await
            .map_err(StoreError::from_sqlx)
    }

    async fn delete_pending(&self, token_hash: &str) -> StoreResult<bool> {
        PendingRegistration::delete_by_token_hash(&self.pool, token_hash)
            .await
            .map_err(StoreError::from_sqlx)
    }

    async fn redeem_pending(&self, token_hash: &str) -> StoreResult<Option<User>> {
        PendingRegistration::redeem(&self.pool, token_hash)
            .await
            .map_err(StoreError::from_sqlx)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> StoreResult<()> {
        pool::health_check(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)
    }
}
