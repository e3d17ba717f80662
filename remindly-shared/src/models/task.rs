//! To-do items
//!
//! Each task belongs to exactly one user and is removed with them. Lists are
//! always read back in creation order, which is the order the reminder digest
//! numbers them in.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE tasks (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     owner_email TEXT NOT NULL REFERENCES users (email) ON DELETE CASCADE,
//!     text TEXT NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
//!
//! # Example
//!
//! ```no_run
//! use remindly_shared::models::task::{CreateTask, Task};
//! use sqlx::PgPool;
//!
//! # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
//! Task::create(&pool, CreateTask {
//!     owner_email: "user@example.com".to_string(),
//!     text: "Water the plants".to_string(),
//! }).await?;
//!
//! for task in Task::list_by_owner(&pool, "user@example.com").await? {
//!     println!("{}", task.text);
//! }
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A single to-do item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Task ID, assigned by the database
    pub id: Uuid,

    /// Owner's email
    pub owner_email: String,

    /// What needs doing
    pub text: String,

    /// Creation time, used for ordering
    pub created_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    /// Owner's email (must reference an existing user)
    pub owner_email: String,

    /// Task text
    pub text: String,
}

impl Task {
    /// Appends a task to the owner's list
    ///
    /// # Errors
    ///
    /// Fails with a foreign key violation if the owner does not exist.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (owner_email, text)
            VALUES ($1, $2)
            RETURNING id, owner_email, text, created_at
            "#,
        )
        .bind(data.owner_email)
        .bind(data.text)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Lists a user's tasks, oldest first
    pub async fn list_by_owner(pool: &PgPool, owner_email: &str) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, owner_email, text, created_at
            FROM tasks
            WHERE owner_email = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(owner_email)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Deletes one task, scoped to its owner
    ///
    /// Returns false if the task does not exist or belongs to someone else.
    pub async fn delete(pool: &PgPool, owner_email: &str, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND owner_email = $2")
            .bind(id)
            .bind(owner_email)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Empties a user's list, returning how many tasks were removed
    pub async fn delete_all_by_owner(pool: &PgPool, owner_email: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE owner_email = $1")
            .bind(owner_email)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
