//! Verified user accounts
//!
//! A row only exists once the owner has confirmed their email address; until
//! then the sign-up lives in `pending_registrations`. The email is the primary
//! key and is stored normalised (trimmed, lowercase).
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE users (
//!     email TEXT PRIMARY KEY,
//!     password_hash VARCHAR(255) NOT NULL,
//!     subscribed BOOLEAN NOT NULL DEFAULT FALSE,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
//!
//! # Example
//!
//! ```no_run
//! use remindly_shared::models::user::{CreateUser, User};
//! use sqlx::PgPool;
//!
//! # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
//! let user = User::create(
//!     &pool,
//!     CreateUser {
//!         email: "user@example.com".to_string(),
//!         password_hash: "$argon2id$...".to_string(),
//!     },
//! )
//! .await?;
//!
//! User::set_subscribed(&pool, &user.email, true).await?;
//! let recipients = User::list_subscribed_emails(&pool).await?;
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// User account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Email address, unique across all users
    pub email: String,

    /// Argon2id PHC string
    ///
    /// Never serialized into API responses.
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Whether the user receives periodic reminder emails
    pub subscribed: bool,

    /// When the account was confirmed
    pub created_at: DateTime<Utc>,
}

/// Input for creating a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Normalised email address
    pub email: String,

    /// Argon2id hash (NOT the plaintext password)
    pub password_hash: String,
}

impl User {
    /// Inserts a new, unsubscribed user
    ///
    /// # Errors
    ///
    /// Fails with a unique violation if the email is taken.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING email, password_hash, subscribed, created_at
            "#,
        )
        .bind(data.email)
        .bind(data.password_hash)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT email, password_hash, subscribed, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Returns true if a user with this email exists
    pub async fn exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(pool)
                .await?;

        Ok(exists)
    }

    /// Sets the reminder subscription flag
    ///
    /// Returns false if no such user exists.
    pub async fn set_subscribed(
        pool: &PgPool,
        email: &str,
        subscribed: bool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET subscribed = $2 WHERE email = $1")
            .bind(email)
            .bind(subscribed)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Emails of every subscribed user, in a stable order
    pub async fn list_subscribed_emails(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
        let emails: Vec<String> =
            sqlx::query_scalar("SELECT email FROM users WHERE subscribed ORDER BY email")
                .fetch_all(pool)
                .await?;

        Ok(emails)
    }

    /// Deletes a user and, through the foreign key, all of their tasks
    ///
    /// A pending registration left for the same email goes too, so an old
    /// confirmation link cannot bring the account back. Returns false if no
    /// such user exists.
    pub async fn delete(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            WITH stale AS (
                DELETE FROM pending_registrations WHERE email = $1
            )
            DELETE FROM users WHERE email = $1
            "#,
        )
        .bind(email)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
