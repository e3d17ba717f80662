//! Registrations waiting for email confirmation
//!
//! Signing up does not create a user. It creates (or refreshes) a pending
//! registration holding the password hash and the digest of a one-time
//! confirmation token. Following the emailed link redeems the token: the
//! pending row is deleted and the user row inserted in the same transaction.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE pending_registrations (
//!     email TEXT PRIMARY KEY,
//!     password_hash VARCHAR(255) NOT NULL,
//!     token_hash CHAR(64) NOT NULL UNIQUE,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
//!
//! Only SHA-256 digests of tokens are stored; see [`crate::auth::token`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::user::User;

/// Unconfirmed sign-up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PendingRegistration {
    /// Email address awaiting confirmation
    pub email: String,

    /// Argon2id hash from the latest submission
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// SHA-256 hex digest of the current confirmation token
    #[serde(skip_serializing)]
    pub token_hash: String,

    /// First submission for this email
    pub created_at: DateTime<Utc>,

    /// Last token rotation
    pub updated_at: DateTime<Utc>,
}

/// Input for creating or rotating a pending registration
#[derive(Debug, Clone)]
pub struct UpsertPendingRegistration {
    /// Normalised email address
    pub email: String,

    /// Argon2id hash of the submitted password
    pub password_hash: String,

    /// Digest of the freshly generated token
    pub token_hash: String,
}

impl PendingRegistration {
    /// Creates the pending registration, or rotates the token of an existing one
    ///
    /// At most one row exists per email. A repeated submission replaces both the
    /// token digest and the password hash, which invalidates the previous link.
    ///
    /// Returns `Ok(None)` and writes nothing if a user already owns the email.
    /// The existing pending row is locked first, so a redemption in flight
    /// either finishes before the user check (and the upsert is refused) or
    /// starts after the rotation (and finds its token gone).
    pub async fn upsert(
        pool: &PgPool,
        data: UpsertPendingRegistration,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("SELECT 1 FROM pending_registrations WHERE email = $1 FOR UPDATE")
            .bind(&data.email)
            .fetch_optional(&mut *tx)
            .await?;

        let pending = sqlx::query_as::<_, PendingRegistration>(
            r#"
            INSERT INTO pending_registrations (email, password_hash, token_hash)
            SELECT $1, $2, $3
            WHERE NOT EXISTS (SELECT 1 FROM users WHERE email = $1)
            ON CONFLICT (email) DO UPDATE
            SET password_hash = EXCLUDED.password_hash,
                token_hash = EXCLUDED.token_hash,
                updated_at = NOW()
            RETURNING email, password_hash, token_hash, created_at, updated_at
            "#,
        )
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.token_hash)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(pending)
    }

    /// Looks up a pending registration by token digest
    pub async fn find_by_token_hash(
        pool: &PgPool,
        token_hash: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let pending = sqlx::query_as::<_, PendingRegistration>(
            r#"
            SELECT email, password_hash, token_hash, created_at, updated_at
            FROM pending_registrations
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(pool)
        .await?;

        Ok(pending)
    }

    /// Returns true if the email has an unconfirmed registration
    pub async fn exists_for_email(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM pending_registrations WHERE email = $1)",
        )
        .bind(email)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Invalidates a token without creating a user
    pub async fn delete_by_token_hash(pool: &PgPool, token_hash: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM pending_registrations WHERE token_hash = $1")
            .bind(token_hash)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Redeems a token: deletes the pending row and inserts the user, atomically
    ///
    /// The `DELETE ... RETURNING` takes a row lock, so a concurrent redemption of
    /// the same token blocks until this transaction finishes and then finds
    /// nothing. Returns `Ok(None)` when the token is unknown.
    ///
    /// # Errors
    ///
    /// If the user insert fails (for example a unique violation because the
    /// email was confirmed through another path) the transaction is rolled back
    /// and the pending row survives.
    pub async fn redeem(pool: &PgPool, token_hash: &str) -> Result<Option<User>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let pending = sqlx::query_as::<_, PendingRegistration>(
            r#"
            DELETE FROM pending_registrations
            WHERE token_hash = $1
            RETURNING email, password_hash, token_hash, created_at, updated_at
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(pending) = pending else {
            tx.rollback().await?;
            return Ok(None);
        };

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING email, password_hash, subscribed, created_at
            "#,
        )
        .bind(&pending.email)
        .bind(&pending.password_hash)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(user))
    }
}
