//! Database models for Remindly
//!
//! Each model owns its SQL; the [`crate::store`] traits sit on top so the
//! registration workflow and the reminder worker never touch `sqlx` directly.
//!
//! # Models
//!
//! - `user`: verified accounts and the reminder subscription flag
//! - `pending_registration`: sign-ups waiting for email confirmation
//! - `task`: per-user to-do items
//!
//! # Example
//!
//! ```no_run
//! use remindly_shared::db::pool::{create_pool, DatabaseConfig};
//! use remindly_shared::models::user::User;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool(DatabaseConfig::from_env()?).await?;
//! let user = User::find_by_email(&pool, "user@example.com").await?;
//! # Ok(())
//! # }
//! ```

pub mod pending_registration;
pub mod task;
pub mod user;
