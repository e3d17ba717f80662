//! Schema migrations
//!
//! SQL files live in `migrations/` at the workspace root and are embedded at
//! compile time. Each migration is reversible (`.up.sql` / `.down.sql`).
//!
//! Tables:
//!
//! - `users`: verified accounts keyed by email, with the `subscribed` flag
//! - `pending_registrations`: unconfirmed sign-ups, one per email, keyed by token digest
//! - `tasks`: per-user to-do items, removed with their owner

use sqlx::{migrate::MigrateDatabase, postgres::PgPool, Postgres};
use tracing::{debug, info, warn};

/// Applies every migration that has not run yet
///
/// # Errors
///
/// Returns the first migration failure; sqlx rolls that migration back.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations");

    match sqlx::migrate!("../migrations").run(pool).await {
        Ok(()) => {
            info!("Database schema is up to date");
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Migration failed");
            Err(e)
        }
    }
}

/// Creates the database named in `database_url` if it is missing
///
/// Meant for development and test setups.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if Postgres::database_exists(database_url).await? {
        debug!("Database already exists");
    } else {
        info!("Database does not exist, creating it");
        Postgres::create_database(database_url).await?;
    }

    Ok(())
}
