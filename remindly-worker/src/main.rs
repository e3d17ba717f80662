//! # Remindly Worker
//!
//! Mails every subscribed user their to-do list once per interval and
//! unsubscribes users whose list is empty.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p remindly-worker
//! ```

use std::sync::Arc;

use remindly_shared::db::pool::{close_pool, create_pool};
use remindly_shared::mail::{Mailer, SmtpMailer};
use remindly_shared::store::{PgStore, Store};
use remindly_worker::config::WorkerConfig;
use remindly_worker::scheduler::ReminderScheduler;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "remindly_worker=debug,remindly_shared=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Remindly Worker v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = WorkerConfig::from_env()?;

    let pool = create_pool(config.database.clone()).await?;
    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool.clone()));
    let mailer: Arc<dyn Mailer> = Arc::new(SmtpMailer::new(config.smtp.clone())?);

    let scheduler = ReminderScheduler::new(store, mailer, config.reminder_interval);

    let shutdown = scheduler.shutdown_token();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.cancel();
    });

    let result = scheduler.run().await;

    close_pool(pool).await;
    result?;

    tracing::info!("Worker stopped");
    Ok(())
}

/// Waits for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
