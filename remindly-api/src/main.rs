//! # Remindly API Server
//!
//! Serves registration, email confirmation, login and the to-do list
//! endpoints. Reminder emails are sent by `remindly-worker`.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p remindly-api
//! ```

use std::sync::Arc;

use remindly_api::app::{build_router, AppState};
use remindly_api::config::Config;
use remindly_shared::db::migrations::run_migrations;
use remindly_shared::db::pool::{close_pool, create_pool};
use remindly_shared::mail::{SmtpConfig, SmtpMailer};
use remindly_shared::store::PgStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "remindly_api=debug,remindly_shared=info,tower_http=debug".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Remindly API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;
    let smtp = SmtpConfig::from_env()?;

    let pool = create_pool(config.database.pool_config()).await?;
    run_migrations(&pool).await?;

    let mailer = SmtpMailer::new(smtp)?;
    let bind_address = config.bind_address();

    let store = Arc::new(PgStore::new(pool.clone()));
    let state = AppState::new(store, Arc::new(mailer), config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Server stopped");

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
