//! Application state and router builder
//!
//! This module defines the shared application state and provides
//! a function to build the Axum router with all routes and middleware.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use remindly_api::{app::{build_router, AppState}, config::Config};
//! use remindly_shared::db::pool::create_pool;
//! use remindly_shared::mail::{SmtpConfig, SmtpMailer};
//! use remindly_shared::store::PgStore;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let pool = create_pool(config.database.pool_config()).await?;
//! let mailer = SmtpMailer::new(SmtpConfig::from_env()?)?;
//!
//! let state = AppState::new(Arc::new(PgStore::new(pool)), Arc::new(mailer), config);
//! let app = build_router(state);
//! # Ok(())
//! # }
//! ```

use crate::{config::Config, middleware::auth::jwt_auth_layer};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use remindly_shared::mail::Mailer;
use remindly_shared::registration::{RegistrationConfig, RegistrationService};
use remindly_shared::store::Store;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Persistence
    pub store: Arc<dyn Store>,

    /// Sign-up and email confirmation
    pub registration: RegistrationService,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(store: Arc<dyn Store>, mailer: Arc<dyn Mailer>, config: Config) -> Self {
        let registration = RegistrationService::new(
            store.clone(),
            mailer,
            RegistrationConfig::new(config.api.public_base_url.clone()),
        );

        Self {
            store,
            registration,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                        # Health check (public)
/// └── /v1/
///     ├── /auth/                     # Public
///     │   ├── POST /register
///     │   ├── GET  /confirm-email?token=
///     │   └── POST /login
///     ├── /users/                    # JWT
///     │   ├── GET    /me
///     │   ├── DELETE /me
///     │   └── PUT    /me/subscription
///     └── /tasks/                    # JWT
///         ├── POST   /
///         ├── GET    /
///         ├── DELETE /
///         └── DELETE /:id
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public, no auth required)
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/confirm-email", get(routes::auth::confirm_email))
        .route("/login", post(routes::auth::login));

    // Account routes (require JWT authentication)
    let user_routes = Router::new()
        .route(
            "/me",
            get(routes::users::get_me).delete(routes::users::delete_me),
        )
        .route("/me/subscription", put(routes::users::update_subscription))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Task routes (require JWT authentication)
    let task_routes = Router::new()
        .route(
            "/",
            post(routes::tasks::create_task)
                .get(routes::tasks::list_tasks)
                .delete(routes::tasks::clear_tasks),
        )
        .route("/:id", delete(routes::tasks::delete_task))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/tasks", task_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
