/// Common test utilities for integration tests
///
/// Builds the full router on top of the in-memory store and the recording
/// mailer, so the tests need neither PostgreSQL nor an SMTP relay:
/// - Request helpers returning status and JSON body
/// - Reading confirmation tokens back out of the captured mail
/// - One-call creation of a verified, logged-in user

use axum::body::Body;
use axum::http::{Request, StatusCode};
use remindly_api::app::{build_router, AppState};
use remindly_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig};
use remindly_shared::mail::RecordingMailer;
use remindly_shared::store::MemoryStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::Service as _;

/// Password that satisfies the strength rules
pub const PASSWORD: &str = "Str0ng!Pass";

/// Base URL placed in confirmation links
pub const PUBLIC_BASE_URL: &str = "http://remindly.test";

/// Test context containing all necessary resources
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
    pub app: axum::Router,
    pub config: Config,
}

impl TestContext {
    /// Creates a new test context with an empty store and outbox
    pub fn new() -> Self {
        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
                public_base_url: PUBLIC_BASE_URL.to_string(),
            },
            database: DatabaseConfig {
                url: "postgresql://unused/remindly".to_string(),
                max_connections: 1,
            },
            jwt: JwtConfig {
                secret: "integration-test-secret-at-least-32-bytes".to_string(),
                expiration_hours: 1,
            },
        };

        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(RecordingMailer::new());

        let state = AppState::new(store.clone(), mailer.clone(), config.clone());
        let app = build_router(state);

        TestContext {
            store,
            mailer,
            app,
            config,
        }
    }

    /// Sends a request and returns the status with the parsed JSON body
    ///
    /// An empty body comes back as `Value::Null`.
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }

    /// Starts a registration
    pub async fn register(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            "POST",
            "/v1/auth/register",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Follows a confirmation link
    pub async fn confirm(&self, token: &str) -> (StatusCode, Value) {
        self.send(
            "GET",
            &format!("/v1/auth/confirm-email?token={}", token),
            None,
            None,
        )
        .await
    }

    /// Logs in, returning status and body
    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            "POST",
            "/v1/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Waits for the `count`-th mail to `email` and returns the token in it
    pub async fn confirmation_token(&self, email: &str, count: usize) -> String {
        let mailer = self.mailer.clone();
        let recipient = email.to_string();
        wait_for(
            move || {
                let mailer = mailer.clone();
                let recipient = recipient.clone();
                async move { mailer.sent_to(&recipient).await.len() >= count }
            },
            5,
        )
        .await
        .unwrap();

        let mail = self.mailer.sent_to(email).await[count - 1].clone();
        extract_token(&mail.body)
    }

    /// Registers, confirms and logs in; returns the access token
    pub async fn verified_user(&self, email: &str) -> String {
        let (status, _) = self.register(email, PASSWORD).await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let token = self.confirmation_token(email, 1).await;
        let (status, _) = self.confirm(&token).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self.login(email, PASSWORD).await;
        assert_eq!(status, StatusCode::OK);
        body["access_token"].as_str().unwrap().to_string()
    }
}

/// Pulls the token out of a confirmation mail body
pub fn extract_token(body: &str) -> String {
    let start = body.find("token=").expect("mail contains no link") + "token=".len();
    body[start..]
        .chars()
        .take_while(|c| c.is_ascii_hexdigit())
        .collect()
}

/// Helper to wait for condition with timeout
pub async fn wait_for<F, Fut>(condition: F, timeout_secs: u64) -> anyhow::Result<()>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_secs(timeout_secs);

    loop {
        if condition().await {
            return Ok(());
        }

        if start.elapsed() > timeout {
            anyhow::bail!("Condition not met within {} seconds", timeout_secs);
        }

        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
    }
}
