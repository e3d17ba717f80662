//! Sign-up and email confirmation
//!
//! An address moves through three states:
//!
//! ```text
//! Unregistered --request--> Pending(token) --request--> Pending(token') --confirm--> Verified
//! ```
//!
//! Each request issues a new token and invalidates the previous one. Confirming
//! redeems the current token exactly once and creates the user, unsubscribed.
//!
//! The confirmation mail is sent from a detached task. Its failure is logged
//! and never reaches the caller, who already holds the token.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use remindly_shared::mail::RecordingMailer;
//! use remindly_shared::registration::{RegistrationConfig, RegistrationService};
//! use remindly_shared::store::MemoryStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = RegistrationService::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(RecordingMailer::new()),
//!     RegistrationConfig::new("http://localhost:8080"),
//! );
//!
//! let token = service.request_registration("user@example.com", "Str0ng!Pass").await?;
//! let user = service.confirm_registration(&token).await?;
//! assert_eq!(user.email, "user@example.com");
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::auth::password::{self, PasswordError};
use crate::auth::token::{generate_confirmation_token, hash_confirmation_token};
use crate::mail::Mailer;
use crate::models::pending_registration::UpsertPendingRegistration;
use crate::models::user::User;
use crate::store::{Store, StoreError};

/// Subject of the confirmation mail
pub const CONFIRMATION_SUBJECT: &str = "Confirm your email";

/// Path the confirmation link points at
pub const CONFIRMATION_PATH: &str = "/v1/auth/confirm-email";

/// Coarse error classes, for mapping to transport status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The resource already exists
    AlreadyExists,
    /// The token does not match anything
    NotFound,
    /// The store failed
    StoreFailure,
    /// Anything else
    Internal,
}

/// Error type for the registration workflow
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    /// A verified user already owns the address
    #[error("Email {0} is already registered")]
    AlreadyRegistered(String),

    /// The token is unknown, already used, or superseded
    #[error("Invalid or expired confirmation token")]
    InvalidToken,

    /// Password hashing failed
    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    /// The store failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl RegistrationError {
    /// Classifies the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistrationError::AlreadyRegistered(_) => ErrorKind::AlreadyExists,
            RegistrationError::InvalidToken => ErrorKind::NotFound,
            RegistrationError::Store(_) => ErrorKind::StoreFailure,
            RegistrationError::Password(_) => ErrorKind::Internal,
        }
    }
}

/// Settings for the registration workflow
#[derive(Debug, Clone)]
pub struct RegistrationConfig {
    /// Externally reachable base URL of the API, without trailing slash
    pub public_base_url: String,
}

impl RegistrationConfig {
    /// Creates the config, dropping any trailing slash from the base URL
    pub fn new(public_base_url: impl Into<String>) -> Self {
        let public_base_url: String = public_base_url.into();
        Self {
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Link a user follows to confirm their address
    pub fn confirmation_link(&self, token: &str) -> String {
        format!("{}{}?token={}", self.public_base_url, CONFIRMATION_PATH, token)
    }
}

/// Trims and lowercases an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Body of the confirmation mail
pub fn confirmation_body(link: &str) -> String {
    format!(
        "Follow the link below to confirm your email address:\n{}\n\n\
         If you did not sign up, ignore this message.",
        link
    )
}

/// Registration workflow
#[derive(Clone)]
pub struct RegistrationService {
    store: Arc<dyn Store>,
    mailer: Arc<dyn Mailer>,
    config: RegistrationConfig,
}

impl RegistrationService {
    /// Creates the service
    pub fn new(store: Arc<dyn Store>, mailer: Arc<dyn Mailer>, config: RegistrationConfig) -> Self {
        Self {
            store,
            mailer,
            config,
        }
    }

    /// Starts (or restarts) a registration and returns the new token
    ///
    /// The password is hashed here, so the plaintext never reaches the store.
    /// A repeated request for the same address rotates the token and replaces
    /// the stored password hash.
    ///
    /// # Errors
    ///
    /// - `AlreadyRegistered` if a verified user owns the address
    /// - `Password` / `Store` on internal failures
    pub async fn request_registration(
        &self,
        email: &str,
        raw_password: &str,
    ) -> Result<String, RegistrationError> {
        let email = normalize_email(email);

        if self.store.user_exists(&email).await? {
            return Err(RegistrationError::AlreadyRegistered(email));
        }

        let password_hash = password::hash_password(raw_password)?;
        let token = generate_confirmation_token();

        // Refused if the address was verified since the check above
        let Some(pending) = self
            .store
            .upsert_pending_registration(UpsertPendingRegistration {
                email: email.clone(),
                password_hash,
                token_hash: hash_confirmation_token(&token),
            })
            .await?
        else {
            return Err(RegistrationError::AlreadyRegistered(email));
        };

        if pending.created_at != pending.updated_at {
            tracing::info!(email = %email, "Rotated confirmation token");
        } else {
            tracing::info!(email = %email, "Registration pending confirmation");
        }

        self.dispatch_confirmation(email, &token);

        Ok(token)
    }

    /// Redeems a token and creates the verified user
    ///
    /// # Errors
    ///
    /// - `InvalidToken` if the token is unknown, used, or superseded
    /// - `AlreadyRegistered` if the address was verified in the meantime
    /// - `Store` on store failures
    pub async fn confirm_registration(&self, token: &str) -> Result<User, RegistrationError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(RegistrationError::InvalidToken);
        }

        let token_hash = hash_confirmation_token(token);

        match self.store.redeem_pending(&token_hash).await {
            Ok(Some(user)) => {
                tracing::info!(email = %user.email, "Email confirmed, user created");
                Ok(user)
            }
            Ok(None) => {
                tracing::debug!("Confirmation token not found");
                Err(RegistrationError::InvalidToken)
            }
            Err(StoreError::Duplicate(_)) => {
                let email = self
                    .store
                    .find_pending_by_token(&token_hash)
                    .await?
                    .map(|p| p.email)
                    .unwrap_or_default();
                tracing::warn!(email = %email, "Confirmation for an already registered email");

                // The row can never be redeemed, drop it
                if let Err(e) = self.store.delete_pending(&token_hash).await {
                    tracing::error!(email = %email, error = %e, "Failed to discard stale registration");
                }

                Err(RegistrationError::AlreadyRegistered(email))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn dispatch_confirmation(&self, email: String, token: &str) {
        let mailer = self.mailer.clone();
        let body = confirmation_body(&self.config.confirmation_link(token));

        tokio::spawn(async move {
            if let Err(e) = mailer.send(CONFIRMATION_SUBJECT, &body, &email).await {
                tracing::error!(email = %email, error = %e, "Failed to send confirmation email");
            }
        });
    }
}
