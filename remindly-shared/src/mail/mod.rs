//! Outgoing mail
//!
//! Everything that sends email (confirmation links, reminder digests) goes
//! through the [`Mailer`] trait. Delivery is best effort: callers log a
//! [`MailError`] and move on.
//!
//! # Implementations
//!
//! - [`SmtpMailer`]: authenticated SMTP relay over STARTTLS
//! - [`RecordingMailer`]: keeps messages in memory, for tests and demos

pub mod mock;
pub mod smtp;

pub use mock::{RecordingMailer, SentMail};
pub use smtp::{SmtpConfig, SmtpMailer};

use async_trait::async_trait;

/// Error type for mail delivery
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// Sender or recipient is not a valid mailbox
    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    /// The message could not be assembled
    #[error("Failed to build message: {0}")]
    Build(String),

    /// The relay refused or the connection failed
    #[error("Failed to deliver message: {0}")]
    Transport(String),
}

/// Sends plain-text mail
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends one message to one recipient
    async fn send(&self, subject: &str, body: &str, to: &str) -> Result<(), MailError>;
}
