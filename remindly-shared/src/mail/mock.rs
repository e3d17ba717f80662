//! Recording mailer for tests and demos
//!
//! Nothing leaves the process. Messages are appended to an in-memory outbox
//! that tests inspect afterwards. Recipients registered with
//! [`RecordingMailer::fail_for`] get a transport error instead, and
//! [`RecordingMailer::with_delay`] makes every send take a while, which is
//! how cancellation of in-flight sends is exercised.
//!
//! # Example
//!
//! ```
//! use remindly_shared::mail::{Mailer, RecordingMailer};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mailer = RecordingMailer::new();
//! mailer.send("Hello", "Body", "user@example.com").await?;
//!
//! assert_eq!(mailer.sent().await.len(), 1);
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{MailError, Mailer};

/// A message captured by [`RecordingMailer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    /// Recipient
    pub to: String,

    /// Subject line
    pub subject: String,

    /// Plain-text body
    pub body: String,
}

/// Mailer that records instead of sending
#[derive(Debug, Default)]
pub struct RecordingMailer {
    outbox: Mutex<Vec<SentMail>>,
    failing: Mutex<HashSet<String>>,
    delay: Option<Duration>,
}

impl RecordingMailer {
    /// Creates a mailer with an empty outbox
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mailer whose sends each take `delay`
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Makes every later send to `recipient` fail
    pub async fn fail_for(&self, recipient: impl Into<String>) {
        self.failing.lock().await.insert(recipient.into());
    }

    /// Everything sent so far, in send order
    pub async fn sent(&self) -> Vec<SentMail> {
        self.outbox.lock().await.clone()
    }

    /// Messages sent to one recipient, in send order
    pub async fn sent_to(&self, recipient: &str) -> Vec<SentMail> {
        self.outbox
            .lock()
            .await
            .iter()
            .filter(|m| m.to == recipient)
            .cloned()
            .collect()
    }

    /// Empties the outbox
    pub async fn clear(&self) {
        self.outbox.lock().await.clear();
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, subject: &str, body: &str, to: &str) -> Result<(), MailError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.lock().await.contains(to) {
            return Err(MailError::Transport(format!(
                "simulated delivery failure for {}",
                to
            )));
        }

        self.outbox.lock().await.push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });

        Ok(())
    }
}
