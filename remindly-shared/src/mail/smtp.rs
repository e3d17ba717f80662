//! SMTP delivery via lettre
//!
//! # Environment Variables
//!
//! - `SMTP_HOST`: relay host (required)
//! - `SMTP_PORT`: relay port (default: 587)
//! - `SMTP_USERNAME`: login (required)
//! - `SMTP_PASSWORD`: password (required)
//! - `MAIL_FROM`: sender mailbox (default: the username)

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{MailError, Mailer};

/// SMTP relay settings
#[derive(Clone)]
pub struct SmtpConfig {
    /// Relay host name
    pub host: String,

    /// Relay port
    pub port: u16,

    /// Login
    pub username: String,

    /// Password
    pub password: String,

    /// Sender mailbox, e.g. `Remindly <noreply@example.com>`
    pub from: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("from", &self.from)
            .finish()
    }
}

impl SmtpConfig {
    /// Default submission port
    pub const DEFAULT_PORT: u16 = 587;

    /// Loads the relay settings from the environment
    pub fn from_env() -> anyhow::Result<Self> {
        let host = std::env::var("SMTP_HOST")
            .map_err(|_| anyhow::anyhow!("SMTP_HOST environment variable not set"))?;

        let port = std::env::var("SMTP_PORT")
            .unwrap_or_else(|_| Self::DEFAULT_PORT.to_string())
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid SMTP_PORT: {}", e))?;

        let username = std::env::var("SMTP_USERNAME")
            .map_err(|_| anyhow::anyhow!("SMTP_USERNAME environment variable not set"))?;

        let password = std::env::var("SMTP_PASSWORD")
            .map_err(|_| anyhow::anyhow!("SMTP_PASSWORD environment variable not set"))?;

        let from = std::env::var("MAIL_FROM").unwrap_or_else(|_| username.clone());

        Ok(Self {
            host,
            port,
            username,
            password,
            from,
        })
    }
}

/// Mailer that submits messages to an SMTP relay
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Builds the transport; no connection is made until the first send
    ///
    /// # Errors
    ///
    /// Fails if the sender address does not parse or the relay host is invalid.
    pub fn new(config: SmtpConfig) -> Result<Self, MailError> {
        let from = parse_mailbox(&config.from)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| MailError::Transport(format!("SMTP relay error: {}", e)))?
            .port(config.port)
            .credentials(Credentials::new(config.username, config.password))
            .build();

        Ok(Self { transport, from })
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse().map_err(|e: lettre::address::AddressError| {
        MailError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        }
    })
}

/// Assembles a UTF-8 plain-text message
fn build_message(from: Mailbox, to: Mailbox, subject: &str, body: &str) -> Result<Message, MailError> {
    Message::builder()
        .from(from)
        .to(to)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .map_err(|e| MailError::Build(e.to_string()))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, subject: &str, body: &str, to: &str) -> Result<(), MailError> {
        let message = build_message(self.from.clone(), parse_mailbox(to)?, subject, body)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        tracing::debug!(to = %to, subject = %subject, "Mail delivered to relay");

        Ok(())
    }
}
