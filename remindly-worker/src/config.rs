//! Worker configuration
//!
//! # Environment Variables
//!
//! - `DATABASE_URL`: PostgreSQL connection URL (required)
//! - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
//! - `REMINDER_INTERVAL_SECS`: pause between reminder cycles (default: 86400)
//! - `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `MAIL_FROM`:
//!   see [`SmtpConfig`]

use std::time::Duration;

use remindly_shared::db::pool::DatabaseConfig;
use remindly_shared::mail::SmtpConfig;

/// Default pause between cycles: one day
pub const DEFAULT_REMINDER_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Worker configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Database pool settings
    pub database: DatabaseConfig,

    /// SMTP relay settings
    pub smtp: SmtpConfig,

    /// Pause between reminder cycles
    pub reminder_interval: Duration,
}

impl WorkerConfig {
    /// Loads configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let reminder_interval = parse_interval(std::env::var("REMINDER_INTERVAL_SECS").ok())?;

        Ok(Self {
            database: DatabaseConfig::from_env()?,
            smtp: SmtpConfig::from_env()?,
            reminder_interval,
        })
    }
}

fn parse_interval(raw: Option<String>) -> anyhow::Result<Duration> {
    let secs = match raw {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|e| anyhow::anyhow!("Invalid REMINDER_INTERVAL_SECS: {}", e))?,
        None => DEFAULT_REMINDER_INTERVAL_SECS,
    };

    if secs == 0 {
        anyhow::bail!("REMINDER_INTERVAL_SECS must be greater than 0");
    }

    Ok(Duration::from_secs(secs))
}
