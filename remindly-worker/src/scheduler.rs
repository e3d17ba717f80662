//! Reminder scheduler
//!
//! Every interval the scheduler takes a snapshot of subscribed users and mails
//! each of them their task list. Users whose list is empty are unsubscribed
//! and told so.
//!
//! # Architecture
//!
//! ```text
//! ReminderScheduler::run
//!   └─> loop
//!         ├─> run_cycle
//!         │     ├─> Store: list_subscribed_emails (snapshot)
//!         │     └─> JoinSet: one task per email
//!         │           ├─> Store: get_tasks
//!         │           ├─> Store: set_subscribed(false)   (empty list only)
//!         │           └─> Mailer: send
//!         └─> sleep(interval) or shutdown
//! ```
//!
//! # Failure handling
//!
//! A failed snapshot ends the run with [`ReminderError::Snapshot`]. Failures
//! for a single user are logged, counted in the [`CycleReport`] and never
//! affect other users. Nothing is retried within a cycle.
//!
//! # Shutdown
//!
//! Cancelling the [`CancellationToken`] from [`ReminderScheduler::shutdown_token`]
//! stops the loop while it sleeps, and aborts the sends of a cycle in flight.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use remindly_shared::mail::RecordingMailer;
//! use remindly_shared::store::MemoryStore;
//! use remindly_worker::scheduler::ReminderScheduler;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let scheduler = ReminderScheduler::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(RecordingMailer::new()),
//!     Duration::from_secs(3600),
//! );
//!
//! let shutdown = scheduler.shutdown_token();
//! tokio::spawn(async move {
//!     tokio::signal::ctrl_c().await.ok();
//!     shutdown.cancel();
//! });
//!
//! scheduler.run().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use remindly_shared::mail::Mailer;
use remindly_shared::store::{Store, StoreError};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::digest::Reminder;

/// Error type for the reminder loop
#[derive(Debug, thiserror::Error)]
pub enum ReminderError {
    /// The subscribed-user snapshot could not be read
    #[error("Failed to list subscribed users: {0}")]
    Snapshot(#[source] StoreError),

    /// Shutdown interrupted the cycle
    #[error("Reminder cycle cancelled")]
    Cancelled,
}

/// Outcome of one reminder cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Users in the snapshot
    pub recipients: usize,

    /// Mails handed to the mailer successfully (digests and notices)
    pub delivered: usize,

    /// Users unsubscribed for having an empty list
    pub unsubscribed: usize,

    /// Users for whom some step failed
    pub failed: usize,
}

/// What happened for one user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Delivered,
    Unsubscribed { notified: bool },
    Failed,
}

impl CycleReport {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Delivered => self.delivered += 1,
            Outcome::Unsubscribed { notified: true } => {
                self.unsubscribed += 1;
                self.delivered += 1;
            }
            Outcome::Unsubscribed { notified: false } => {
                self.unsubscribed += 1;
                self.failed += 1;
            }
            Outcome::Failed => self.failed += 1,
        }
    }
}

/// Periodic reminder mailing
pub struct ReminderScheduler {
    store: Arc<dyn Store>,
    mailer: Arc<dyn Mailer>,
    interval: Duration,
    shutdown_token: CancellationToken,
}

impl ReminderScheduler {
    /// Creates a scheduler that pauses `interval` between cycles
    pub fn new(store: Arc<dyn Store>, mailer: Arc<dyn Mailer>, interval: Duration) -> Self {
        Self {
            store,
            mailer,
            interval,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Gets shutdown token
    ///
    /// Used to signal graceful shutdown from external handlers.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Runs cycles until shutdown
    ///
    /// The first cycle starts immediately. Consumes the scheduler, so a
    /// stopped scheduler cannot be restarted.
    ///
    /// # Errors
    ///
    /// Returns [`ReminderError::Snapshot`] if a cycle cannot read the list of
    /// subscribed users. Shutdown is not an error.
    pub async fn run(self) -> Result<(), ReminderError> {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Reminder scheduler starting"
        );

        loop {
            if self.shutdown_token.is_cancelled() {
                break;
            }

            match self.run_cycle().await {
                Ok(report) => {
                    tracing::info!(
                        recipients = report.recipients,
                        delivered = report.delivered,
                        unsubscribed = report.unsubscribed,
                        failed = report.failed,
                        "Reminder cycle complete"
                    );
                }
                Err(ReminderError::Cancelled) => break,
                Err(e) => {
                    tracing::error!(error = %e, "Reminder cycle failed, stopping scheduler");
                    return Err(e);
                }
            }

            tokio::select! {
                _ = self.shutdown_token.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        tracing::info!("Reminder scheduler shut down");
        Ok(())
    }

    /// Runs one cycle: snapshot, fan out, wait for every user
    ///
    /// # Errors
    ///
    /// - [`ReminderError::Snapshot`] if the subscribed users cannot be listed
    /// - [`ReminderError::Cancelled`] if shutdown arrives mid-cycle; unfinished
    ///   sends are aborted
    pub async fn run_cycle(&self) -> Result<CycleReport, ReminderError> {
        let emails = self
            .store
            .list_subscribed_emails()
            .await
            .map_err(ReminderError::Snapshot)?;

        let mut report = CycleReport {
            recipients: emails.len(),
            ..CycleReport::default()
        };

        tracing::debug!(recipients = report.recipients, "Starting reminder cycle");

        let mut sends = JoinSet::new();
        for email in emails {
            sends.spawn(remind_user(self.store.clone(), self.mailer.clone(), email));
        }

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_token.cancelled() => {
                    let pending = sends.len();
                    sends.abort_all();
                    tracing::warn!(pending, "Shutdown during reminder cycle, aborting sends");
                    return Err(ReminderError::Cancelled);
                }
                joined = sends.join_next() => match joined {
                    Some(Ok(outcome)) => report.record(outcome),
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "Reminder task panicked");
                        report.failed += 1;
                    }
                    None => break,
                },
            }
        }

        Ok(report)
    }
}

/// Sends one user their reminder
async fn remind_user(store: Arc<dyn Store>, mailer: Arc<dyn Mailer>, email: String) -> Outcome {
    let tasks = match store.get_tasks(&email).await {
        Ok(tasks) => tasks,
        Err(e) => {
            tracing::error!(email = %email, error = %e, "Failed to load tasks for reminder");
            return Outcome::Failed;
        }
    };

    let reminder = Reminder::for_tasks(&tasks);

    if reminder == Reminder::Unsubscribe {
        if let Err(e) = store.set_subscribed(&email, false).await {
            tracing::error!(email = %email, error = %e, "Failed to unsubscribe user with empty list");
            return Outcome::Failed;
        }
        tracing::info!(email = %email, "Unsubscribed user with empty list");
    }

    let sent = match mailer.send(reminder.subject(), reminder.body(), &email).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(email = %email, error = %e, "Failed to send reminder");
            false
        }
    };

    match (reminder, sent) {
        (Reminder::Unsubscribe, notified) => Outcome::Unsubscribed { notified },
        (Reminder::Digest { .. }, true) => Outcome::Delivered,
        (Reminder::Digest { .. }, false) => Outcome::Failed,
    }
}
