//! Reminder mail rendering
//!
//! A user with tasks gets a numbered digest:
//!
//! ```text
//! Subject: Your to-do list
//!
//! Here is your to-do list:
//! 1. Water the plants
//! 2. Call the bank
//! ```
//!
//! A user with an empty list is unsubscribed and told so instead.

use remindly_shared::models::task::Task;

/// Subject of the digest mail
pub const DIGEST_SUBJECT: &str = "Your to-do list";

/// First line of the digest body
pub const DIGEST_HEADER: &str = "Here is your to-do list:";

/// Subject of the notice sent when a user is unsubscribed
pub const UNSUBSCRIBED_SUBJECT: &str = "You were unsubscribed from the mailing";

/// Body of the unsubscribe notice
pub const UNSUBSCRIBED_BODY: &str =
    "Your to-do list is empty. Add new tasks to your list and subscribe to the mailing.";

/// What a reminder does for one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reminder {
    /// Mail the task list
    Digest { body: String },

    /// Unsubscribe the user, then mail the notice
    Unsubscribe,
}

impl Reminder {
    /// Picks and renders the reminder for a task list in creation order
    pub fn for_tasks(tasks: &[Task]) -> Self {
        if tasks.is_empty() {
            return Reminder::Unsubscribe;
        }

        let mut body = String::from(DIGEST_HEADER);
        for (i, task) in tasks.iter().enumerate() {
            body.push_str(&format!("\n{}. {}", i + 1, task.text));
        }

        Reminder::Digest { body }
    }

    /// Subject line
    pub fn subject(&self) -> &'static str {
        match self {
            Reminder::Digest { .. } => DIGEST_SUBJECT,
            Reminder::Unsubscribe => UNSUBSCRIBED_SUBJECT,
        }
    }

    /// Plain-text body
    pub fn body(&self) -> &str {
        match self {
            Reminder::Digest { body } => body,
            Reminder::Unsubscribe => UNSUBSCRIBED_BODY,
        }
    }
}
