//! # Remindly Worker Library
//!
//! Periodic reminder mailing for subscribed users.
//!
//! ## Modules
//!
//! - `config`: environment configuration for the worker binary
//! - `digest`: renders a user's task list into a reminder mail
//! - `scheduler`: the reminder loop and its per-cycle fan-out

pub mod config;
pub mod digest;
pub mod scheduler;
