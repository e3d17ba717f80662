//! API route handlers
//!
//! Handlers are organized by resource:
//!
//! - `health`: Health check endpoint
//! - `auth`: Registration, email confirmation and login
//! - `users`: The caller's account and reminder subscription
//! - `tasks`: The caller's to-do list

pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;
