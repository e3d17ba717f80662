//! # Remindly Shared Library
//!
//! Types and business logic shared by the Remindly API server and the
//! reminder worker.
//!
//! ## Module Organization
//!
//! - `db`: connection pool and migrations
//! - `models`: database models and their SQL
//! - `store`: storage traits with PostgreSQL and in-memory implementations
//! - `auth`: password hashing, confirmation tokens, JWT
//! - `mail`: outgoing mail
//! - `registration`: sign-up and email confirmation workflow

pub mod auth;
pub mod db;
pub mod mail;
pub mod models;
pub mod registration;
pub mod store;

/// Current version of the Remindly shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
