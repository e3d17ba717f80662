//! # Remindly API Server Library
//!
//! HTTP surface of Remindly: sign-up with email confirmation, login, and
//! per-user to-do lists.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: JWT authentication
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
