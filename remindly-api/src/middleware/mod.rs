//! Middleware for the API server
//!
//! - `auth`: JWT bearer authentication

pub mod auth;
