//! Authentication primitives
//!
//! - [`password`]: Argon2id password hashing and strength checks
//! - [`token`]: email confirmation tokens and their stored digests
//! - [`jwt`]: access tokens handed out at login

pub mod jwt;
pub mod password;
pub mod token;
