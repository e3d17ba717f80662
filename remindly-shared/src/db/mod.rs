//! Database layer for Remindly
//!
//! - `pool`: PostgreSQL connection pool with a startup health check
//! - `migrations`: embedded schema migrations
//!
//! Row types and their queries are in the `models` module.

pub mod migrations;
pub mod pool;
