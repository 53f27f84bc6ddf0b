//! # sqlx-sqlite-conn-mgr
//!
//! Connection pools for the paged query engine, wrapping SQLx for SQLite.
//!
//! ## Core Types
//!
//! - **[`SqliteDatabase`]**: Database handle with separate read and write connection pools
//! - **[`SqliteDatabaseConfig`]**: Pool sizing and timeout settings
//! - **[`WriteGuard`]**: Exclusive handle on the single writer connection
//! - **[`Error`]**: Error type for pool operations
//!
//! ## Architecture
//!
//! - **Dual pools**: Read pool (default 6 connections) and write pool (exactly 1 connection)
//! - **Lazy WAL mode**: Write-Ahead Logging is switched on by the first writer
//! - **Serialized writes**: Holding a [`WriteGuard`] blocks every other writer
//! - **Concurrent reads**: Paged reads and their count queries run on the read pool

mod config;
mod database;
mod error;
mod write_guard;

pub use config::SqliteDatabaseConfig;
pub use database::SqliteDatabase;
pub use error::{Error, Result};
pub use write_guard::WriteGuard;
