//! Error types for sqlx-sqlite-conn-mgr

use std::path::PathBuf;

use thiserror::Error;

/// Errors that may occur while managing SQLite connection pools
#[derive(Error, Debug)]
pub enum Error {
   /// IO error when creating or removing database files.
   #[error("IO error: {0}")]
   Io(#[from] std::io::Error),

   /// Error from the sqlx library while opening or using a pool.
   #[error("Sqlx error: {0}")]
   Sqlx(#[from] sqlx::Error),

   /// Database has been closed and cannot be used
   #[error("Database has been closed")]
   DatabaseClosed,

   /// The database path cannot be used to open a connection.
   #[error("Invalid database path: {}", .0.display())]
   InvalidPath(PathBuf),
}

/// A type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
