//! Common error types for farmlog

use thiserror::Error;

/// Common result type for farmlog operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across farmlog services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested record not found or no longer active
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unexpected runtime failure, e.g. a second subscriber install
    #[error("Internal error: {0}")]
    Internal(String),
}
