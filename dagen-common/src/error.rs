//! Common error types for DAGen

use thiserror::Error;

/// Common result type for DAGen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the DAGen crates
#[derive(Error, Debug)]
pub enum Error {
    /// Store operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed advice record, timestamp or CSV row
    #[error("Parse error: {0}")]
    Parse(String),

    /// Internal service error
    #[error("Internal error: {0}")]
    Internal(String),
}
