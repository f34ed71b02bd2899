//! Common error types for songlib

use thiserror::Error;

use crate::release_date::ReleaseDateError;

/// Common result type for songlib operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the service crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A record with the same identifying content already exists
    #[error("Duplicate: {0}")]
    Duplicate(String),
}

impl From<ReleaseDateError> for Error {
    fn from(err: ReleaseDateError) -> Self {
        Error::InvalidInput(err.to_string())
    }
}
