//! Error types for the drive.

use thiserror::Error;

/// Common error type for the drive.
#[derive(Error, Debug)]
pub enum DriveError {
    /// Object store error.
    ///
    /// Wraps any failure reported by the storage backend (network, SDK,
    /// service errors). Missing objects are reported as `None` by the
    /// store, not through this variant.
    #[error("storage error: {0}")]
    Storage(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error (bad login token, bad session).
    #[error("authentication error: {0}")]
    Auth(String),

    /// A logical path that would leave the tenant root or is malformed.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Template error.
    #[error("template error: {0}")]
    Template(#[from] crate::template::TemplateError),

    /// Document conversion error.
    #[error("conversion error: {0}")]
    Conversion(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for drive operations.
pub type Result<T> = std::result::Result<T, DriveError>;
