//! Error types for passgen

use thiserror::Error;

/// Main error type for password operations
#[derive(Error, Debug)]
pub enum PassgenError {
    /// A password option failed validation
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// The identifier contains forbidden characters or path segments
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Generation or migration lock acquisition exceeded its time bound
    #[error("Password generation timed out for '{0}'")]
    Timeout(String),

    /// Key/value backend operation failed
    #[error("Backend error: {0}")]
    Backend(String),

    /// Configuration file could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PassgenError {
    /// True for errors raised before any side effect took place
    pub fn is_validation(&self) -> bool {
        matches!(self, PassgenError::InvalidOption(_) | PassgenError::InvalidIdentifier(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, PassgenError::Timeout(_))
    }

    pub fn is_backend(&self) -> bool {
        matches!(self, PassgenError::Backend(_))
    }
}

impl From<rusqlite::Error> for PassgenError {
    fn from(err: rusqlite::Error) -> Self {
        PassgenError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for PassgenError {
    fn from(err: serde_json::Error) -> Self {
        PassgenError::Backend(err.to_string())
    }
}

/// Result type alias for password operations
pub type Result<T> = std::result::Result<T, PassgenError>;
