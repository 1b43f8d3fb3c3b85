//! Core Error Types
//!
//! Foundational error type shared across the Truth Detective workspace.
//!
//! The host crate extends this with the user-facing taxonomy (quota, handshake,
//! transcript, provider failures) in its own `AppError`.

use thiserror::Error;

/// Core error type for the Truth Detective workspace.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for core errors
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<CoreError> for String {
    fn from(err: CoreError) -> String {
        err.to_string()
    }
}
