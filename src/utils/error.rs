//! Error Handling
//!
//! Unified error types for the host.
//! Every variant renders as the plain message shown to the user.

use thiserror::Error;
use truth_detective_core::CoreError;
use truth_detective_llm::LlmError;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing text or key, placeholder key, bad settings
    #[error("{0}")]
    Validation(String),

    /// Invalid or unauthorized provider key
    #[error("{0}")]
    Auth(String),

    /// Provider throttling or provider-side quota
    #[error("{0}")]
    RateLimit(String),

    /// Provider rejected the request shape
    #[error("{0}")]
    InvalidRequest(String),

    /// Any other provider failure (non-2xx, transport, unreadable envelope)
    #[error("{0}")]
    Provider(String),

    /// Video metadata or transcript fetch failure
    #[error("{0}")]
    Transcript(String),

    /// Page agent unreachable after retries
    #[error("{0}")]
    Handshake(String),

    /// Local daily limit reached
    #[error("{0}")]
    QuotaExceeded(String),

    /// No usable key available
    #[error("{0}")]
    Configuration(String),

    /// Persisted storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn transcript(msg: impl Into<String>) -> Self {
        Self::Transcript(msg.into())
    }

    pub fn handshake(msg: impl Into<String>) -> Self {
        Self::Handshake(msg.into())
    }

    pub fn quota_exceeded(msg: impl Into<String>) -> Self {
        Self::QuotaExceeded(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        let message = err.to_string();
        match err {
            LlmError::Validation { .. } => Self::Validation(message),
            LlmError::AuthenticationFailed { .. } => Self::Auth(message),
            LlmError::RateLimited { .. } => Self::RateLimit(message),
            LlmError::InvalidRequest { .. } => Self::InvalidRequest(message),
            LlmError::UnsupportedProvider { .. } => Self::Validation(message),
            LlmError::Provider { .. }
            | LlmError::Network { .. }
            | LlmError::MalformedResponse { .. } => Self::Provider(message),
        }
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Config(msg) => Self::Configuration(msg),
        }
    }
}

/// Convert AppError to the plain message delivered to the extension
impl From<AppError> for String {
    fn from(err: AppError) -> String {
        err.to_string()
    }
}
