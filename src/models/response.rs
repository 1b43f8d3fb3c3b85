//! Response Types
//!
//! Reply bodies sent back to the extension. Failures are always the plain
//! `{ "error": "<message>" }` object the popup and page agent understand.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::error::AppResult;

/// Generic error reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({ "error": self.error })
    }
}

/// `{ "success": true }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Daily quota snapshot as shown in the popup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitInfo {
    pub can_make_request: bool,
    pub remaining_requests: u64,
    /// Requests already used today
    pub total_requests: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeTierStatus {
    pub available: bool,
    pub provider: String,
    pub model: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReloadStatus {
    pub success: bool,
    pub available: bool,
}

/// Render a command result as the JSON reply body.
pub fn respond<T: Serialize>(result: AppResult<T>) -> Value {
    match result.and_then(|data| serde_json::to_value(data).map_err(Into::into)) {
        Ok(value) => value,
        Err(e) => ErrorResponse::new(e.to_string()).to_value(),
    }
}
