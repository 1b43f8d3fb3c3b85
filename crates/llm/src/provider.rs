//! Fact-Check Provider Trait
//!
//! Common interface for the three completion providers plus the shared
//! pre-flight checks and HTTP status mapping.

use async_trait::async_trait;

use super::types::{LlmError, LlmResult, ProviderType};

/// Substrings that mark an API key as an unedited placeholder.
const PLACEHOLDER_MARKERS: &[&str] = &["<YOUR_", "YOUR_"];
const PLACEHOLDER_LITERAL: &str = "your-api-key-here";

/// Trait that all fact-check providers implement.
#[async_trait]
pub trait FactCheckProvider: Send + Sync {
    /// Returns the provider type for identification.
    fn provider(&self) -> ProviderType;

    /// Returns the model the provider was configured with.
    fn model(&self) -> &str;

    /// Send the fact-check prompt and return the model's raw text payload,
    /// unparsed.
    ///
    /// `claim` is passed separately because chat-style providers repeat it in
    /// the user turn.
    async fn complete(&self, prompt: &str, claim: &str) -> LlmResult<String>;
}

/// Helper function to create an error for a missing API key
pub fn missing_api_key_error() -> LlmError {
    LlmError::validation("API key is required")
}

/// Reject empty claims before any network call.
pub fn validate_claim(text: &str) -> LlmResult<()> {
    if text.trim().is_empty() {
        return Err(LlmError::validation("No text provided for fact-checking"));
    }
    Ok(())
}

/// Reject empty or placeholder keys; warn on keys whose shape looks wrong for
/// the provider.
pub fn validate_api_key(provider: ProviderType, api_key: Option<&str>) -> LlmResult<String> {
    let key = api_key
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(missing_api_key_error)?;

    if is_placeholder_key(key) {
        return Err(LlmError::validation(
            "Please replace the placeholder API key with a valid API key",
        ));
    }

    match provider {
        ProviderType::OpenAI if !key.starts_with("sk-") => {
            tracing::warn!("API key does not start with \"sk-\"; it may not be a valid OpenAI key");
        }
        ProviderType::Google if !key.starts_with("AIza") => {
            tracing::warn!("API key does not start with \"AIza\"; it may not be a valid Google AI key");
        }
        _ => {}
    }

    Ok(key.to_string())
}

pub fn is_placeholder_key(key: &str) -> bool {
    key == PLACEHOLDER_LITERAL || PLACEHOLDER_MARKERS.iter().any(|m| key.contains(m))
}

/// Map a non-success HTTP status to the provider error taxonomy.
pub fn parse_http_error(provider: ProviderType, status: u16, body: &str) -> LlmError {
    let name = provider.display_name();
    match status {
        401 => LlmError::AuthenticationFailed {
            message: format!("{} API key is invalid. Please check your API key.", name),
        },
        403 if provider == ProviderType::Google && body.to_lowercase().contains("quota") => {
            LlmError::RateLimited {
                message: format!(
                    "{} API quota exceeded. Please try again later or use a different API key.",
                    name
                ),
            }
        }
        403 => LlmError::AuthenticationFailed {
            message: format!(
                "{} API key is invalid or not authorized. Please check your API key.",
                name
            ),
        },
        429 => LlmError::RateLimited {
            message: format!(
                "{} API rate limit exceeded. Please wait a moment and try again.",
                name
            ),
        },
        400 => LlmError::InvalidRequest {
            message: format!(
                "Invalid request to {} API. Please check the input text and try again.",
                name
            ),
        },
        _ => LlmError::Provider {
            provider: name,
            status,
            body: body.to_string(),
        },
    }
}
