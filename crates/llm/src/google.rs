//! Google AI Provider
//!
//! `generateContent` adapter for the Gemini API. Authentication travels in the
//! `key` query parameter rather than a header.

use async_trait::async_trait;
use serde_json::json;

use super::provider::{validate_api_key, FactCheckProvider};
use super::types::{LlmResult, ProviderConfig, ProviderType};
use crate::envelope::extract_content;
use crate::http_client::{build_http_client, send_for_body};

/// Default Gemini API root
const GOOGLE_API_ROOT: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GoogleProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl GoogleProvider {
    pub fn new(config: ProviderConfig) -> LlmResult<Self> {
        let client = build_http_client(config.proxy.as_ref())?;
        Ok(Self { config, client })
    }

    pub fn with_client(config: ProviderConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn endpoint(&self) -> String {
        let root = self.config.base_url.as_deref().unwrap_or(GOOGLE_API_ROOT);
        format!(
            "{}/models/{}:generateContent",
            root.trim_end_matches('/'),
            self.config.model
        )
    }

    fn build_request_body(&self, prompt: &str) -> serde_json::Value {
        json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        })
    }
}

#[async_trait]
impl FactCheckProvider for GoogleProvider {
    fn provider(&self) -> ProviderType {
        ProviderType::Google
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    /// The prompt already embeds the claim, so `_claim` is unused here.
    async fn complete(&self, prompt: &str, _claim: &str) -> LlmResult<String> {
        let api_key = validate_api_key(ProviderType::Google, self.config.api_key.as_deref())?;

        tracing::debug!(model = %self.config.model, "sending Gemini generateContent");
        let request = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key.as_str())])
            .json(&self.build_request_body(prompt));

        let text = send_for_body(ProviderType::Google, request).await?;
        extract_content(ProviderType::Google, &text)
    }
}
