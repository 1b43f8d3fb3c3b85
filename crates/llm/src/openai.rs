//! OpenAI Provider
//!
//! Chat-completion adapter for OpenAI's API. The fact-check prompt goes in as
//! the system turn and the claim as the user turn.

use async_trait::async_trait;
use serde_json::json;

use super::provider::{validate_api_key, FactCheckProvider};
use super::types::{LlmResult, ProviderConfig, ProviderType};
use crate::envelope::extract_content;
use crate::http_client::{build_http_client, send_for_body};
use crate::prompt::claim_message;

/// Default OpenAI API root
const OPENAI_API_ROOT: &str = "https://api.openai.com/v1";

const TEMPERATURE: f64 = 0.2;

/// OpenAI provider
pub struct OpenAIProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider with its own HTTP client.
    pub fn new(config: ProviderConfig) -> LlmResult<Self> {
        let client = build_http_client(config.proxy.as_ref())?;
        Ok(Self { config, client })
    }

    /// Create a provider that reuses an existing client.
    pub fn with_client(config: ProviderConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn endpoint(&self) -> String {
        let root = self.config.base_url.as_deref().unwrap_or(OPENAI_API_ROOT);
        format!("{}/chat/completions", root.trim_end_matches('/'))
    }

    fn build_request_body(&self, prompt: &str, claim: &str) -> serde_json::Value {
        json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": prompt },
                { "role": "user", "content": claim_message(claim) }
            ],
            "temperature": TEMPERATURE,
        })
    }
}

#[async_trait]
impl FactCheckProvider for OpenAIProvider {
    fn provider(&self) -> ProviderType {
        ProviderType::OpenAI
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, prompt: &str, claim: &str) -> LlmResult<String> {
        let api_key = validate_api_key(ProviderType::OpenAI, self.config.api_key.as_deref())?;
        let body = self.build_request_body(prompt, claim);

        tracing::debug!(model = %self.config.model, "sending OpenAI chat completion");
        let request = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body);

        let text = send_for_body(ProviderType::OpenAI, request).await?;
        extract_content(ProviderType::OpenAI, &text)
    }
}
