//! Perplexity Provider
//!
//! Chat-completion adapter for Perplexity. Unlike OpenAI the whole prompt is
//! sent as a single user turn.

use async_trait::async_trait;
use serde_json::json;

use super::provider::{validate_api_key, FactCheckProvider};
use super::types::{LlmResult, ProviderConfig, ProviderType};
use crate::envelope::extract_content;
use crate::http_client::{build_http_client, send_for_body};

const PERPLEXITY_API_ROOT: &str = "https://api.perplexity.ai";

const MAX_TOKENS: u32 = 1500;

pub struct PerplexityProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl PerplexityProvider {
    pub fn new(config: ProviderConfig) -> LlmResult<Self> {
        let client = build_http_client(config.proxy.as_ref())?;
        Ok(Self { config, client })
    }

    pub fn with_client(config: ProviderConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn endpoint(&self) -> String {
        let root = self.config.base_url.as_deref().unwrap_or(PERPLEXITY_API_ROOT);
        format!("{}/chat/completions", root.trim_end_matches('/'))
    }

    fn build_request_body(&self, prompt: &str) -> serde_json::Value {
        json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": MAX_TOKENS,
        })
    }
}

#[async_trait]
impl FactCheckProvider for PerplexityProvider {
    fn provider(&self) -> ProviderType {
        ProviderType::Perplexity
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, prompt: &str, _claim: &str) -> LlmResult<String> {
        let api_key = validate_api_key(ProviderType::Perplexity, self.config.api_key.as_deref())?;

        tracing::debug!(model = %self.config.model, "sending Perplexity chat completion");
        let request = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&self.build_request_body(prompt));

        let text = send_for_body(ProviderType::Perplexity, request).await?;
        extract_content(ProviderType::Perplexity, &text)
    }
}
