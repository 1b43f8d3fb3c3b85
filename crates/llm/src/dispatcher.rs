//! Provider Dispatcher
//!
//! Turns a [`FactCheckRequest`] into one provider call and returns the raw
//! text payload. The Coordinator only depends on the [`FactCheckDispatcher`]
//! trait so tests can count or refuse dispatches without a network.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use truth_detective_core::ProxyConfig;

use crate::google::GoogleProvider;
use crate::http_client::build_http_client;
use crate::openai::OpenAIProvider;
use crate::perplexity::PerplexityProvider;
use crate::prompt::build_fact_check_prompt;
use crate::provider::{validate_api_key, validate_claim, FactCheckProvider};
use crate::types::{FactCheckRequest, LlmResult, ProviderConfig, ProviderType};

/// Something that can send a fact-check request to a provider.
#[async_trait]
pub trait FactCheckDispatcher: Send + Sync {
    /// Validate, send and unwrap one request. The returned text is unparsed.
    async fn dispatch(&self, request: &FactCheckRequest) -> LlmResult<String>;
}

/// Map a provider config to its adapter, sharing `client`.
pub fn create_provider(
    config: ProviderConfig,
    client: reqwest::Client,
) -> Arc<dyn FactCheckProvider> {
    match config.provider {
        ProviderType::OpenAI => Arc::new(OpenAIProvider::with_client(config, client)),
        ProviderType::Google => Arc::new(GoogleProvider::with_client(config, client)),
        ProviderType::Perplexity => Arc::new(PerplexityProvider::with_client(config, client)),
    }
}

/// Dispatcher backed by the real HTTP adapters.
pub struct HttpDispatcher {
    client: reqwest::Client,
    proxy: Option<ProxyConfig>,
    base_urls: HashMap<ProviderType, String>,
}

impl HttpDispatcher {
    pub fn new(proxy: Option<ProxyConfig>) -> LlmResult<Self> {
        let client = build_http_client(proxy.as_ref())?;
        Ok(Self {
            client,
            proxy,
            base_urls: HashMap::new(),
        })
    }

    /// Point one provider at a different API root.
    pub fn with_base_url(mut self, provider: ProviderType, base_url: impl Into<String>) -> Self {
        self.base_urls.insert(provider, base_url.into());
        self
    }

    fn provider_config(&self, request: &FactCheckRequest, api_key: String) -> ProviderConfig {
        ProviderConfig {
            provider: request.provider,
            api_key: Some(api_key),
            base_url: self.base_urls.get(&request.provider).cloned(),
            model: request.model.clone(),
            proxy: self.proxy.clone(),
        }
    }
}

#[async_trait]
impl FactCheckDispatcher for HttpDispatcher {
    async fn dispatch(&self, request: &FactCheckRequest) -> LlmResult<String> {
        validate_claim(&request.text)?;
        let api_key = validate_api_key(request.provider, request.api_key.as_deref())?;

        let prompt =
            build_fact_check_prompt(&request.text, request.context.as_ref(), &request.language);
        let provider = create_provider(
            self.provider_config(request, api_key),
            self.client.clone(),
        );

        tracing::info!(
            provider = provider.provider().as_str(),
            model = provider.model(),
            "dispatching fact-check"
        );
        provider.complete(&prompt, &request.text).await
    }
}
