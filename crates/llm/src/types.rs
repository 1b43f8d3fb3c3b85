//! Provider Types
//!
//! Provider identifiers, model catalog, request/config structs and the
//! provider error taxonomy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use truth_detective_core::{Context, ProxyConfig};

/// Supported AI providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    OpenAI,
    Google,
    Perplexity,
}

/// One selectable model, as shown in the popup's model picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelOption {
    pub value: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

const OPENAI_MODELS: &[ModelOption] = &[
    ModelOption {
        value: "gpt-4",
        label: "GPT-4 (Most Capable)",
        description: "Best for complex reasoning",
    },
    ModelOption {
        value: "gpt-3.5-turbo",
        label: "GPT-3.5 Turbo (Fast)",
        description: "Fast and cost-effective",
    },
];

const GOOGLE_MODELS: &[ModelOption] = &[
    ModelOption {
        value: "gemini-1.5-flash",
        label: "Gemini 1.5 Flash (Free Tier)",
        description: "Fast and efficient",
    },
    ModelOption {
        value: "gemini-pro",
        label: "Gemini Pro (Standard)",
        description: "Balanced performance",
    },
    ModelOption {
        value: "gemini-2.0-flash-exp",
        label: "Gemini 2.0 Flash (Fast)",
        description: "Quick responses",
    },
];

const PERPLEXITY_MODELS: &[ModelOption] = &[
    ModelOption {
        value: "llama-3.1-sonar-small-128k-online",
        label: "Llama 3.1 Sonar (Online)",
        description: "Web-connected verification",
    },
    ModelOption {
        value: "llama-3.1-sonar-small-128k",
        label: "Llama 3.1 Sonar (Offline)",
        description: "Fast offline processing",
    },
];

impl ProviderType {
    pub const ALL: [ProviderType; 3] = [
        ProviderType::OpenAI,
        ProviderType::Google,
        ProviderType::Perplexity,
    ];

    /// Identifier used in settings and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::OpenAI => "openai",
            ProviderType::Google => "google",
            ProviderType::Perplexity => "perplexity",
        }
    }

    /// Human-readable name used in error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderType::OpenAI => "OpenAI",
            ProviderType::Google => "Google AI",
            ProviderType::Perplexity => "Perplexity",
        }
    }

    /// Model catalog, first entry is the default.
    pub fn models(&self) -> &'static [ModelOption] {
        match self {
            ProviderType::OpenAI => OPENAI_MODELS,
            ProviderType::Google => GOOGLE_MODELS,
            ProviderType::Perplexity => PERPLEXITY_MODELS,
        }
    }

    pub fn default_model(&self) -> &'static str {
        self.models()[0].value
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderType {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderType::OpenAI),
            "google" => Ok(ProviderType::Google),
            "perplexity" => Ok(ProviderType::Perplexity),
            other => Err(LlmError::UnsupportedProvider {
                name: other.to_string(),
            }),
        }
    }
}

/// Connection settings for one provider instance.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider: ProviderType,
    pub api_key: Option<String>,
    /// API root override, mainly for tests.
    pub base_url: Option<String>,
    pub model: String,
    pub proxy: Option<ProxyConfig>,
}

impl ProviderConfig {
    pub fn new(provider: ProviderType, model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: Some(api_key.into()),
            base_url: None,
            model: model.into(),
            proxy: None,
        }
    }
}

/// A single claim to verify, with everything needed to reach a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct FactCheckRequest {
    pub text: String,
    pub context: Option<Context>,
    pub provider: ProviderType,
    pub model: String,
    pub api_key: Option<String>,
    pub language: String,
}

/// Errors raised while validating, sending or decoding a provider call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// Input rejected before any network call.
    #[error("{message}")]
    Validation { message: String },

    /// Invalid or unauthorized API key.
    #[error("{message}")]
    AuthenticationFailed { message: String },

    /// Provider throttling or quota exhaustion.
    #[error("{message}")]
    RateLimited { message: String },

    /// Provider rejected the request shape.
    #[error("{message}")]
    InvalidRequest { message: String },

    /// Any other non-success HTTP status.
    #[error("{provider} API error: {status} - {body}")]
    Provider {
        provider: &'static str,
        status: u16,
        body: String,
    },

    /// Transport failure before a status was received.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Success status but an envelope we could not read.
    #[error("Unexpected {provider} API response: {message}")]
    MalformedResponse {
        provider: &'static str,
        message: String,
    },

    #[error("Unsupported AI provider: {name}")]
    UnsupportedProvider { name: String },
}

impl LlmError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Result type alias for provider operations
pub type LlmResult<T> = Result<T, LlmError>;
