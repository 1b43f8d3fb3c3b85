//! Provider Response Envelopes
//!
//! Each provider wraps the model's text in its own JSON envelope. Bodies are
//! decoded into one explicit variant per envelope shape, then reduced to the
//! single text payload handed to the normalizer.

use serde::Deserialize;

use crate::types::{LlmError, LlmResult, ProviderType};

/// OpenAI-style `chat/completions` body (also used by Perplexity).
#[derive(Debug, Deserialize)]
pub struct ChatCompletionEnvelope {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ChatMessage {
    pub content: Option<String>,
}

/// Google `generateContent` body.
#[derive(Debug, Deserialize)]
pub struct GenerateContentEnvelope {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
pub struct ContentPart {
    pub text: Option<String>,
}

#[derive(Debug)]
pub enum ResponseEnvelope {
    ChatCompletion(ChatCompletionEnvelope),
    GenerateContent(GenerateContentEnvelope),
}

impl ResponseEnvelope {
    /// Decode a success body using the envelope shape of `provider`.
    pub fn decode(provider: ProviderType, body: &str) -> LlmResult<Self> {
        let malformed = |e: serde_json::Error| LlmError::MalformedResponse {
            provider: provider.display_name(),
            message: e.to_string(),
        };

        match provider {
            ProviderType::OpenAI | ProviderType::Perplexity => serde_json::from_str(body)
                .map(ResponseEnvelope::ChatCompletion)
                .map_err(malformed),
            ProviderType::Google => serde_json::from_str(body)
                .map(ResponseEnvelope::GenerateContent)
                .map_err(malformed),
        }
    }

    /// The text of the first choice / first candidate.
    ///
    /// A candidate split over several parts is concatenated in order.
    pub fn into_content(self) -> Option<String> {
        match self {
            ResponseEnvelope::ChatCompletion(env) => env
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message)
                .and_then(|m| m.content),
            ResponseEnvelope::GenerateContent(env) => {
                let parts = env.candidates.into_iter().next()?.content?.parts;
                let text: String = parts.into_iter().filter_map(|p| p.text).collect();
                (!text.is_empty()).then_some(text)
            }
        }
    }
}

/// Decode `body` and extract its text payload in one step.
pub fn extract_content(provider: ProviderType, body: &str) -> LlmResult<String> {
    ResponseEnvelope::decode(provider, body)?
        .into_content()
        .ok_or_else(|| LlmError::MalformedResponse {
            provider: provider.display_name(),
            message: "response contained no text content".to_string(),
        })
}
