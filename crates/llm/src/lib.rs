//! Truth Detective LLM
//!
//! Provides a unified fact-check interface over three AI providers:
//! - OpenAI (chat completions)
//! - Google AI (Gemini generateContent)
//! - Perplexity (chat completions)
//!
//! Also includes the shared prompt template, the tagged response envelopes,
//! the HTTP client factory and the dispatcher used by the Coordinator.

pub mod dispatcher;
pub mod envelope;
pub mod google;
pub mod http_client;
pub mod openai;
pub mod perplexity;
pub mod prompt;
pub mod provider;
pub mod types;

// Re-export main types
pub use dispatcher::{create_provider, FactCheckDispatcher, HttpDispatcher};
pub use envelope::{extract_content, ResponseEnvelope};
pub use google::GoogleProvider;
pub use http_client::build_http_client;
pub use openai::OpenAIProvider;
pub use perplexity::PerplexityProvider;
pub use prompt::{build_fact_check_prompt, language_name};
pub use provider::{is_placeholder_key, parse_http_error, FactCheckProvider};
pub use types::*;
