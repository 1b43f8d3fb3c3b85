//! Settings Models
//!
//! User settings as kept in the sync storage scope.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use truth_detective_llm::ProviderType;

/// Sync-scope storage keys
pub const KEY_API_KEY: &str = "apiKey";
pub const KEY_PROVIDER: &str = "provider";
pub const KEY_MODEL: &str = "model";
pub const KEY_LANGUAGE: &str = "language";

pub const SETTINGS_KEYS: [&str; 4] = [KEY_API_KEY, KEY_PROVIDER, KEY_MODEL, KEY_LANGUAGE];

const DEFAULT_PROVIDER: &str = "openai";
const DEFAULT_MODEL: &str = "gpt-4";
const DEFAULT_LANGUAGE: &str = "en";

/// User-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Empty when the user relies on the free tier
    pub api_key: String,
    pub provider: String,
    pub model: String,
    /// Response language code (e.g., "en", "de")
    pub language: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            provider: DEFAULT_PROVIDER.to_string(),
            model: DEFAULT_MODEL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

fn stored_string(values: &Map<String, Value>, key: &str) -> Option<String> {
    values
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl Settings {
    /// Build settings from stored values; missing or empty entries take defaults.
    pub fn from_stored(values: &Map<String, Value>) -> Self {
        let defaults = Self::default();
        Self {
            api_key: stored_string(values, KEY_API_KEY).unwrap_or(defaults.api_key),
            provider: stored_string(values, KEY_PROVIDER).unwrap_or(defaults.provider),
            model: stored_string(values, KEY_MODEL).unwrap_or(defaults.model),
            language: stored_string(values, KEY_LANGUAGE).unwrap_or(defaults.language),
        }
    }

    pub fn to_stored(&self) -> Map<String, Value> {
        let mut values = Map::new();
        values.insert(KEY_API_KEY.into(), Value::String(self.api_key.clone()));
        values.insert(KEY_PROVIDER.into(), Value::String(self.provider.clone()));
        values.insert(KEY_MODEL.into(), Value::String(self.model.clone()));
        values.insert(KEY_LANGUAGE.into(), Value::String(self.language.clone()));
        values
    }

    /// The stored key, if the user entered a non-blank one.
    pub fn user_api_key(&self) -> Option<&str> {
        Some(self.api_key.trim()).filter(|k| !k.is_empty())
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), String> {
        self.provider
            .parse::<ProviderType>()
            .map_err(|e| e.to_string())?;

        if self.language.len() < 2 || self.language.len() > 5 {
            return Err(format!("Invalid language code: {}", self.language));
        }

        if self.model.trim().is_empty() {
            return Err("Model must not be empty".to_string());
        }

        Ok(())
    }
}
