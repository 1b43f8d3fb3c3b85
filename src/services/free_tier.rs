//! Free Tier
//!
//! Developer-supplied fallback credentials used when the user has not entered
//! a key. The authoritative copy lives in local storage under
//! `freeTierApiKey`; the in-memory value is only a cache and is rehydrated
//! whenever it is empty.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use truth_detective_llm::ProviderType;

use crate::models::response::FreeTierStatus;
use crate::storage::{KeyValueStore, Scope};
use crate::utils::error::AppResult;

pub const FREE_TIER_PROVIDER: ProviderType = ProviderType::Google;
pub const FREE_TIER_MODEL: &str = "gemini-1.5-flash";
pub const FREE_TIER_LANGUAGE: &str = "en";

pub const KEY_FREE_TIER_API_KEY: &str = "freeTierApiKey";

pub struct FreeTier {
    store: Arc<dyn KeyValueStore>,
    cached: RwLock<Option<String>>,
}

impl FreeTier {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            cached: RwLock::new(None),
        }
    }

    /// Persist a configured key so later cold starts can rehydrate it.
    pub async fn seed(&self, api_key: &str) -> AppResult<()> {
        let key = api_key.trim();
        if key.is_empty() {
            return Ok(());
        }
        self.store
            .set(Scope::Local, KEY_FREE_TIER_API_KEY, Value::from(key))
            .await?;
        *self.cached.write().await = Some(key.to_string());
        tracing::info!("free-tier key seeded");
        Ok(())
    }

    /// Re-read the key from storage, replacing the cache.
    pub async fn reload(&self) -> AppResult<bool> {
        let stored = self
            .store
            .get(Scope::Local, KEY_FREE_TIER_API_KEY)
            .await?
            .and_then(|v| v.as_str().map(str::trim).map(str::to_string))
            .filter(|k| !k.is_empty());
        let available = stored.is_some();
        *self.cached.write().await = stored;
        Ok(available)
    }

    pub async fn api_key(&self) -> AppResult<Option<String>> {
        if let Some(key) = self.cached.read().await.clone() {
            return Ok(Some(key));
        }
        self.reload().await?;
        Ok(self.cached.read().await.clone())
    }

    pub async fn status(&self) -> AppResult<FreeTierStatus> {
        Ok(FreeTierStatus {
            available: self.api_key().await?.is_some(),
            provider: FREE_TIER_PROVIDER.as_str().to_string(),
            model: FREE_TIER_MODEL.to_string(),
        })
    }
}
