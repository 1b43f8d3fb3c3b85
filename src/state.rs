//! Application State
//!
//! Holds the host configuration and the Coordinator built from it.

use std::sync::Arc;
use tokio::sync::RwLock;

use truth_detective_llm::HttpDispatcher;

use crate::host::NativeBridge;
use crate::services::{Coordinator, SupadataClient};
use crate::storage::{HostConfig, JsonFileStore, KeyValueStore};
use crate::utils::error::{AppError, AppResult};

pub struct AppState {
    /// Effective configuration (file plus overrides)
    config: Arc<RwLock<Option<HostConfig>>>,
    coordinator: Arc<RwLock<Option<Arc<Coordinator>>>>,
    initialized: Arc<RwLock<bool>>,
}

impl AppState {
    /// Create a new uninitialized app state
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(None)),
            coordinator: Arc::new(RwLock::new(None)),
            initialized: Arc::new(RwLock::new(false)),
        }
    }

    /// Open storage, seed the free tier and build the Coordinator.
    ///
    /// The bridge serves as both page agent and user surface.
    pub async fn initialize(&self, config: HostConfig, bridge: Arc<NativeBridge>) -> AppResult<()> {
        let mut initialized = self.initialized.write().await;
        if *initialized {
            return Ok(());
        }

        let storage_dir = config.resolved_storage_dir()?;
        let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::open(&storage_dir)?);
        tracing::info!(dir = %storage_dir.display(), "storage opened");

        let dispatcher = HttpDispatcher::new(config.proxy.clone())?;
        let transcripts =
            SupadataClient::new(config.transcript_api_key.clone(), config.proxy.as_ref())?;

        let coordinator = Coordinator::new(
            store,
            Arc::new(dispatcher),
            Arc::new(transcripts),
            bridge.clone(),
            bridge,
        )
        .with_handshake_policy(config.handshake.clone())
        .with_score_clamp(config.score_clamp);

        match config.free_tier_api_key.as_deref() {
            Some(key) => coordinator.free_tier().seed(key).await?,
            None => tracing::info!("no free-tier key configured"),
        }

        *self.coordinator.write().await = Some(Arc::new(coordinator));
        *self.config.write().await = Some(config);
        *initialized = true;
        Ok(())
    }

    pub async fn is_initialized(&self) -> bool {
        *self.initialized.read().await
    }

    pub async fn coordinator(&self) -> AppResult<Arc<Coordinator>> {
        self.coordinator
            .read()
            .await
            .clone()
            .ok_or_else(|| AppError::internal("Coordinator not initialized"))
    }

    pub async fn get_config(&self) -> AppResult<HostConfig> {
        self.config
            .read()
            .await
            .clone()
            .ok_or_else(|| AppError::internal("Config not initialized"))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
