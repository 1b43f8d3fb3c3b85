//! Host Configuration
//!
//! Reads and writes `~/.truth-detective/host.json`. The file carries the
//! developer-supplied keys (free tier, transcript provider), where extension
//! storage lives, an optional outbound proxy and the page-agent handshake
//! timings.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use truth_detective_core::{ProxyConfig, ScoreClamp};

use crate::services::page_agent::HandshakePolicy;
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{config_path, default_storage_dir, ensure_dir};

/// Host configuration stored in host.json
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Fallback Gemini key used when the user has none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_tier_api_key: Option<String>,
    /// Supadata key for YouTube metadata and transcripts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_api_key: Option<String>,
    /// Directory holding sync.json / local.json
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfig>,
    pub handshake: HandshakePolicy,
    /// When to pin `truthScore` into 0..=100
    pub score_clamp: ScoreClamp,
}

/// Values that take precedence over the file (CLI flags and environment).
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub free_tier_api_key: Option<String>,
    pub transcript_api_key: Option<String>,
    pub storage_dir: Option<PathBuf>,
}

impl HostConfig {
    /// Validate the configuration
    pub fn validate(&self) -> AppResult<()> {
        if let Some(proxy) = &self.proxy {
            proxy.validate()?;
        }
        self.handshake.validate().map_err(AppError::Configuration)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(key) = non_empty(overrides.free_tier_api_key) {
            self.free_tier_api_key = Some(key);
        }
        if let Some(key) = non_empty(overrides.transcript_api_key) {
            self.transcript_api_key = Some(key);
        }
        if let Some(dir) = overrides.storage_dir {
            self.storage_dir = Some(dir);
        }
    }

    /// Storage directory, falling back to ~/.truth-detective/storage
    pub fn resolved_storage_dir(&self) -> AppResult<PathBuf> {
        match &self.storage_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_storage_dir(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Configuration service for the host config file
#[derive(Debug)]
pub struct ConfigService {
    config_path: PathBuf,
    config: HostConfig,
}

impl ConfigService {
    /// Load the default config file, creating it with defaults if missing
    pub fn new() -> AppResult<Self> {
        Self::open(config_path()?)
    }

    /// Load `path`, creating it with defaults if missing
    pub fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let config_path = path.into();
        if let Some(parent) = config_path.parent() {
            ensure_dir(parent)?;
        }

        let config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            let default_config = HostConfig::default();
            Self::save_to_file(&config_path, &default_config)?;
            default_config
        };

        Ok(Self {
            config_path,
            config,
        })
    }

    fn load_from_file(path: &Path) -> AppResult<HostConfig> {
        let content = fs::read_to_string(path)?;
        let config: HostConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn save_to_file(path: &Path, config: &HostConfig) -> AppResult<()> {
        config.validate()?;
        let content = serde_json::to_string_pretty(config)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn get_config(&self) -> &HostConfig {
        &self.config
    }

    /// Consume the service, applying overrides on top of the file contents.
    /// Overrides are never written back.
    pub fn into_config(self, overrides: ConfigOverrides) -> HostConfig {
        let mut config = self.config;
        config.apply_overrides(overrides);
        config
    }
}
