//! Page Agent and User Surface
//!
//! The Coordinator talks to two collaborators it does not own: the per-tab
//! page agent (renders modals, reports readiness) and the user-facing surfaces
//! outside a page (OS notifications, popup broadcasts). Both are traits so the
//! native-messaging bridge and test doubles are interchangeable.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::messages::{PageAgentMessage, PopupMessage, TabId};
use crate::utils::error::{AppError, AppResult};

pub const NOTIFICATION_TITLE: &str = "Truth Detective";

/// Shown whenever the page agent cannot be reached.
pub const REFRESH_PAGE_MESSAGE: &str =
    "Please refresh the page and try again, or use the extension popup instead.";

#[async_trait]
pub trait PageAgent: Send + Sync {
    /// Send `ping`; `Ok(true)` only on an affirmative `{ready: true}` within `timeout`.
    async fn probe(&self, tab_id: TabId, timeout: Duration) -> AppResult<bool>;

    /// Ask the extension to (re-)inject the agent script, giving up after `timeout`.
    async fn inject(&self, tab_id: TabId, timeout: Duration) -> AppResult<()>;

    /// Send a message and wait for the agent's acknowledgement.
    async fn request(&self, tab_id: TabId, message: PageAgentMessage) -> AppResult<Value>;

    /// Fire-and-forget delivery.
    async fn post(&self, tab_id: TabId, message: PageAgentMessage) -> AppResult<()>;
}

#[async_trait]
pub trait UserSurface: Send + Sync {
    async fn notify(&self, title: &str, message: &str) -> AppResult<()>;

    async fn broadcast(&self, message: PopupMessage) -> AppResult<()>;
}

/// Retry timings for the readiness handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandshakePolicy {
    /// Total number of probes
    pub attempts: u32,
    pub probe_timeout_ms: u64,
    /// Pause between failed probes
    pub backoff_ms: u64,
    /// How long to wait for the extension to confirm an injection
    pub inject_timeout_ms: u64,
    /// Pause after re-injecting when a `factCheck` delivery fails
    pub inject_retry_wait_ms: u64,
}

impl Default for HandshakePolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            probe_timeout_ms: 1000,
            backoff_ms: 500,
            inject_timeout_ms: 2000,
            inject_retry_wait_ms: 1500,
        }
    }
}

impl HandshakePolicy {
    pub fn validate(&self) -> Result<(), String> {
        if self.attempts == 0 {
            return Err("handshake attempts must be at least 1".to_string());
        }
        if self.probe_timeout_ms == 0 {
            return Err("handshake probe timeout must be non-zero".to_string());
        }
        if self.inject_timeout_ms == 0 {
            return Err("handshake inject timeout must be non-zero".to_string());
        }
        Ok(())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    pub fn inject_timeout(&self) -> Duration {
        Duration::from_millis(self.inject_timeout_ms)
    }

    pub fn inject_retry_wait(&self) -> Duration {
        Duration::from_millis(self.inject_retry_wait_ms)
    }
}

/// Make sure the agent in `tab_id` is loaded and answering.
///
/// Probes up to `policy.attempts` times. After the first miss the agent is
/// injected once; injection errors are only logged since the agent may
/// already be present.
pub async fn ensure_agent_ready(
    agent: &dyn PageAgent,
    tab_id: TabId,
    policy: &HandshakePolicy,
) -> AppResult<()> {
    for attempt in 1..=policy.attempts {
        match agent.probe(tab_id, policy.probe_timeout()).await {
            Ok(true) => {
                tracing::debug!(tab_id, attempt, "page agent ready");
                return Ok(());
            }
            Ok(false) => tracing::debug!(tab_id, attempt, "page agent not ready"),
            Err(e) => tracing::debug!(tab_id, attempt, error = %e, "page agent probe failed"),
        }

        if attempt == 1 {
            if let Err(e) = agent.inject(tab_id, policy.inject_timeout()).await {
                tracing::debug!(tab_id, error = %e, "agent injection skipped");
            }
        }
        if attempt < policy.attempts {
            tokio::time::sleep(policy.backoff()).await;
        }
    }

    tracing::warn!(tab_id, attempts = policy.attempts, "page agent failed to initialize");
    Err(AppError::handshake(REFRESH_PAGE_MESSAGE))
}
