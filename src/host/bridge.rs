//! Extension Bridge
//!
//! Host-originated traffic to the extension. Frames that need an answer carry
//! a fresh id; the extension relays the tab's reply back as
//! `{"replyTo": id, "response": ...}` which [`NativeBridge::resolve_reply`]
//! hands to the waiting caller.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::models::messages::{OutboundFrame, PageAgentMessage, PopupMessage, TabId};
use crate::services::page_agent::{PageAgent, UserSurface};
use crate::utils::error::{AppError, AppResult};

/// Default wait for a relayed reply (30 seconds).
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(30);

pub struct NativeBridge {
    outbound: mpsc::UnboundedSender<OutboundFrame>,
    /// Callers waiting on a reply, keyed by host-issued id
    pending: DashMap<u64, oneshot::Sender<Value>>,
    next_id: AtomicU64,
    reply_timeout: Duration,
}

impl NativeBridge {
    /// Create a bridge plus the receiving end the writer task drains.
    pub fn new(reply_timeout: Duration) -> (Arc<Self>, mpsc::UnboundedReceiver<OutboundFrame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let bridge = Self {
            outbound: tx,
            pending: DashMap::new(),
            next_id: AtomicU64::new(1),
            reply_timeout,
        };
        (Arc::new(bridge), rx)
    }

    /// Queue a frame for stdout.
    pub fn send(&self, frame: OutboundFrame) -> AppResult<()> {
        self.outbound
            .send(frame)
            .map_err(|_| AppError::internal("Outbound channel closed"))
    }

    /// Send a frame built around a fresh id and wait for its reply.
    async fn call<F>(&self, build: F, wait: Duration) -> AppResult<Value>
    where
        F: FnOnce(u64) -> OutboundFrame,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel::<Value>();
        self.pending.insert(id, tx);

        if let Err(e) = self.send(build(id)) {
            self.pending.remove(&id);
            return Err(e);
        }

        timeout(wait, rx)
            .await
            .map_err(|_| {
                self.pending.remove(&id);
                AppError::handshake(format!(
                    "No reply from the extension (id={}) within {}ms",
                    id,
                    wait.as_millis()
                ))
            })?
            .map_err(|_| AppError::handshake(format!("Reply channel closed (id={})", id)))
    }

    /// Deliver a relayed reply. Returns false for unknown or expired ids.
    pub fn resolve_reply(&self, reply_to: u64, response: Value) -> bool {
        match self.pending.remove(&reply_to) {
            Some((_, sender)) => {
                let _ = sender.send(response);
                true
            }
            None => {
                debug!(reply_to, "reply for unknown or expired request");
                false
            }
        }
    }

    /// Drop every waiting caller; used once stdin closes.
    pub fn fail_pending(&self) -> usize {
        let ids: Vec<u64> = self.pending.iter().map(|entry| *entry.key()).collect();
        let dropped = ids
            .into_iter()
            .filter(|id| self.pending.remove(id).is_some())
            .count();
        if dropped > 0 {
            warn!(dropped, "abandoned requests awaiting extension replies");
        }
        dropped
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

/// Error string from a reply shaped like `{"error": "..."}`.
fn reply_error(response: &Value) -> Option<String> {
    response
        .get("error")
        .filter(|e| !e.is_null())
        .map(|e| e.as_str().map(str::to_string).unwrap_or_else(|| e.to_string()))
}

fn ensure_delivered(response: Value) -> AppResult<Value> {
    match reply_error(&response) {
        Some(error) => Err(AppError::handshake(error)),
        None => Ok(response),
    }
}

#[async_trait]
impl PageAgent for NativeBridge {
    async fn probe(&self, tab_id: TabId, wait: Duration) -> AppResult<bool> {
        let reply = self
            .call(
                |id| OutboundFrame::TabMessage {
                    id: Some(id),
                    tab_id,
                    message: PageAgentMessage::Ping,
                },
                wait,
            )
            .await;

        match reply {
            Ok(response) => Ok(response.get("ready").and_then(Value::as_bool) == Some(true)),
            Err(AppError::Handshake(reason)) => {
                debug!(tab_id, %reason, "ping unanswered");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn inject(&self, tab_id: TabId, timeout: Duration) -> AppResult<()> {
        let response = self
            .call(|id| OutboundFrame::InjectAgent { id, tab_id }, timeout)
            .await?;
        ensure_delivered(response).map(|_| ())
    }

    async fn request(&self, tab_id: TabId, message: PageAgentMessage) -> AppResult<Value> {
        let response = self
            .call(
                |id| OutboundFrame::TabMessage {
                    id: Some(id),
                    tab_id,
                    message,
                },
                self.reply_timeout,
            )
            .await?;
        ensure_delivered(response)
    }

    async fn post(&self, tab_id: TabId, message: PageAgentMessage) -> AppResult<()> {
        self.send(OutboundFrame::TabMessage {
            id: None,
            tab_id,
            message,
        })
    }
}

#[async_trait]
impl UserSurface for NativeBridge {
    async fn notify(&self, title: &str, message: &str) -> AppResult<()> {
        self.send(OutboundFrame::Notification {
            title: title.to_string(),
            message: message.to_string(),
        })
    }

    async fn broadcast(&self, message: PopupMessage) -> AppResult<()> {
        self.send(OutboundFrame::Broadcast { message })
    }
}
