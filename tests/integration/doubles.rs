#![allow(dead_code)]

//! Test doubles shared by the integration tests.
//!
//! Hand-written implementations of the Coordinator's seams that record what
//! they were asked to do.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use truth_detective::models::messages::{PageAgentMessage, PopupMessage, TabId};
use truth_detective::models::video::{VideoInfo, VideoTranscript};
use truth_detective::services::{
    Clock, Coordinator, HandshakePolicy, PageAgent, TranscriptSource, UserSurface,
};
use truth_detective::storage::MemoryStore;
use truth_detective::utils::error::{AppError, AppResult};
use truth_detective_llm::{FactCheckDispatcher, FactCheckRequest, LlmError, LlmResult};

pub const TODAY: &str = "Sat Oct 17 2026";

pub const WELL_FORMED_REPLY: &str = r#"```json
{
  "truthScore": 82,
  "analysis": "The claim is largely accurate.",
  "evidence": "Multiple agencies report the same figure.",
  "sources": ["https://example.org/report"],
  "corrections": [],
  "sourceCredibility": "High",
  "contextualNotes": "Figures are from 2023."
}
```"#;

// ============================================================================
// Dispatcher
// ============================================================================

#[derive(Default)]
pub struct ScriptedDispatcher {
    replies: Mutex<VecDeque<LlmResult<String>>>,
    calls: Mutex<Vec<FactCheckRequest>>,
}

impl ScriptedDispatcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply_ok(&self, raw: &str) {
        self.replies.lock().unwrap().push_back(Ok(raw.to_string()));
    }

    pub fn reply_err(&self, err: LlmError) {
        self.replies.lock().unwrap().push_back(Err(err));
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> Option<FactCheckRequest> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl FactCheckDispatcher for ScriptedDispatcher {
    async fn dispatch(&self, request: &FactCheckRequest) -> LlmResult<String> {
        self.calls.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::validation("no scripted reply")))
    }
}

// ============================================================================
// Transcript source
// ============================================================================

pub struct StubTranscripts {
    result: Result<VideoTranscript, String>,
    pub fetches: AtomicU32,
}

impl StubTranscripts {
    pub fn ok(transcript: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(VideoTranscript {
                video_info: VideoInfo {
                    title: "How vaccines work".into(),
                    channel: "Science Explained".into(),
                    upload_date: "March 5, 2024".into(),
                    language: "en".into(),
                },
                transcript: transcript.to_string(),
            }),
            fetches: AtomicU32::new(0),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Err(message.to_string()),
            fetches: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl TranscriptSource for StubTranscripts {
    async fn fetch(&self, _video_id: &str) -> AppResult<VideoTranscript> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.result.clone().map_err(AppError::transcript)
    }
}

// ============================================================================
// Page agent
// ============================================================================

pub struct ScriptedAgent {
    ready: bool,
    /// Number of `request` calls that fail before deliveries succeed
    failing_requests: AtomicU32,
    pub probes: AtomicU32,
    pub injections: AtomicU32,
    pub requests: Mutex<Vec<PageAgentMessage>>,
    pub posted: Mutex<Vec<PageAgentMessage>>,
}

impl ScriptedAgent {
    fn build(ready: bool, failing_requests: u32) -> Arc<Self> {
        Arc::new(Self {
            ready,
            failing_requests: AtomicU32::new(failing_requests),
            probes: AtomicU32::new(0),
            injections: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
            posted: Mutex::new(Vec::new()),
        })
    }

    pub fn ready() -> Arc<Self> {
        Self::build(true, 0)
    }

    pub fn unresponsive() -> Arc<Self> {
        Self::build(false, 0)
    }

    /// Ready, but the first `n` deliveries fail.
    pub fn flaky(n: u32) -> Arc<Self> {
        Self::build(true, n)
    }

    pub fn posted_actions(&self) -> Vec<String> {
        self.posted
            .lock()
            .unwrap()
            .iter()
            .map(|m| serde_json::to_value(m).unwrap()["action"].as_str().unwrap().to_string())
            .collect()
    }
}

#[async_trait]
impl PageAgent for ScriptedAgent {
    async fn probe(&self, _tab_id: TabId, _timeout: Duration) -> AppResult<bool> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        Ok(self.ready)
    }

    async fn inject(&self, _tab_id: TabId, _timeout: Duration) -> AppResult<()> {
        self.injections.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn request(&self, _tab_id: TabId, message: PageAgentMessage) -> AppResult<Value> {
        self.requests.lock().unwrap().push(message);
        let failing = self.failing_requests.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_requests.store(failing - 1, Ordering::SeqCst);
            return Err(AppError::handshake("Could not establish connection."));
        }
        Ok(json!({ "success": true }))
    }

    async fn post(&self, _tab_id: TabId, message: PageAgentMessage) -> AppResult<()> {
        self.posted.lock().unwrap().push(message);
        Ok(())
    }
}

// ============================================================================
// User surface and clock
// ============================================================================

#[derive(Default)]
pub struct RecordingSurface {
    pub notifications: Mutex<Vec<(String, String)>>,
    pub broadcasts: AtomicU32,
}

impl RecordingSurface {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<String> {
        self.notifications
            .lock()
            .unwrap()
            .iter()
            .map(|(_, message)| message.clone())
            .collect()
    }
}

#[async_trait]
impl UserSurface for RecordingSurface {
    async fn notify(&self, title: &str, message: &str) -> AppResult<()> {
        self.notifications
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
        Ok(())
    }

    async fn broadcast(&self, _message: PopupMessage) -> AppResult<()> {
        self.broadcasts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct FixedClock;

impl Clock for FixedClock {
    fn today_key(&self) -> String {
        TODAY.to_string()
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub dispatcher: Arc<ScriptedDispatcher>,
    pub transcripts: Arc<StubTranscripts>,
    pub agent: Arc<ScriptedAgent>,
    pub surface: Arc<RecordingSurface>,
    pub coordinator: Coordinator,
}

impl Harness {
    pub fn new(agent: Arc<ScriptedAgent>, transcripts: Arc<StubTranscripts>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let dispatcher = ScriptedDispatcher::new();
        let surface = RecordingSurface::new();
        let coordinator = Coordinator::new(
            store.clone(),
            dispatcher.clone(),
            transcripts.clone(),
            agent.clone(),
            surface.clone(),
        )
        .with_clock(Arc::new(FixedClock))
        .with_handshake_policy(fast_policy());

        Self {
            store,
            dispatcher,
            transcripts,
            agent,
            surface,
            coordinator,
        }
    }

    pub fn ready() -> Self {
        Self::new(ScriptedAgent::ready(), StubTranscripts::ok("Vaccines train the immune system."))
    }
}

pub fn fast_policy() -> HandshakePolicy {
    HandshakePolicy {
        attempts: 3,
        probe_timeout_ms: 10,
        backoff_ms: 1,
        inject_timeout_ms: 10,
        inject_retry_wait_ms: 1,
    }
}
