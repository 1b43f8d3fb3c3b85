//! Native-messaging Host Integration Tests
//!
//! Runs `serve` over an in-memory duplex pipe with the test playing the
//! extension: it writes request frames, answers relayed page-agent messages
//! and reads the host's outbound frames.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{DuplexStream, ReadHalf, WriteHalf};
use tokio::task::JoinHandle;

use truth_detective::host::{read_frame, serve, write_frame, NativeBridge};
use truth_detective::services::{Coordinator, HandshakePolicy};
use truth_detective::storage::MemoryStore;
use truth_detective::utils::error::AppResult;

use crate::doubles::*;

struct Extension {
    reader: ReadHalf<DuplexStream>,
    writer: WriteHalf<DuplexStream>,
    host: JoinHandle<AppResult<()>>,
    dispatcher: Arc<ScriptedDispatcher>,
}

impl Extension {
    fn launch() -> Self {
        let (ours, theirs) = tokio::io::duplex(256 * 1024);
        let (host_reader, host_writer) = tokio::io::split(theirs);
        let (reader, writer) = tokio::io::split(ours);

        let (bridge, outbound) = NativeBridge::new(Duration::from_secs(5));
        let dispatcher = ScriptedDispatcher::new();
        let coordinator = Coordinator::new(
            Arc::new(MemoryStore::new()),
            dispatcher.clone(),
            StubTranscripts::ok("unused"),
            bridge.clone(),
            bridge.clone(),
        )
        .with_clock(Arc::new(FixedClock))
        .with_handshake_policy(HandshakePolicy {
            probe_timeout_ms: 2000,
            ..fast_policy()
        });

        let host = tokio::spawn(serve(host_reader, host_writer, Arc::new(coordinator), bridge, outbound));
        Self {
            reader,
            writer,
            host,
            dispatcher,
        }
    }

    async fn send(&mut self, frame: Value) {
        write_frame(&mut self.writer, &frame).await.unwrap();
    }

    async fn next(&mut self) -> Value {
        tokio::time::timeout(Duration::from_secs(5), read_frame(&mut self.reader))
            .await
            .expect("host wrote nothing")
            .unwrap()
            .expect("host closed stdout")
    }

    /// Close our end of the pipe; the host must exit cleanly.
    async fn close(self) {
        let Extension {
            reader,
            writer,
            host,
            ..
        } = self;
        drop(writer);
        drop(reader);
        host.await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn test_get_settings_round_trip() {
    let mut ext = Extension::launch();

    ext.send(json!({"id": 1, "action": "getSettings"})).await;

    assert_eq!(
        ext.next().await,
        json!({
            "kind": "response",
            "id": 1,
            "response": {"apiKey": "", "provider": "openai", "model": "gpt-4", "language": "en"}
        })
    );
    ext.close().await;
}

#[tokio::test]
async fn test_unknown_action_gets_error_reply() {
    let mut ext = Extension::launch();

    ext.send(json!({"id": 7, "action": "launchRockets"})).await;

    let frame = ext.next().await;
    assert_eq!(frame["id"], 7);
    assert!(frame["response"]["error"].as_str().unwrap().starts_with("Invalid request"));
    ext.close().await;
}

#[tokio::test]
async fn test_check_daily_limit_reports_fresh_budget() {
    let mut ext = Extension::launch();

    ext.send(json!({"id": 2, "action": "checkDailyYouTubeLimit"})).await;

    assert_eq!(
        ext.next().await["response"],
        json!({"canMakeRequest": true, "remainingRequests": 5, "totalRequests": 0})
    );
    ext.close().await;
}

#[tokio::test]
async fn test_context_menu_handshake_over_the_wire() {
    let mut ext = Extension::launch();

    ext.send(json!({
        "id": 5,
        "action": "contextMenuClicked",
        "menuItemId": "factCheck",
        "selectionText": "The moon is made of cheese",
        "tab": {"id": 3, "url": "https://example.com/article"}
    }))
    .await;

    let ping = ext.next().await;
    assert_eq!(ping["kind"], "tabMessage");
    assert_eq!(ping["tabId"], 3);
    assert_eq!(ping["message"], json!({"action": "ping"}));
    ext.send(json!({"replyTo": ping["id"], "response": {"ready": true}})).await;

    let delivery = ext.next().await;
    assert_eq!(
        delivery["message"],
        json!({"action": "factCheck", "text": "The moon is made of cheese"})
    );
    ext.send(json!({"replyTo": delivery["id"], "response": {"success": true}})).await;

    assert_eq!(
        ext.next().await,
        json!({"kind": "response", "id": 5, "response": {"success": true}})
    );
    ext.close().await;
}

#[tokio::test]
async fn test_fact_check_api_broadcasts_refresh() {
    let mut ext = Extension::launch();
    ext.dispatcher.reply_ok(WELL_FORMED_REPLY);

    ext.send(json!({
        "id": 9,
        "action": "factCheckAPI",
        "text": "Claim",
        "provider": "openai",
        "model": "gpt-4",
        "apiKey": "sk-test",
        "language": "en"
    }))
    .await;

    let first = ext.next().await;
    let second = ext.next().await;
    let (broadcast, response) = if first["kind"] == "broadcast" {
        (first, second)
    } else {
        (second, first)
    };

    assert_eq!(broadcast["message"], json!({"action": "refreshDailyLimit"}));
    assert_eq!(response["id"], 9);
    assert_eq!(response["response"]["truthScore"], 82);
    ext.close().await;
}

#[tokio::test]
async fn test_malformed_frames_do_not_stop_the_host() {
    let mut ext = Extension::launch();

    ext.send(json!(["not", "an", "object"])).await;
    ext.send(json!({"action": "getSettings"})).await;
    ext.send(json!({"replyTo": 1234, "response": {}})).await;
    ext.send(json!({"id": 3, "action": "getFreeTierStatus"})).await;

    assert_eq!(
        ext.next().await,
        json!({
            "kind": "response",
            "id": 3,
            "response": {"available": false, "provider": "google", "model": "gemini-1.5-flash"}
        })
    );
    ext.close().await;
}
