//! HTTP Contract Integration Tests
//!
//! The Coordinator wired to the real HTTP dispatcher and Supadata client,
//! both pointed at wiremock servers. The page agent and surfaces stay
//! scripted.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use truth_detective::models::messages::{FactCheckApiRequest, PageAgentMessage, YouTubeVideoRequest};
use truth_detective::services::{Coordinator, QuotaClass, SupadataClient};
use truth_detective::storage::MemoryStore;
use truth_detective::utils::error::AppError;
use truth_detective_llm::{HttpDispatcher, ProviderType};

use crate::doubles::*;

struct Wired {
    coordinator: Coordinator,
    agent: Arc<ScriptedAgent>,
}

fn wire(llm: &MockServer, supadata: &MockServer) -> Wired {
    let dispatcher = HttpDispatcher::new(None)
        .unwrap()
        .with_base_url(ProviderType::Google, llm.uri())
        .with_base_url(ProviderType::OpenAI, llm.uri());
    let transcripts = SupadataClient::new(Some("sd-key".into()), None)
        .unwrap()
        .with_base_url(supadata.uri());
    let agent = ScriptedAgent::ready();

    let coordinator = Coordinator::new(
        Arc::new(MemoryStore::new()),
        Arc::new(dispatcher),
        Arc::new(transcripts),
        agent.clone(),
        RecordingSurface::new(),
    )
    .with_clock(Arc::new(FixedClock))
    .with_handshake_policy(fast_policy());

    Wired { coordinator, agent }
}

async fn mount_video(supadata: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/video"))
        .and(query_param("id", "dQw4w9WgXcQ"))
        .and(header("x-api-key", "sd-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": "Ocean facts",
            "channel": {"id": "UC1", "name": "Deep Blue"},
            "uploadDate": "2024-01-15T08:00:00Z",
            "language": "en"
        })))
        .mount(supadata)
        .await;
}

#[tokio::test]
async fn test_youtube_pipeline_end_to_end() {
    let llm = MockServer::start().await;
    let supadata = MockServer::start().await;
    mount_video(&supadata).await;
    Mock::given(method("GET"))
        .and(path("/transcript"))
        .and(query_param("videoId", "dQw4w9WgXcQ"))
        .and(query_param("text", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": "The Pacific is the largest ocean.",
            "lang": "en"
        })))
        .expect(1)
        .mount(&supadata)
        .await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-flash:generateContent"))
        .and(query_param("key", "AIzaFree"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": WELL_FORMED_REPLY}]}}]
        })))
        .expect(1)
        .mount(&llm)
        .await;

    let wired = wire(&llm, &supadata);
    wired.coordinator.free_tier().seed("AIzaFree").await.unwrap();

    wired
        .coordinator
        .fact_check_youtube_video(YouTubeVideoRequest {
            video_id: "dQw4w9WgXcQ".into(),
            tab_id: Some(1),
        })
        .await
        .unwrap();

    let posted = wired.agent.posted.lock().unwrap().clone();
    match &posted[1] {
        PageAgentMessage::UpdateYouTubeModalWithTranscript { video_info, transcript } => {
            assert_eq!(video_info.channel, "Deep Blue");
            assert_eq!(video_info.upload_date, "January 15, 2024");
            assert_eq!(transcript, "The Pacific is the largest ocean.");
        }
        other => panic!("unexpected message {other:?}"),
    }
    match &posted[2] {
        PageAgentMessage::UpdateYouTubeModalWithResults { result } => {
            assert_eq!(result.truth_score, 82)
        }
        other => panic!("unexpected message {other:?}"),
    }

    let received = llm.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("The Pacific is the largest ocean."));
    assert!(prompt.contains("Author: Deep Blue"));

    let quota = wired.coordinator.check_limit(QuotaClass::YouTube).await.unwrap();
    assert_eq!(quota.total_requests, 1);
}

#[tokio::test]
async fn test_transcript_http_error_shown_in_modal() {
    let llm = MockServer::start().await;
    let supadata = MockServer::start().await;
    mount_video(&supadata).await;
    Mock::given(method("GET"))
        .and(path("/transcript"))
        .respond_with(ResponseTemplate::new(404).set_body_string("transcript unavailable"))
        .mount(&supadata)
        .await;

    let wired = wire(&llm, &supadata);
    wired.coordinator.free_tier().seed("AIzaFree").await.unwrap();

    let err = wired
        .coordinator
        .fact_check_youtube_video(YouTubeVideoRequest {
            video_id: "dQw4w9WgXcQ".into(),
            tab_id: Some(1),
        })
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Supadata transcript API error: 404 - transcript unavailable");
    let posted = wired.agent.posted.lock().unwrap().clone();
    assert_eq!(
        posted.last(),
        Some(&PageAgentMessage::ShowModalError {
            error: err.to_string()
        })
    );
    assert!(llm.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rate_limited_provider_leaves_quota_untouched() {
    let llm = MockServer::start().await;
    let supadata = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-user"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .expect(1)
        .mount(&llm)
        .await;

    let wired = wire(&llm, &supadata);
    let err = wired
        .coordinator
        .fact_check_api(FactCheckApiRequest {
            text: "Claim".into(),
            provider: Some("openai".into()),
            model: Some("gpt-4".into()),
            api_key: Some("sk-user".into()),
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::RateLimit(_)));
    let quota = wired.coordinator.check_limit(QuotaClass::General).await.unwrap();
    assert_eq!(quota.total_requests, 0);
}
