//! Coordinator Integration Tests
//!
//! Drives whole user actions through the Coordinator with scripted seams:
//! - Quota gating and success-only increments
//! - Credential resolution order and the no-key failure
//! - Page-agent handshake and the context-menu retry
//! - The YouTube pipeline and its error rendering

use std::sync::atomic::Ordering;

use serde_json::json;

use truth_detective::models::messages::{
    ContextMenuClick, FactCheckApiRequest, PageAgentMessage, TabInfo, YouTubeVideoRequest,
};
use truth_detective::models::settings::Settings;
use truth_detective::services::QuotaClass;
use truth_detective::storage::{KeyValueStore, Scope};
use truth_detective::utils::error::AppError;
use truth_detective_llm::{LlmError, ProviderType};

use crate::doubles::*;

// ============================================================================
// Helpers
// ============================================================================

fn claim(text: &str) -> FactCheckApiRequest {
    FactCheckApiRequest {
        text: text.to_string(),
        provider: Some("openai".into()),
        model: Some("gpt-4".into()),
        api_key: Some("sk-request".into()),
        language: Some("en".into()),
        ..Default::default()
    }
}

async fn spend_quota(h: &Harness, class: QuotaClass, used: u64) {
    let (count_key, date_key) = match class {
        QuotaClass::General => ("dailyRequestCount", "lastRequestDate"),
        QuotaClass::YouTube => ("dailyYouTubeCount", "lastYouTubeDate"),
    };
    h.store.set(Scope::Local, count_key, json!(used)).await.unwrap();
    h.store.set(Scope::Local, date_key, json!(TODAY)).await.unwrap();
}

async fn used(h: &Harness, class: QuotaClass) -> u64 {
    h.coordinator.check_limit(class).await.unwrap().total_requests
}

fn menu_click(menu_item_id: &str, url: &str, selection: Option<&str>) -> ContextMenuClick {
    ContextMenuClick {
        menu_item_id: menu_item_id.to_string(),
        selection_text: selection.map(str::to_string),
        tab: Some(TabInfo {
            id: 42,
            url: Some(url.to_string()),
        }),
    }
}

// ============================================================================
// factCheckAPI
// ============================================================================

#[tokio::test]
async fn test_fact_check_success_increments_quota_and_broadcasts() {
    let h = Harness::ready();
    h.dispatcher.reply_ok(WELL_FORMED_REPLY);

    let result = h.coordinator.fact_check_api(claim("The sky is blue")).await.unwrap();

    assert_eq!(result.truth_score, 82);
    assert_eq!(result.source_credibility, "High");
    assert_eq!(used(&h, QuotaClass::General).await, 1);
    assert_eq!(h.surface.broadcasts.load(Ordering::SeqCst), 1);

    let call = h.dispatcher.last_call().unwrap();
    assert_eq!(call.provider, ProviderType::OpenAI);
    assert_eq!(call.api_key.as_deref(), Some("sk-request"));
}

#[tokio::test]
async fn test_exhausted_quota_never_dispatches() {
    let h = Harness::ready();
    spend_quota(&h, QuotaClass::General, 20).await;

    let err = h.coordinator.fact_check_api(claim("claim")).await.unwrap_err();

    assert!(matches!(err, AppError::QuotaExceeded(_)));
    assert_eq!(
        err.to_string(),
        "Daily limit reached. You've used 20/20 requests today. Please try again tomorrow."
    );
    assert_eq!(h.dispatcher.call_count(), 0);
    assert_eq!(used(&h, QuotaClass::General).await, 20);
}

#[tokio::test]
async fn test_stale_day_resets_before_checking() {
    let h = Harness::ready();
    h.store.set(Scope::Local, "dailyRequestCount", json!(20)).await.unwrap();
    h.store
        .set(Scope::Local, "lastRequestDate", json!("Fri Oct 16 2026"))
        .await
        .unwrap();
    h.dispatcher.reply_ok(WELL_FORMED_REPLY);

    h.coordinator.fact_check_api(claim("claim")).await.unwrap();
    assert_eq!(used(&h, QuotaClass::General).await, 1);
}

#[tokio::test]
async fn test_provider_failure_does_not_consume_quota() {
    let h = Harness::ready();
    h.dispatcher.reply_err(LlmError::AuthenticationFailed {
        message: "Invalid OpenAI API key. Please check your API key in settings.".into(),
    });

    let err = h.coordinator.fact_check_api(claim("claim")).await.unwrap_err();

    assert!(matches!(err, AppError::Auth(_)));
    assert_eq!(used(&h, QuotaClass::General).await, 0);
    assert_eq!(h.surface.broadcasts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_no_key_anywhere_fails_without_network() {
    let h = Harness::ready();
    let request = FactCheckApiRequest {
        text: "claim".into(),
        ..Default::default()
    };

    let err = h.coordinator.fact_check_api(request).await.unwrap_err();

    assert!(matches!(err, AppError::Configuration(_)));
    assert!(err.to_string().starts_with("No API key available."));
    assert_eq!(h.dispatcher.call_count(), 0);
}

#[tokio::test]
async fn test_stored_key_keeps_request_provider_and_model() {
    let h = Harness::ready();
    h.coordinator
        .save_settings(Settings {
            api_key: "pplx-stored".into(),
            provider: "perplexity".into(),
            model: "llama-3.1-sonar-small-128k".into(),
            language: "de".into(),
        })
        .await
        .unwrap();
    h.dispatcher.reply_ok(WELL_FORMED_REPLY);

    let request = FactCheckApiRequest {
        text: "claim".into(),
        provider: Some("perplexity".into()),
        model: Some("llama-3.1-sonar-small-128k-online".into()),
        language: Some("fr".into()),
        ..Default::default()
    };
    h.coordinator.fact_check_api(request).await.unwrap();

    let call = h.dispatcher.last_call().unwrap();
    assert_eq!(call.api_key.as_deref(), Some("pplx-stored"));
    assert_eq!(call.model, "llama-3.1-sonar-small-128k-online");
    assert_eq!(call.language, "fr");
}

#[tokio::test]
async fn test_free_tier_overrides_provider_and_model() {
    let h = Harness::ready();
    h.coordinator.free_tier().seed("AIzaFreeTier").await.unwrap();
    h.dispatcher.reply_ok(WELL_FORMED_REPLY);

    let request = FactCheckApiRequest {
        text: "claim".into(),
        provider: Some("openai".into()),
        model: Some("gpt-4".into()),
        api_key: Some("".into()),
        language: Some("es".into()),
        ..Default::default()
    };
    h.coordinator.fact_check_api(request).await.unwrap();

    let call = h.dispatcher.last_call().unwrap();
    assert_eq!(call.provider, ProviderType::Google);
    assert_eq!(call.model, "gemini-1.5-flash");
    assert_eq!(call.api_key.as_deref(), Some("AIzaFreeTier"));
    assert_eq!(call.language, "es");
}

#[tokio::test]
async fn test_unparseable_reply_still_counts_as_success() {
    let h = Harness::ready();
    h.dispatcher
        .reply_ok("Truth Score: 140\nAnalysis: Mostly wrong.\nEvidence: None found.");

    let result = h.coordinator.fact_check_api(claim("claim")).await.unwrap();

    assert_eq!(result.truth_score, 100);
    assert_eq!(result.analysis, "Mostly wrong.");
    assert_eq!(used(&h, QuotaClass::General).await, 1);
}

// ============================================================================
// Context menu: factCheck
// ============================================================================

#[tokio::test]
async fn test_context_menu_delivers_selection_to_agent() {
    let h = Harness::ready();

    h.coordinator
        .handle_context_menu(menu_click("factCheck", "https://news.example.com", Some("  Water boils at 90C ")))
        .await
        .unwrap();

    let requests = h.agent.requests.lock().unwrap().clone();
    assert_eq!(
        requests,
        vec![PageAgentMessage::FactCheck {
            text: "Water boils at 90C".into()
        }]
    );
    assert_eq!(h.agent.injections.load(Ordering::SeqCst), 0);
    // The agent calls back with factCheckAPI; nothing is dispatched here.
    assert_eq!(h.dispatcher.call_count(), 0);
}

#[tokio::test]
async fn test_context_menu_rejects_browser_pages() {
    let h = Harness::ready();

    let err = h
        .coordinator
        .handle_context_menu(menu_click("factCheck", "chrome://settings", Some("text")))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(
        h.surface.messages(),
        vec!["Cannot fact-check browser pages. Please navigate to a regular webpage."]
    );
    assert_eq!(h.agent.probes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_context_menu_quota_exhausted_notifies() {
    let h = Harness::ready();
    spend_quota(&h, QuotaClass::General, 20).await;

    h.coordinator
        .handle_context_menu(menu_click("factCheck", "https://example.com", Some("text")))
        .await
        .unwrap_err();

    let notifications = h.surface.notifications.lock().unwrap().clone();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].0, "Truth Detective");
    assert!(notifications[0].1.starts_with("Daily limit reached."));
    assert_eq!(h.agent.probes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unresponsive_agent_fails_handshake() {
    let h = Harness::new(ScriptedAgent::unresponsive(), StubTranscripts::ok("unused"));

    let err = h
        .coordinator
        .handle_context_menu(menu_click("factCheck", "https://example.com", Some("text")))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Handshake(_)));
    assert_eq!(h.agent.probes.load(Ordering::SeqCst), 3);
    assert_eq!(h.agent.injections.load(Ordering::SeqCst), 1);
    assert!(h.agent.requests.lock().unwrap().is_empty());
    assert_eq!(
        h.surface.messages(),
        vec!["Please refresh the page and try again, or use the extension popup instead."]
    );
}

#[tokio::test]
async fn test_failed_delivery_reinjects_and_retries_once() {
    let h = Harness::new(ScriptedAgent::flaky(1), StubTranscripts::ok("unused"));

    h.coordinator
        .handle_context_menu(menu_click("factCheck", "https://example.com", Some("text")))
        .await
        .unwrap();

    assert_eq!(h.agent.requests.lock().unwrap().len(), 2);
    assert_eq!(h.agent.injections.load(Ordering::SeqCst), 1);
    assert!(h.surface.messages().is_empty());
}

#[tokio::test]
async fn test_second_delivery_failure_notifies_refresh() {
    let h = Harness::new(ScriptedAgent::flaky(2), StubTranscripts::ok("unused"));

    let err = h
        .coordinator
        .handle_context_menu(menu_click("factCheck", "https://example.com", Some("text")))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Handshake(_)));
    assert_eq!(h.agent.requests.lock().unwrap().len(), 2);
    assert_eq!(
        h.surface.messages(),
        vec!["Please refresh the page and try again, or use the extension popup instead."]
    );
}

// ============================================================================
// YouTube
// ============================================================================

#[tokio::test]
async fn test_youtube_pipeline_renders_results() {
    let h = Harness::ready();
    h.coordinator.free_tier().seed("AIzaFreeTier").await.unwrap();
    h.dispatcher.reply_ok(WELL_FORMED_REPLY);

    h.coordinator
        .handle_context_menu(menu_click(
            "factCheckYouTube",
            "https://www.youtube.com/watch?v=abc123XYZ&t=10s",
            None,
        ))
        .await
        .unwrap();

    assert_eq!(
        h.agent.posted_actions(),
        [
            "showYouTubeModal",
            "updateYouTubeModalWithTranscript",
            "updateYouTubeModalWithResults"
        ]
    );
    assert_eq!(used(&h, QuotaClass::YouTube).await, 1);
    assert_eq!(used(&h, QuotaClass::General).await, 0);

    let call = h.dispatcher.last_call().unwrap();
    assert_eq!(call.text, "Vaccines train the immune system.");
    assert_eq!(call.model, "gemini-1.5-flash");
    assert_eq!(call.language, "en");
    let context = call.context.unwrap();
    assert_eq!(context.url, "https://www.youtube.com/watch?v=abc123XYZ");
    assert_eq!(context.author.as_deref(), Some("Science Explained"));
    assert_eq!(context.publication_date.as_deref(), Some("March 5, 2024"));
}

#[tokio::test]
async fn test_youtube_uses_stored_settings_with_user_key() {
    let h = Harness::ready();
    h.coordinator
        .save_settings(Settings {
            api_key: "sk-user".into(),
            provider: "openai".into(),
            model: "gpt-3.5-turbo".into(),
            language: "it".into(),
        })
        .await
        .unwrap();
    h.dispatcher.reply_ok(WELL_FORMED_REPLY);

    h.coordinator
        .fact_check_youtube_video(YouTubeVideoRequest {
            video_id: "abc".into(),
            tab_id: Some(9),
        })
        .await
        .unwrap();

    let call = h.dispatcher.last_call().unwrap();
    assert_eq!(call.provider, ProviderType::OpenAI);
    assert_eq!(call.model, "gpt-3.5-turbo");
    assert_eq!(call.language, "it");
}

#[tokio::test]
async fn test_transcript_failure_rendered_in_modal() {
    let h = Harness::new(
        ScriptedAgent::ready(),
        StubTranscripts::failing("Supadata transcript API error: 404 - not found"),
    );
    h.coordinator.free_tier().seed("AIzaFreeTier").await.unwrap();

    let err = h
        .coordinator
        .fact_check_youtube_video(YouTubeVideoRequest {
            video_id: "abc".into(),
            tab_id: Some(9),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Transcript(_)));
    assert_eq!(h.agent.posted_actions(), ["showYouTubeModal", "showModalError"]);
    assert_eq!(h.dispatcher.call_count(), 0);
    assert_eq!(used(&h, QuotaClass::YouTube).await, 0);
    assert!(h.surface.messages().is_empty());
}

#[tokio::test]
async fn test_youtube_quota_exhausted_before_handshake() {
    let h = Harness::ready();
    spend_quota(&h, QuotaClass::YouTube, 5).await;

    let err = h
        .coordinator
        .handle_context_menu(menu_click("factCheckYouTube", "https://www.youtube.com/watch?v=abc", None))
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Daily YouTube limit reached. You've used 5/5 video fact-checks today. Please try again tomorrow."
    );
    assert_eq!(h.agent.probes.load(Ordering::SeqCst), 0);
    assert_eq!(h.transcripts.fetches.load(Ordering::SeqCst), 0);
    assert_eq!(h.surface.messages(), vec![err.to_string()]);
}

#[tokio::test]
async fn test_youtube_menu_requires_video_page() {
    let h = Harness::ready();

    h.coordinator
        .handle_context_menu(menu_click("factCheckYouTube", "https://example.com", None))
        .await
        .unwrap_err();
    h.coordinator
        .handle_context_menu(menu_click("factCheckYouTube", "https://www.youtube.com/feed/trending", None))
        .await
        .unwrap_err();

    assert_eq!(
        h.surface.messages(),
        vec![
            "YouTube fact-checking is only available on YouTube pages.",
            "Could not identify a YouTube video on this page. Please navigate to a video page.",
        ]
    );
}

#[tokio::test]
async fn test_youtube_video_without_tab() {
    let h = Harness::ready();
    let err = h
        .coordinator
        .fact_check_youtube_video(YouTubeVideoRequest {
            video_id: "abc".into(),
            tab_id: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "No active tab found");
}
