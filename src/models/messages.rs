//! Message Protocol
//!
//! Everything that crosses the native-messaging channel: inbound requests and
//! relayed replies from the extension, the page-agent and popup messages the
//! host asks the extension to deliver, and the `kind`-tagged outbound frames
//! that carry them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use truth_detective_core::{Context, FactCheckResult};

use crate::models::settings::Settings;
use crate::models::video::VideoInfo;
use crate::utils::error::{AppError, AppResult};

/// Browser tab identifier
pub type TabId = i64;

/// Context-menu item ids registered by the extension
pub const MENU_FACT_CHECK: &str = "factCheck";
pub const MENU_FACT_CHECK_YOUTUBE: &str = "factCheckYouTube";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: TabId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// `factCheckAPI` payload sent by the page agent.
///
/// Provider, model and key are whatever the popup last had; any of them may
/// be missing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FactCheckApiRequest {
    pub text: String,
    pub context: Option<Context>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YouTubeVideoRequest {
    pub video_id: String,
    /// Active tab as seen by the popup
    #[serde(default)]
    pub tab_id: Option<TabId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextMenuClick {
    pub menu_item_id: String,
    #[serde(default)]
    pub selection_text: Option<String>,
    #[serde(default)]
    pub tab: Option<TabInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GetModelsRequest {
    pub provider: String,
}

/// Actions the extension asks the host to perform.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ExtensionRequest {
    GetSettings,
    SaveSettings(Settings),
    CheckDailyLimit,
    CheckDailyYouTubeLimit,
    #[serde(rename = "factCheckAPI")]
    FactCheckApi(FactCheckApiRequest),
    FactCheckYouTubeVideo(YouTubeVideoRequest),
    ContextMenuClicked(ContextMenuClick),
    GetFreeTierStatus,
    ReloadApiKey,
    GetModels(GetModelsRequest),
}

impl ExtensionRequest {
    /// Parse the body of a request frame.
    pub fn from_body(body: Value) -> AppResult<Self> {
        serde_json::from_value(body).map_err(|e| AppError::validation(format!("Invalid request: {}", e)))
    }

    /// Wire name of the action, for logging.
    pub fn action(&self) -> &'static str {
        match self {
            ExtensionRequest::GetSettings => "getSettings",
            ExtensionRequest::SaveSettings(_) => "saveSettings",
            ExtensionRequest::CheckDailyLimit => "checkDailyLimit",
            ExtensionRequest::CheckDailyYouTubeLimit => "checkDailyYouTubeLimit",
            ExtensionRequest::FactCheckApi(_) => "factCheckAPI",
            ExtensionRequest::FactCheckYouTubeVideo(_) => "factCheckYouTubeVideo",
            ExtensionRequest::ContextMenuClicked(_) => "contextMenuClicked",
            ExtensionRequest::GetFreeTierStatus => "getFreeTierStatus",
            ExtensionRequest::ReloadApiKey => "reloadApiKey",
            ExtensionRequest::GetModels(_) => "getModels",
        }
    }
}

/// A frame read from stdin.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// `{"id": n, "action": ...}`; `body` keeps everything except `id`
    Request { id: u64, body: Value },
    /// `{"replyTo": n, "response": ...}`
    Reply { reply_to: u64, response: Value },
}

impl InboundFrame {
    pub fn from_value(value: Value) -> AppResult<Self> {
        let Value::Object(mut map) = value else {
            return Err(AppError::validation("Frame is not a JSON object"));
        };

        if let Some(reply_to) = map.get("replyTo").and_then(Value::as_u64) {
            let response = map.remove("response").unwrap_or(Value::Null);
            return Ok(InboundFrame::Reply { reply_to, response });
        }

        let id = map
            .remove("id")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| AppError::validation("Request frame is missing a numeric id"))?;
        Ok(InboundFrame::Request {
            id,
            body: Value::Object(map),
        })
    }
}

/// Messages delivered to the page agent in a tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum PageAgentMessage {
    Ping,
    FactCheck {
        text: String,
    },
    ShowYouTubeModal,
    UpdateYouTubeModalWithTranscript {
        #[serde(rename = "videoInfo")]
        video_info: VideoInfo,
        transcript: String,
    },
    UpdateYouTubeModalWithResults {
        result: FactCheckResult,
    },
    ShowModalError {
        error: String,
    },
}

/// Runtime broadcasts picked up by an open popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum PopupMessage {
    RefreshDailyLimit,
}

/// A frame written to stdout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum OutboundFrame {
    Response {
        id: u64,
        response: Value,
    },
    TabMessage {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<u64>,
        #[serde(rename = "tabId")]
        tab_id: TabId,
        message: PageAgentMessage,
    },
    InjectAgent {
        id: u64,
        #[serde(rename = "tabId")]
        tab_id: TabId,
    },
    Broadcast {
        message: PopupMessage,
    },
    Notification {
        title: String,
        message: String,
    },
}
