//! YouTube Transcript Source
//!
//! Fetches video metadata and then the plain-text transcript from Supadata.
//! Any failure in either call aborts with a transcript error.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use truth_detective_core::ProxyConfig;

use crate::models::video::{VideoInfo, VideoTranscript};
use crate::utils::error::{AppError, AppResult};

const SUPADATA_API_ROOT: &str = "https://api.supadata.ai/v1/youtube";
const PLACEHOLDER_KEY: &str = "<YOUR_SUPADATA_API_KEY>";

const UNKNOWN_TITLE: &str = "Unknown Title";
const UNKNOWN_CHANNEL: &str = "Unknown Channel";

/// Anything that can turn a video id into metadata plus transcript.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch(&self, video_id: &str) -> AppResult<VideoTranscript>;
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChannelField {
    Named { name: Option<String> },
    Plain(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoResponse {
    title: Option<String>,
    channel: Option<ChannelField>,
    upload_date: Option<String>,
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranscriptResponse {
    content: Option<String>,
}

impl VideoResponse {
    fn into_video_info(self) -> VideoInfo {
        let channel = match self.channel {
            Some(ChannelField::Named { name: Some(name) }) => name,
            Some(ChannelField::Plain(name)) => name,
            _ => String::new(),
        };
        VideoInfo {
            title: non_empty_or(self.title, UNKNOWN_TITLE),
            channel: non_empty_or(Some(channel), UNKNOWN_CHANNEL),
            upload_date: self.upload_date.as_deref().map(format_upload_date).unwrap_or_default(),
            language: non_empty_or(self.language, "en"),
        }
    }
}

fn non_empty_or(value: Option<String>, fallback: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// "2024-03-05T10:00:00Z" or "2024-03-05" -> "March 5, 2024".
/// Anything else passes through verbatim.
pub fn format_upload_date(raw: &str) -> String {
    let date = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"));
    match date {
        Ok(date) => date.format("%B %-d, %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Supadata HTTP client
pub struct SupadataClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl SupadataClient {
    pub fn new(api_key: Option<String>, proxy: Option<&ProxyConfig>) -> AppResult<Self> {
        let client = truth_detective_llm::build_http_client(proxy)
            .map_err(|e| AppError::internal(e.to_string()))?;
        Ok(Self::with_client(api_key, client))
    }

    pub fn with_client(api_key: Option<String>, client: reqwest::Client) -> Self {
        Self {
            client,
            api_key,
            base_url: SUPADATA_API_ROOT.to_string(),
        }
    }

    /// Point the client at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn api_key(&self) -> AppResult<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty() && *k != PLACEHOLDER_KEY)
            .ok_or_else(|| {
                AppError::transcript(
                    "Supadata API key not configured. Please contact the extension developer.",
                )
            })
    }

    async fn get(&self, label: &str, path: &str, query: &[(&str, &str)]) -> AppResult<String> {
        let api_key = self.api_key()?;
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, path))
            .query(query)
            .header("Content-Type", "application/json")
            .header("x-api-key", api_key)
            .send()
            .await
            .map_err(|e| AppError::transcript(format!("Supadata {} request failed: {}", label, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::transcript(format!("Supadata {} request failed: {}", label, e)))?;

        if !status.is_success() {
            tracing::error!(status = status.as_u16(), body = %body, "Supadata {} API error", label);
            return Err(AppError::transcript(format!(
                "Supadata {} API error: {} - {}",
                label,
                status.as_u16(),
                body
            )));
        }
        Ok(body)
    }
}

#[async_trait]
impl TranscriptSource for SupadataClient {
    async fn fetch(&self, video_id: &str) -> AppResult<VideoTranscript> {
        let body = self.get("video", "video", &[("id", video_id)]).await?;
        let video: VideoResponse = serde_json::from_str(&body).map_err(|e| {
            AppError::transcript(format!("Invalid video response from Supadata API: {}", e))
        })?;
        let video_info = video.into_video_info();

        let body = self
            .get("transcript", "transcript", &[("videoId", video_id), ("text", "true")])
            .await?;
        let transcript = serde_json::from_str::<TranscriptResponse>(&body)
            .ok()
            .and_then(|t| t.content)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AppError::transcript("Invalid transcript response from Supadata API"))?;

        tracing::info!(video_id, chars = transcript.len(), "fetched YouTube transcript");
        Ok(VideoTranscript {
            video_info,
            transcript,
        })
    }
}
