//! Video Models
//!
//! Metadata and transcript of a YouTube video, as shown in the page agent's
//! YouTube modal.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    pub title: String,
    pub channel: String,
    /// Human-readable upload date ("March 5, 2024"), empty when unknown
    pub upload_date: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoTranscript {
    pub video_info: VideoInfo,
    pub transcript: String,
}
