//! YouTube Helpers
//!
//! Video id extraction from tab URLs and the Context attached to a
//! transcript fact-check.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use truth_detective_core::{Context, META_CONTENT_TYPE, META_SITE_NAME};

use crate::models::video::VideoInfo;

const NOT_AVAILABLE: &str = "Not available";

fn direct_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([^&\n?#]+)")
            .expect("video id regex is valid")
    })
}

fn query_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"youtube\.com/watch\?.*v=([^&\n?#]+)").expect("query video id regex is valid")
    })
}

/// True for any URL on a youtube.com host.
pub fn is_youtube_url(url: &str) -> bool {
    url.contains("youtube.com")
}

/// Pull the video id out of a watch, short-link or embed URL.
pub fn extract_video_id(url: &str) -> Option<String> {
    [direct_id_regex(), query_id_regex()]
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Context describing a video, used in place of page metadata.
pub fn video_context(video_id: &str, info: &VideoInfo, captured_at: DateTime<Utc>) -> Context {
    let publication_date = if info.upload_date.is_empty() {
        NOT_AVAILABLE
    } else {
        info.upload_date.as_str()
    };

    let mut context = Context::new("youtube.com", info.title.clone(), watch_url(video_id))
        .with_publication_date(publication_date)
        .with_author(info.channel.clone())
        .with_meta(META_SITE_NAME, "YouTube")
        .with_meta(META_CONTENT_TYPE, "video");
    context.captured_at = captured_at;
    context
}
