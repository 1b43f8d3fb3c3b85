//! Fact-Check Data Model
//!
//! The page/video `Context` attached to a claim and the canonical
//! `FactCheckResult` every provider response is shaped into.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata key for the publishing site's name.
pub const META_SITE_NAME: &str = "og:site_name";
/// Metadata key for the content type (article, video, ...).
pub const META_CONTENT_TYPE: &str = "og:type";

/// Text immediately around the user's selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurroundingText {
    #[serde(default)]
    pub before: String,
    #[serde(default)]
    pub after: String,
}

/// Metadata snapshot of the page or video a claim came from.
///
/// Captured once by the page agent (or derived from video metadata) and never
/// mutated afterwards; the `with_*` methods only exist for construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(rename = "timestamp", default = "Utc::now")]
    pub captured_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surrounding_text: Option<SurroundingText>,
    #[serde(default)]
    pub meta_info: BTreeMap<String, String>,
}

impl Context {
    /// Start a context for the given page, stamped with the current time.
    pub fn new(
        domain: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            title: title.into(),
            url: url.into(),
            publication_date: None,
            author: None,
            captured_at: Utc::now(),
            surrounding_text: None,
            meta_info: BTreeMap::new(),
        }
    }

    pub fn with_publication_date(mut self, date: impl Into<String>) -> Self {
        self.publication_date = Some(date.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_surrounding_text(mut self, before: impl Into<String>, after: impl Into<String>) -> Self {
        self.surrounding_text = Some(SurroundingText {
            before: before.into(),
            after: after.into(),
        });
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta_info.insert(key.into(), value.into());
        self
    }

    /// Site name from the metadata map, if the page declared one.
    pub fn site_name(&self) -> Option<&str> {
        self.meta_info.get(META_SITE_NAME).map(String::as_str)
    }

    /// Content type from the metadata map, if the page declared one.
    pub fn content_type(&self) -> Option<&str> {
        self.meta_info.get(META_CONTENT_TYPE).map(String::as_str)
    }
}

/// Structured verdict delivered to the page agent and popup.
///
/// Every field is always populated: missing upstream data becomes an explicit
/// placeholder during normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactCheckResult {
    pub truth_score: i64,
    pub analysis: String,
    pub evidence: String,
    pub sources: Vec<String>,
    pub corrections: Vec<String>,
    pub source_credibility: String,
    pub contextual_notes: String,
}
