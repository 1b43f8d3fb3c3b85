//! Truth Detective Core
//!
//! Shared building blocks for the Truth Detective workspace. This crate has no
//! knowledge of providers, storage or the host process.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `fact_check` - Page/video `Context` and the canonical `FactCheckResult`
//! - `normalizer` - Tolerant conversion of model output into `FactCheckResult`
//! - `proxy` - Proxy configuration shared by the HTTP clients

pub mod error;
pub mod fact_check;
pub mod normalizer;
pub mod proxy;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Data Model ─────────────────────────────────────────────────────────
pub use fact_check::{Context, FactCheckResult, SurroundingText, META_CONTENT_TYPE, META_SITE_NAME};

// ── Normalization ──────────────────────────────────────────────────────
pub use normalizer::{normalize, normalize_with, ScoreClamp};

// ── Proxy Types ────────────────────────────────────────────────────────
pub use proxy::{ProxyConfig, ProxyProtocol};
