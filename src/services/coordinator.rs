//! Coordinator
//!
//! Owns the per-action state machine: quota check, page-agent handshake,
//! credential resolution, dispatch, normalization, quota increment and
//! delivery. Quota is only ever incremented after a provider call and its
//! normalization have both succeeded.

use std::sync::Arc;

use chrono::Utc;
use truth_detective_core::{normalize_with, Context, FactCheckResult, ScoreClamp};
use truth_detective_llm::{FactCheckDispatcher, FactCheckRequest, ProviderType};

use crate::models::messages::{
    ContextMenuClick, FactCheckApiRequest, PageAgentMessage, PopupMessage, TabId, TabInfo,
    YouTubeVideoRequest, MENU_FACT_CHECK, MENU_FACT_CHECK_YOUTUBE,
};
use crate::models::response::{FreeTierStatus, LimitInfo, ReloadStatus, SuccessResponse};
use crate::models::settings::{Settings, SETTINGS_KEYS};
use crate::models::video::VideoTranscript;
use crate::services::free_tier::{FreeTier, FREE_TIER_LANGUAGE, FREE_TIER_MODEL, FREE_TIER_PROVIDER};
use crate::services::page_agent::{
    ensure_agent_ready, HandshakePolicy, PageAgent, UserSurface, NOTIFICATION_TITLE,
    REFRESH_PAGE_MESSAGE,
};
use crate::services::quota::{Clock, QuotaClass, QuotaStatus, QuotaTracker};
use crate::services::transcript::TranscriptSource;
use crate::services::youtube::{extract_video_id, is_youtube_url, video_context};
use crate::storage::{KeyValueStore, Scope};
use crate::utils::error::{AppError, AppResult};

const NO_API_KEY_MESSAGE: &str =
    "No API key available. Please add your own API key in settings or configure the free tier API key.";
const BROWSER_PAGE_MESSAGE: &str =
    "Cannot fact-check browser pages. Please navigate to a regular webpage.";
const NOT_YOUTUBE_MESSAGE: &str = "YouTube fact-checking is only available on YouTube pages.";
const NO_VIDEO_MESSAGE: &str =
    "Could not identify a YouTube video on this page. Please navigate to a video page.";

const BROWSER_PAGE_PREFIXES: [&str; 3] = ["chrome://", "edge://", "about:"];

/// Where the key for a request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// Sent along with the request by the popup / page agent
    Request,
    /// The user's saved settings
    Stored,
    FreeTier,
}

/// Fully resolved provider call parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub provider: ProviderType,
    pub model: String,
    pub api_key: String,
    pub language: String,
    pub source: KeySource,
}

/// Caller-supplied preferences; anything missing is looked up.
#[derive(Debug, Clone, Default)]
pub struct Preferences {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub language: Option<String>,
}

impl From<&FactCheckApiRequest> for Preferences {
    fn from(req: &FactCheckApiRequest) -> Self {
        Self {
            provider: req.provider.clone(),
            model: req.model.clone(),
            api_key: req.api_key.clone(),
            language: req.language.clone(),
        }
    }
}

fn filled(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn is_browser_page(url: &str) -> bool {
    BROWSER_PAGE_PREFIXES.iter().any(|p| url.starts_with(p))
}

/// How a YouTube run failed: before the modal existed, or after (already
/// rendered into the modal).
#[derive(Debug)]
enum YouTubeFailure {
    BeforeAgent(AppError),
    Rendered(AppError),
}

impl YouTubeFailure {
    fn into_error(self) -> AppError {
        match self {
            YouTubeFailure::BeforeAgent(e) | YouTubeFailure::Rendered(e) => e,
        }
    }
}

pub struct Coordinator {
    store: Arc<dyn KeyValueStore>,
    quota: QuotaTracker,
    free_tier: FreeTier,
    dispatcher: Arc<dyn FactCheckDispatcher>,
    transcripts: Arc<dyn TranscriptSource>,
    agent: Arc<dyn PageAgent>,
    surface: Arc<dyn UserSurface>,
    handshake: HandshakePolicy,
    score_clamp: ScoreClamp,
}

impl Coordinator {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        dispatcher: Arc<dyn FactCheckDispatcher>,
        transcripts: Arc<dyn TranscriptSource>,
        agent: Arc<dyn PageAgent>,
        surface: Arc<dyn UserSurface>,
    ) -> Self {
        Self {
            quota: QuotaTracker::new(store.clone()),
            free_tier: FreeTier::new(store.clone()),
            store,
            dispatcher,
            transcripts,
            agent,
            surface,
            handshake: HandshakePolicy::default(),
            score_clamp: ScoreClamp::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.quota = QuotaTracker::with_clock(self.store.clone(), clock);
        self
    }

    pub fn with_handshake_policy(mut self, policy: HandshakePolicy) -> Self {
        self.handshake = policy;
        self
    }

    pub fn with_score_clamp(mut self, clamp: ScoreClamp) -> Self {
        self.score_clamp = clamp;
        self
    }

    pub fn score_clamp(&self) -> ScoreClamp {
        self.score_clamp
    }

    pub fn free_tier(&self) -> &FreeTier {
        &self.free_tier
    }

    pub fn quota(&self) -> &QuotaTracker {
        &self.quota
    }

    // ── Settings ───────────────────────────────────────────────────────

    pub async fn get_settings(&self) -> AppResult<Settings> {
        let stored = self.store.get_many(Scope::Sync, &SETTINGS_KEYS).await?;
        Ok(Settings::from_stored(&stored))
    }

    pub async fn save_settings(&self, settings: Settings) -> AppResult<SuccessResponse> {
        settings.validate().map_err(AppError::Validation)?;
        self.store.set_many(Scope::Sync, settings.to_stored()).await?;
        tracing::info!(provider = %settings.provider, model = %settings.model, "settings saved");
        Ok(SuccessResponse::ok())
    }

    // ── Quota ──────────────────────────────────────────────────────────

    pub async fn check_limit(&self, class: QuotaClass) -> AppResult<LimitInfo> {
        Ok(self.quota.check_limit(class).await?.into())
    }

    /// Refuse the action when today's limit is already spent.
    ///
    /// The check here and the increment in [`Self::record_success`] take the
    /// class lock separately, so overlapping actions that both pass the check
    /// near the limit can each complete and push the count past it. Every
    /// increment is still counted; only admission is approximate.
    async fn ensure_quota(&self, class: QuotaClass) -> AppResult<QuotaStatus> {
        let status = self.quota.check_limit(class).await?;
        if !status.allowed {
            tracing::warn!(?class, used = status.used, "daily limit reached");
            return Err(AppError::quota_exceeded(class.exhausted_message(status.used)));
        }
        Ok(status)
    }

    /// Count a completed request and nudge an open popup. Neither step can
    /// fail the action that already succeeded.
    async fn record_success(&self, class: QuotaClass) {
        if let Err(e) = self.quota.increment(class).await {
            tracing::error!(?class, error = %e, "failed to record quota usage");
        }
        if let Err(e) = self.surface.broadcast(PopupMessage::RefreshDailyLimit).await {
            tracing::debug!(error = %e, "popup refresh not delivered");
        }
    }

    // ── Free tier ──────────────────────────────────────────────────────

    pub async fn free_tier_status(&self) -> AppResult<FreeTierStatus> {
        self.free_tier.status().await
    }

    pub async fn reload_api_key(&self) -> AppResult<ReloadStatus> {
        let available = self.free_tier.reload().await?;
        Ok(ReloadStatus {
            success: true,
            available,
        })
    }

    // ── Dispatch ───────────────────────────────────────────────────────

    /// Resolve provider, model, key and language.
    ///
    /// Key priority: the request's own key, then the saved key, then the free
    /// tier. Never falls through to an unauthenticated call.
    pub async fn resolve_credentials(&self, prefs: &Preferences) -> AppResult<Credentials> {
        let settings = self.get_settings().await?;

        let (api_key, source) = if let Some(key) = filled(&prefs.api_key) {
            (key.to_string(), KeySource::Request)
        } else if let Some(key) = settings.user_api_key() {
            (key.to_string(), KeySource::Stored)
        } else if let Some(key) = self.free_tier.api_key().await? {
            let credentials = Credentials {
                provider: FREE_TIER_PROVIDER,
                model: FREE_TIER_MODEL.to_string(),
                api_key: key,
                language: filled(&prefs.language)
                    .unwrap_or(FREE_TIER_LANGUAGE)
                    .to_string(),
                source: KeySource::FreeTier,
            };
            tracing::info!(
                provider = credentials.provider.as_str(),
                model = %credentials.model,
                "using free tier"
            );
            return Ok(credentials);
        } else {
            tracing::error!("no API key available for free tier");
            return Err(AppError::configuration(NO_API_KEY_MESSAGE));
        };

        let provider_name = filled(&prefs.provider).unwrap_or(settings.provider.as_str());
        let provider: ProviderType = provider_name.parse()?;
        let model = match filled(&prefs.model) {
            Some(model) => model.to_string(),
            None if provider_name == settings.provider => settings.model.clone(),
            None => provider.default_model().to_string(),
        };
        let language = filled(&prefs.language)
            .unwrap_or(settings.language.as_str())
            .to_string();

        tracing::info!(provider = provider.as_str(), model = %model, ?source, "using user API key");
        Ok(Credentials {
            provider,
            model,
            api_key,
            language,
            source,
        })
    }

    async fn run_fact_check(
        &self,
        text: &str,
        context: Option<Context>,
        credentials: Credentials,
    ) -> AppResult<FactCheckResult> {
        let request = FactCheckRequest {
            text: text.to_string(),
            context,
            provider: credentials.provider,
            model: credentials.model,
            api_key: Some(credentials.api_key),
            language: credentials.language,
        };
        let raw = self.dispatcher.dispatch(&request).await?;
        Ok(normalize_with(&raw, self.score_clamp))
    }

    /// `factCheckAPI`: verify a claim the page agent collected.
    pub async fn fact_check_api(&self, request: FactCheckApiRequest) -> AppResult<FactCheckResult> {
        self.ensure_quota(QuotaClass::General).await?;
        let credentials = self.resolve_credentials(&Preferences::from(&request)).await?;

        let result = self
            .run_fact_check(&request.text, request.context, credentials)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "fact check failed"))?;

        self.record_success(QuotaClass::General).await;
        Ok(result)
    }

    // ── YouTube ────────────────────────────────────────────────────────

    /// `factCheckYouTubeVideo` from the popup.
    pub async fn fact_check_youtube_video(
        &self,
        request: YouTubeVideoRequest,
    ) -> AppResult<SuccessResponse> {
        let tab_id = request
            .tab_id
            .ok_or_else(|| AppError::validation("No active tab found"))?;
        self.run_youtube(tab_id, &request.video_id)
            .await
            .map_err(YouTubeFailure::into_error)?;
        Ok(SuccessResponse::ok())
    }

    async fn run_youtube(&self, tab_id: TabId, video_id: &str) -> Result<(), YouTubeFailure> {
        self.ensure_quota(QuotaClass::YouTube)
            .await
            .map_err(YouTubeFailure::BeforeAgent)?;
        ensure_agent_ready(self.agent.as_ref(), tab_id, &self.handshake)
            .await
            .map_err(YouTubeFailure::BeforeAgent)?;

        match self.youtube_with_agent(tab_id, video_id).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!(video_id, error = %e, "YouTube fact check failed");
                self.post_best_effort(
                    tab_id,
                    PageAgentMessage::ShowModalError {
                        error: e.to_string(),
                    },
                )
                .await;
                Err(YouTubeFailure::Rendered(e))
            }
        }
    }

    async fn youtube_with_agent(&self, tab_id: TabId, video_id: &str) -> AppResult<()> {
        self.post_best_effort(tab_id, PageAgentMessage::ShowYouTubeModal)
            .await;

        let VideoTranscript {
            video_info,
            transcript,
        } = self.transcripts.fetch(video_id).await?;
        self.post_best_effort(
            tab_id,
            PageAgentMessage::UpdateYouTubeModalWithTranscript {
                video_info: video_info.clone(),
                transcript: transcript.clone(),
            },
        )
        .await;

        let context = video_context(video_id, &video_info, Utc::now());
        let credentials = self.resolve_credentials(&Preferences::default()).await?;
        let result = self
            .run_fact_check(&transcript, Some(context), credentials)
            .await?;

        self.record_success(QuotaClass::YouTube).await;
        self.post_best_effort(tab_id, PageAgentMessage::UpdateYouTubeModalWithResults { result })
            .await;
        Ok(())
    }

    // ── Context menu ───────────────────────────────────────────────────

    /// `contextMenuClicked`: failures are shown as notifications (or in the
    /// modal once one exists) and also returned to the caller.
    pub async fn handle_context_menu(&self, click: ContextMenuClick) -> AppResult<SuccessResponse> {
        let tab = click
            .tab
            .ok_or_else(|| AppError::validation("Invalid tab information"))?;

        match click.menu_item_id.as_str() {
            MENU_FACT_CHECK => {
                self.context_fact_check(&tab, click.selection_text.as_deref())
                    .await?
            }
            MENU_FACT_CHECK_YOUTUBE => self.context_fact_check_youtube(&tab).await?,
            other => {
                return Err(AppError::validation(format!("Unknown menu item: {}", other)));
            }
        }
        Ok(SuccessResponse::ok())
    }

    async fn context_fact_check(&self, tab: &TabInfo, selection: Option<&str>) -> AppResult<()> {
        if tab.url.as_deref().is_some_and(is_browser_page) {
            return Err(self.notify_failure(AppError::validation(BROWSER_PAGE_MESSAGE)).await);
        }
        let text = match selection.map(str::trim).filter(|s| !s.is_empty()) {
            Some(text) => text.to_string(),
            None => {
                let err = AppError::validation("No text provided for fact-checking");
                return Err(self.notify_failure(err).await);
            }
        };

        if let Err(e) = self.ensure_quota(QuotaClass::General).await {
            return Err(self.notify_failure(e).await);
        }
        if let Err(e) = ensure_agent_ready(self.agent.as_ref(), tab.id, &self.handshake).await {
            return Err(self.notify_failure(e).await);
        }

        self.deliver_fact_check(tab.id, text).await
    }

    /// Hand the selection to the agent, re-injecting once if delivery fails.
    async fn deliver_fact_check(&self, tab_id: TabId, text: String) -> AppResult<()> {
        let message = PageAgentMessage::FactCheck { text };
        let Err(first) = self.agent.request(tab_id, message.clone()).await else {
            return Ok(());
        };

        tracing::warn!(tab_id, error = %first, "factCheck delivery failed, re-injecting");
        let retried = match self.agent.inject(tab_id, self.handshake.inject_timeout()).await {
            Ok(()) => {
                tokio::time::sleep(self.handshake.inject_retry_wait()).await;
                self.agent.request(tab_id, message).await.map(|_| ())
            }
            Err(e) => Err(e),
        };

        match retried {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!(tab_id, error = %e, "factCheck retry failed");
                Err(self
                    .notify_failure(AppError::handshake(REFRESH_PAGE_MESSAGE))
                    .await)
            }
        }
    }

    async fn context_fact_check_youtube(&self, tab: &TabInfo) -> AppResult<()> {
        let url = tab.url.as_deref().unwrap_or_default();
        if !is_youtube_url(url) {
            return Err(self.notify_failure(AppError::validation(NOT_YOUTUBE_MESSAGE)).await);
        }
        let Some(video_id) = extract_video_id(url) else {
            return Err(self.notify_failure(AppError::validation(NO_VIDEO_MESSAGE)).await);
        };

        match self.run_youtube(tab.id, &video_id).await {
            Ok(()) => Ok(()),
            Err(YouTubeFailure::BeforeAgent(e)) => Err(self.notify_failure(e).await),
            Err(YouTubeFailure::Rendered(e)) => Err(e),
        }
    }

    // ── Delivery helpers ───────────────────────────────────────────────

    async fn notify_failure(&self, err: AppError) -> AppError {
        if let Err(e) = self.surface.notify(NOTIFICATION_TITLE, &err.to_string()).await {
            tracing::warn!(error = %e, "notification not delivered");
        }
        err
    }

    async fn post_best_effort(&self, tab_id: TabId, message: PageAgentMessage) {
        if let Err(e) = self.agent.post(tab_id, message).await {
            tracing::warn!(tab_id, error = %e, "page agent message not delivered");
        }
    }
}
