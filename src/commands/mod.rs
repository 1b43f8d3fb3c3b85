//! Command Handlers
//!
//! Entry points for the actions the extension sends. Each handler returns the
//! reply body; failures are rendered as `{ "error": "<message>" }`.

pub mod fact_check;
pub mod free_tier;
pub mod quota;
pub mod settings;

pub use fact_check::*;
pub use free_tier::*;
pub use quota::*;
pub use settings::*;

use serde_json::Value;

use crate::models::messages::ExtensionRequest;
use crate::models::response::ErrorResponse;
use crate::services::Coordinator;

/// Route one request body to its handler.
pub async fn handle(coordinator: &Coordinator, body: Value) -> Value {
    let request = match ExtensionRequest::from_body(body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "rejected request");
            return ErrorResponse::new(e.to_string()).to_value();
        }
    };
    tracing::debug!(action = request.action(), "handling request");

    match request {
        ExtensionRequest::GetSettings => get_settings(coordinator).await,
        ExtensionRequest::SaveSettings(settings) => save_settings(coordinator, settings).await,
        ExtensionRequest::GetModels(req) => get_models(req),
        ExtensionRequest::CheckDailyLimit => check_daily_limit(coordinator).await,
        ExtensionRequest::CheckDailyYouTubeLimit => check_daily_youtube_limit(coordinator).await,
        ExtensionRequest::FactCheckApi(req) => fact_check_api(coordinator, req).await,
        ExtensionRequest::FactCheckYouTubeVideo(req) => {
            fact_check_youtube_video(coordinator, req).await
        }
        ExtensionRequest::ContextMenuClicked(click) => context_menu_clicked(coordinator, click).await,
        ExtensionRequest::GetFreeTierStatus => get_free_tier_status(coordinator).await,
        ExtensionRequest::ReloadApiKey => reload_api_key(coordinator).await,
    }
}
