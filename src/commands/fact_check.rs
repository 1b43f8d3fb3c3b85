//! Fact-check Commands
//!
//! Text claims from the page agent, popup-initiated video checks and
//! context-menu clicks relayed by the extension.

use serde_json::Value;

use crate::models::messages::{ContextMenuClick, FactCheckApiRequest, YouTubeVideoRequest};
use crate::models::response::respond;
use crate::services::Coordinator;

pub async fn fact_check_api(coordinator: &Coordinator, request: FactCheckApiRequest) -> Value {
    respond(coordinator.fact_check_api(request).await)
}

pub async fn fact_check_youtube_video(
    coordinator: &Coordinator,
    request: YouTubeVideoRequest,
) -> Value {
    respond(coordinator.fact_check_youtube_video(request).await)
}

pub async fn context_menu_clicked(coordinator: &Coordinator, click: ContextMenuClick) -> Value {
    respond(coordinator.handle_context_menu(click).await)
}
