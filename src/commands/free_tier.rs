//! Free Tier Commands

use serde_json::Value;

use crate::models::response::respond;
use crate::services::Coordinator;

pub async fn get_free_tier_status(coordinator: &Coordinator) -> Value {
    respond(coordinator.free_tier_status().await)
}

/// Re-read the free-tier key after the extension updated local storage.
pub async fn reload_api_key(coordinator: &Coordinator) -> Value {
    respond(coordinator.reload_api_key().await)
}
