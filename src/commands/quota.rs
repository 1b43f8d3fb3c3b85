//! Quota Commands

use serde_json::Value;

use crate::models::response::respond;
use crate::services::{Coordinator, QuotaClass};

pub async fn check_daily_limit(coordinator: &Coordinator) -> Value {
    respond(coordinator.check_limit(QuotaClass::General).await)
}

pub async fn check_daily_youtube_limit(coordinator: &Coordinator) -> Value {
    respond(coordinator.check_limit(QuotaClass::YouTube).await)
}
