//! Settings Commands
//!
//! `getSettings`, `saveSettings` and the `getModels` catalog lookup.

use serde::Serialize;
use serde_json::Value;
use truth_detective_llm::{ModelOption, ProviderType};

use crate::models::messages::GetModelsRequest;
use crate::models::response::respond;
use crate::models::settings::Settings;
use crate::services::Coordinator;
use crate::utils::error::AppResult;

/// Models offered for one provider, default first
#[derive(Debug, Clone, Serialize)]
pub struct ModelCatalog {
    pub provider: ProviderType,
    pub models: &'static [ModelOption],
}

pub async fn get_settings(coordinator: &Coordinator) -> Value {
    respond(coordinator.get_settings().await)
}

pub async fn save_settings(coordinator: &Coordinator, settings: Settings) -> Value {
    respond(coordinator.save_settings(settings).await)
}

pub fn get_models(request: GetModelsRequest) -> Value {
    respond(model_catalog(&request.provider))
}

pub fn model_catalog(provider: &str) -> AppResult<ModelCatalog> {
    let provider: ProviderType = provider.parse()?;
    Ok(ModelCatalog {
        provider,
        models: provider.models(),
    })
}
