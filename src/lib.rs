//! Truth Detective - Native Messaging Host Library
//!
//! Backend for the Truth Detective browser extension. It includes:
//! - Command handlers for the extension's actions
//! - The Coordinator with quota, credential and page-agent handling
//! - The native-messaging host (framing, reply correlation)
//! - Storage layer (key-value scopes, host config)
//! - Data models and utilities

pub mod commands;
pub mod host;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

pub use commands::handle;
pub use host::{serve, NativeBridge};
pub use models::response::*;
pub use services::Coordinator;
pub use state::AppState;
pub use utils::error::{AppError, AppResult};
