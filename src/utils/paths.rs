//! Cross-Platform Path Utilities
//!
//! Resolves the host's data directory (~/.truth-detective/) and the files in it.

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

/// Get the user's home directory
pub fn home_dir() -> AppResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| AppError::configuration("Could not determine home directory"))
}

/// Get the Truth Detective directory (~/.truth-detective/)
pub fn truth_detective_dir() -> AppResult<PathBuf> {
    Ok(home_dir()?.join(".truth-detective"))
}

/// Get the host config file path (~/.truth-detective/host.json)
pub fn config_path() -> AppResult<PathBuf> {
    Ok(truth_detective_dir()?.join("host.json"))
}

/// Default directory for persisted extension storage (~/.truth-detective/storage/)
pub fn default_storage_dir() -> AppResult<PathBuf> {
    Ok(truth_detective_dir()?.join("storage"))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
