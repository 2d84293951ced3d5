//! Settings store errors.

use thiserror::Error;

/// Settings operation errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Failed to save settings
    #[error("Failed to save settings: {0}")]
    SaveFailed(String),

    /// Failed to clear settings
    #[error("Failed to clear settings: {0}")]
    ClearFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
