//! Engine configuration.
//!
//! [`EngineConfig`] is what the engine runs with; [`Settings`] is what a
//! settings store persists. `EngineConfig::from_settings` bridges the two.
//!
//! # Example
//!
//! ```ignore
//! use confpoll::config::EngineConfig;
//!
//! let config = EngineConfig::default()
//!     .with_timeout_secs(60)
//!     .with_auto_update(true)
//!     .with_auto_confirm(true);
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::events::ConfirmationAction;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const MIN_TIMEOUT_SECS: u64 = 5;
pub const MAX_TIMEOUT_SECS: u64 = 99;

/// Clamp a wait timeout into the supported range.
pub fn clamp_timeout(secs: u64) -> u64 {
    secs.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Wait between auto-loop cycles (default: 30, clamped to [5, 99])
    pub timeout_secs: u64,
    /// Start the auto-loop from `start_configured` (default: false)
    pub auto_update: bool,
    /// Process waiting confirmations after each successful fetch (default: false)
    pub auto_confirm: bool,
    /// Action applied by auto-confirm (default: Accept)
    pub action: ConfirmationAction,
    /// Linked account file recorded when settings are saved
    pub account_file_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            auto_update: false,
            auto_confirm: false,
            action: ConfirmationAction::Accept,
            account_file_path: None,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the wait between cycles. Out-of-range values are clamped.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = clamp_timeout(secs);
        self
    }

    pub fn with_auto_update(mut self, auto_update: bool) -> Self {
        self.auto_update = auto_update;
        self
    }

    pub fn with_auto_confirm(mut self, auto_confirm: bool) -> Self {
        self.auto_confirm = auto_confirm;
        self
    }

    pub fn with_action(mut self, action: ConfirmationAction) -> Self {
        self.action = action;
        self
    }

    pub fn with_account_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.account_file_path = Some(path.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Seed a config from persisted settings. Auto-confirm always accepts.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::default()
            .with_timeout_secs(settings.timeout)
            .with_auto_update(settings.auto_update)
            .with_auto_confirm(settings.auto_confirm)
            .with_account_file_path(settings.account_file_path.clone())
    }
}

/// Persisted engine settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub account_file_path: PathBuf,
    pub password: String,
    #[serde(default)]
    pub auto_update: bool,
    #[serde(default)]
    pub auto_confirm: bool,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("account_file_path", &self.account_file_path)
            .field("auto_update", &self.auto_update)
            .field("auto_confirm", &self.auto_confirm)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.timeout_secs, 30);
        assert!(!config.auto_update);
        assert!(!config.auto_confirm);
        assert_eq!(config.action, ConfirmationAction::Accept);
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_timeout_is_clamped() {
        assert_eq!(EngineConfig::new().with_timeout_secs(1).timeout_secs, 5);
        assert_eq!(EngineConfig::new().with_timeout_secs(500).timeout_secs, 99);
        assert_eq!(EngineConfig::new().with_timeout_secs(45).timeout_secs, 45);
    }

    #[test]
    fn test_from_settings() {
        let settings = Settings {
            account_file_path: PathBuf::from("account.json"),
            password: "secret".into(),
            auto_update: true,
            auto_confirm: true,
            timeout: 2,
        };
        let config = EngineConfig::from_settings(&settings);
        assert!(config.auto_update);
        assert!(config.auto_confirm);
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.account_file_path, Some(PathBuf::from("account.json")));
    }

    #[test]
    fn test_settings_defaults_on_missing_fields() {
        let json = r#"{"account_file_path":"a.json","password":"p"}"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.timeout, 30);
        assert!(!settings.auto_update);
    }

    #[test]
    fn test_settings_debug_hides_password() {
        let settings = Settings {
            account_file_path: PathBuf::from("a.json"),
            password: "hunter2".into(),
            auto_update: false,
            auto_confirm: false,
            timeout: 30,
        };
        assert!(!format!("{:?}", settings).contains("hunter2"));
    }
}
