//! In-memory settings store for testing.
//!
//! Stores settings in memory so engine code can be tested without touching
//! the file system.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::config::Settings;
use crate::error::SettingsError;
use crate::traits::SettingsStore;

#[derive(Debug, Clone, Default)]
pub struct InMemorySettings {
    /// Stored settings
    settings: Arc<Mutex<Option<Settings>>>,
    /// Whether save should fail
    save_should_fail: Arc<Mutex<bool>>,
    /// Whether clear should fail
    clear_should_fail: Arc<Mutex<bool>>,
}

impl InMemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding initial settings.
    pub fn with_settings(settings: Settings) -> Self {
        let store = Self::default();
        *store.settings.lock() = Some(settings);
        store
    }

    pub fn set_save_should_fail(&self, should_fail: bool) {
        *self.save_should_fail.lock() = should_fail;
    }

    pub fn set_clear_should_fail(&self, should_fail: bool) {
        *self.clear_should_fail.lock() = should_fail;
    }

    /// Current settings, read synchronously.
    pub fn get_settings(&self) -> Option<Settings> {
        self.settings.lock().clone()
    }
}

#[async_trait]
impl SettingsStore for InMemorySettings {
    async fn load(&self) -> Result<Option<Settings>, SettingsError> {
        Ok(self.settings.lock().clone())
    }

    async fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        if *self.save_should_fail.lock() {
            return Err(SettingsError::SaveFailed("Mock save failure".to_string()));
        }
        *self.settings.lock() = Some(settings.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), SettingsError> {
        if *self.clear_should_fail.lock() {
            return Err(SettingsError::ClearFailed("Mock clear failure".to_string()));
        }
        *self.settings.lock() = None;
        Ok(())
    }
}
