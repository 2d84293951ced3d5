//! Settings store trait abstraction.
//!
//! Settings only seed the engine's initial configuration. Implementations
//! include the JSON file store and an in-memory store for tests.

use async_trait::async_trait;

use crate::config::Settings;
use crate::error::SettingsError;

#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Load settings.
    ///
    /// # Returns
    /// - `Ok(Some(settings))` if settings exist and were loaded
    /// - `Ok(None)` if nothing is stored (or what is stored is unreadable)
    /// - `Err(error)` if loading failed for another reason
    async fn load(&self) -> Result<Option<Settings>, SettingsError>;

    /// Persist settings, replacing anything stored before.
    async fn save(&self, settings: &Settings) -> Result<(), SettingsError>;

    /// Remove stored settings.
    async fn clear(&self) -> Result<(), SettingsError>;
}
