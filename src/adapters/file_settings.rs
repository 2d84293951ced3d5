//! JSON file settings store.
//!
//! Settings live in a single pretty-printed JSON file. A missing or
//! unreadable file loads as "nothing stored" so a damaged file never blocks
//! startup.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::SettingsError;
use crate::traits::SettingsStore;

/// Default settings file name, relative to the working directory.
pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under the user's config directory (`<config>/confpoll/settings.json`).
    ///
    /// Returns `None` if the config directory cannot be determined.
    pub fn in_config_dir() -> Option<Self> {
        let dir = dirs::config_dir()?.join("confpoll");
        Some(Self::new(dir.join(DEFAULT_SETTINGS_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_json_path(&self) -> bool {
        self.path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
    }
}

impl Default for FileSettingsStore {
    fn default() -> Self {
        Self::new(DEFAULT_SETTINGS_FILE)
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn load(&self) -> Result<Option<Settings>, SettingsError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let file = File::open(&self.path)?;
        match serde_json::from_reader(BufReader::new(file)) {
            Ok(settings) => Ok(Some(settings)),
            Err(e) => {
                warn!(
                    "Ignoring unreadable settings file {}: {}",
                    self.path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    async fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, settings)?;
        writer.flush()?;
        debug!("Saved settings to {}", self.path.display());
        Ok(())
    }

    async fn clear(&self) -> Result<(), SettingsError> {
        if !self.is_json_path() {
            return Err(SettingsError::ClearFailed(format!(
                "refusing to delete non-json path {}",
                self.path.display()
            )));
        }
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SettingsError::ClearFailed(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn settings() -> Settings {
        Settings {
            account_file_path: PathBuf::from("accounts/alice.json"),
            password: "pw".into(),
            auto_update: true,
            auto_confirm: true,
            timeout: 60,
        }
    }

    #[tokio::test]
    async fn test_missing_file_loads_none() {
        let dir = TempDir::new().unwrap();
        let store = FileSettingsStore::new(dir.path().join("settings.json"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = FileSettingsStore::new(dir.path().join("nested/settings.json"));

        store.save(&settings()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(settings()));
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        let store = FileSettingsStore::new(&path);
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_removes_file_and_tolerates_missing() {
        let dir = TempDir::new().unwrap();
        let store = FileSettingsStore::new(dir.path().join("settings.json"));
        store.save(&settings()).await.unwrap();

        store.clear().await.unwrap();
        assert!(!store.path().exists());
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_clear_refuses_non_json_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.txt");
        fs::write(&path, "keep me").unwrap();

        let store = FileSettingsStore::new(&path);
        assert!(matches!(
            store.clear().await,
            Err(SettingsError::ClearFailed(_))
        ));
        assert!(path.exists());
    }

    #[test]
    fn test_default_path() {
        assert_eq!(
            FileSettingsStore::default().path(),
            Path::new("settings.json")
        );
    }
}
