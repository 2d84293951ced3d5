//! Settings persistence through the file store.

mod common;

use std::path::PathBuf;
use std::sync::Arc;

use common::*;
use confpoll::adapters::mock::{InMemoryHistory, MockProvider};
use confpoll::adapters::FileSettingsStore;
use confpoll::engine::PollingEngine;
use confpoll::traits::SettingsStore;
use confpoll::{EngineConfig, Settings};
use tempfile::TempDir;

#[tokio::test]
async fn test_engine_seeded_from_saved_settings() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FileSettingsStore::new(dir.path().join("settings.json")));
    store
        .save(&Settings {
            account_file_path: PathBuf::from("maFiles/alice.maFile"),
            password: "correct horse".into(),
            auto_update: true,
            auto_confirm: true,
            timeout: 120,
        })
        .await
        .unwrap();

    let settings = store.load().await.unwrap().expect("settings saved");
    let config = EngineConfig::from_settings(&settings);
    assert_eq!(config.timeout_secs, 99);

    let provider = Arc::new(MockProvider::new());
    let history = Arc::new(InMemoryHistory::new());
    let engine = PollingEngine::new(
        test_deps(&provider, &history).with_settings_store(store.clone()),
        test_account(),
        test_session(),
        settings.password.clone(),
        config,
    )
    .unwrap();

    engine.save_settings(false, true, 15).await;
    let saved = store.load().await.unwrap().unwrap();
    assert_eq!(saved.account_file_path, PathBuf::from("maFiles/alice.maFile"));
    assert!(!saved.auto_update);
    assert_eq!(saved.timeout, 15);

    engine.clear_settings().await;
    assert!(store.load().await.unwrap().is_none());
}

#[tokio::test]
async fn test_save_failure_does_not_propagate() {
    let dir = TempDir::new().unwrap();
    // A directory where the file should be makes every write fail.
    let path = dir.path().join("settings.json");
    std::fs::create_dir(&path).unwrap();

    let provider = Arc::new(MockProvider::new());
    let history = Arc::new(InMemoryHistory::new());
    let engine = PollingEngine::new(
        test_deps(&provider, &history).with_settings_store(Arc::new(FileSettingsStore::new(&path))),
        test_account(),
        test_session(),
        "pw",
        EngineConfig::default(),
    )
    .unwrap();

    engine.save_settings(true, true, 30).await;
    assert!(path.is_dir());
}
