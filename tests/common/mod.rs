//! Common test utilities for integration tests.
//!
//! Fixtures for building an engine around the mock collaborators and for
//! inspecting the events it publishes.
//!
//! # Example
//!
//! ```ignore
//! let provider = Arc::new(MockProvider::new());
//! let (engine, history) = build_engine(&provider);
//! let mut rx = engine.subscribe();
//! engine.fetch_once().await;
//! let states = states(&drain_events(&mut rx));
//! ```

#![allow(dead_code)]

use std::sync::Arc;

use confpoll::adapters::mock::{FixedCodeGenerator, FixedTimeSource, InMemoryHistory, MockProvider};
use confpoll::auth::{LinkedAccount, Session};
use confpoll::engine::{EngineDeps, PollingEngine};
use confpoll::events::{ActionResult, EngineEvent, EngineState, EventReceiver};
use confpoll::models::{ConfirmationType, RemoteConfirmation};
use confpoll::EngineConfig;

/// Base64 of the RFC 6238 SHA-1 test secret "12345678901234567890".
pub const RFC_SECRET: &str = "MTIzNDU2Nzg5MDEyMzQ1Njc4OTA=";

pub fn test_account() -> LinkedAccount {
    LinkedAccount {
        account_name: "alice".to_string(),
        shared_secret: RFC_SECRET.to_string(),
        identity_secret: "aWRlbnRpdHk=".to_string(),
        device_id: "android:test-device".to_string(),
    }
}

pub fn test_session() -> Session {
    Session::new(76561198000000000, "initial-access", "initial-refresh")
}

pub fn confirmation(id: u64) -> RemoteConfirmation {
    RemoteConfirmation::new(id, id * 31, id * 7, ConfirmationType::Trade)
}

pub fn confirmations(count: u64) -> Vec<RemoteConfirmation> {
    (1..=count).map(confirmation).collect()
}

pub fn test_deps(provider: &Arc<MockProvider>, history: &Arc<InMemoryHistory>) -> EngineDeps {
    EngineDeps::new(provider.clone(), history.clone())
        .with_code_generator(Arc::new(FixedCodeGenerator::new("CODE1")))
        .with_time_source(Arc::new(FixedTimeSource::new(1_700_000_000)))
}

/// Engine with default configuration over `provider`.
pub fn build_engine(provider: &Arc<MockProvider>) -> (PollingEngine, Arc<InMemoryHistory>) {
    build_engine_with(provider, EngineConfig::default())
}

pub fn build_engine_with(
    provider: &Arc<MockProvider>,
    config: EngineConfig,
) -> (PollingEngine, Arc<InMemoryHistory>) {
    let history = Arc::new(InMemoryHistory::new());
    let engine = PollingEngine::new(
        test_deps(provider, &history),
        test_account(),
        test_session(),
        "correct horse",
        config,
    )
    .expect("engine construction");
    (engine, history)
}

/// Everything currently buffered on `rx`.
pub fn drain_events(rx: &mut EventReceiver) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn states(events: &[EngineEvent]) -> Vec<EngineState> {
    events
        .iter()
        .filter_map(|event| match event {
            EngineEvent::StateChanged(state) => Some(*state),
            _ => None,
        })
        .collect()
}

/// `(action, count)` of every batch event.
pub fn batches(events: &[EngineEvent]) -> Vec<(ActionResult, usize)> {
    events
        .iter()
        .filter_map(|event| match event {
            EngineEvent::ConfirmationsBatch { action, count } => Some((*action, *count)),
            _ => None,
        })
        .collect()
}

/// `(action, confirmation id)` of every per-item event.
pub fn item_results(events: &[EngineEvent]) -> Vec<(ActionResult, u64)> {
    events
        .iter()
        .filter_map(|event| match event {
            EngineEvent::Confirmation { action, item } => Some((*action, item.id())),
            _ => None,
        })
        .collect()
}
