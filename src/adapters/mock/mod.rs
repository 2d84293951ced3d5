//! Mock implementations for testing.
//!
//! Test doubles for every collaborator the engine consumes, so engine
//! behaviour can be exercised without a network, a clock or a file system.
//!
//! # Available Mocks
//!
//! - [`MockProvider`] - scripted list/login/refresh responses with call recording
//! - [`InMemoryHistory`] - captured history lines
//! - [`InMemorySettings`] - in-memory settings storage
//! - [`FixedTimeSource`] / [`FixedCodeGenerator`] - deterministic codes

pub mod history;
pub mod provider;
pub mod settings;
pub mod time;

pub use history::InMemoryHistory;
pub use provider::{LoginBehavior, MockProvider, RecordedAction};
pub use settings::InMemorySettings;
pub use time::{FixedCodeGenerator, FixedTimeSource};
