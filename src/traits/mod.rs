//! Collaborator contracts consumed by the engine.
//!
//! The engine receives every collaborator at construction; nothing is looked
//! up through globals. Production adapters live in [`crate::adapters`],
//! test doubles in [`crate::adapters::mock`].
//!
//! # Traits
//!
//! - [`ConfirmationProvider`] - remote confirmation queue and login primitives
//! - [`CodeGenerator`] - one-time codes from the linked account's shared secret
//! - [`TimeSource`] - provider-aligned clock
//! - [`HistorySink`] - append-only record of processed confirmations
//! - [`SettingsStore`] - persisted engine settings

pub mod code;
pub mod history;
pub mod provider;
pub mod settings;

pub use code::{CodeGenerator, TimeSource, CODE_PERIOD_SECS};
pub use history::HistorySink;
pub use provider::{ConfirmationProvider, LoginRequest};
pub use settings::SettingsStore;
