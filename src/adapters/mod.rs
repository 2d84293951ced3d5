//! Concrete implementations of trait abstractions.
//!
//! # Adapters
//!
//! - [`FileSettingsStore`] - JSON file settings storage
//! - [`FileHistory`] - timestamped history lines appended to a file
//! - [`TracingHistory`] - history lines on the `history` tracing target
//! - [`SystemTimeSource`] - local clock
//!
//! The remote provider has no production adapter here; applications supply
//! their own [`crate::traits::ConfirmationProvider`].
//!
//! # Mock Implementations
//!
//! The [`mock`] submodule provides test doubles for every collaborator.

pub mod file_settings;
pub mod history;
pub mod mock;
pub mod system_time;

pub use file_settings::{FileSettingsStore, DEFAULT_SETTINGS_FILE};
pub use history::{FileHistory, TracingHistory, HISTORY_TARGET};
pub use system_time::SystemTimeSource;
