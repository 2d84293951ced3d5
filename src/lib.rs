//! confpoll - confirmation polling and session resilience.
//!
//! A long-lived engine that keeps a queue of pending remote confirmations in
//! sync, optionally accepts or declines them unattended, and keeps a single
//! authenticated session alive through refresh and bounded relogin.
//!
//! The engine is a library boundary. Presentation, credential storage and
//! the provider's wire protocol are supplied by the application through the
//! traits in [`traits`].

pub mod adapters;
pub mod auth;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod store;
pub mod traits;

pub use config::{EngineConfig, Settings};
pub use engine::{EngineDeps, LoopExit, PollingEngine};
pub use events::{ActionResult, ConfirmationAction, EngineEvent, EngineState};
