//! Error types for the confirmation engine.
//!
//! Every recoverable condition is absorbed at an operation boundary and turned
//! into a state transition, a boolean result or a notification. The types
//! here exist so that those boundaries can log precisely and so that callers
//! who want more than a boolean can ask for it.
//!
//! | Type | Raised by | Category |
//! |------|-----------|----------|
//! | [`ProviderError`] | confirmation list / refresh calls | Session, Network, Internal |
//! | [`LoginError`] | a single provider login call | Credentials |
//! | [`ReloginError`] | the bounded relogin sequence | Credentials, Cancelled |
//! | [`EngineError`] | engine construction, fatal loop exits | Configuration, Internal |
//! | [`SettingsError`] | settings store adapters | - |
//! | [`CodeError`] | one-time-code generation | - |

mod category;
mod engine;
mod login;
mod provider;
mod settings;

pub use category::ErrorCategory;
pub use engine::{CodeError, EngineError};
pub use login::{LoginError, ReloginError};
pub use provider::ProviderError;
pub use settings::SettingsError;
