//! Engine construction and loop errors.

use thiserror::Error;

use super::category::ErrorCategory;

/// Errors surfaced by [`crate::engine::PollingEngine`] outside of the
/// state/notification surface.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The engine cannot relogin without a password.
    #[error("Password must not be empty")]
    MissingPassword,

    /// The linked account has no account name to log in with.
    #[error("Linked account has no account name")]
    MissingAccount,

    /// A loop cycle panicked or otherwise failed unexpectedly.
    #[error("Fatal loop error: {0}")]
    Fatal(String),
}

impl EngineError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EngineError::MissingPassword | EngineError::MissingAccount => {
                ErrorCategory::Configuration
            }
            EngineError::Fatal(_) => ErrorCategory::Internal,
        }
    }
}

/// One-time-code generation failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodeError {
    /// The shared secret is not valid base64.
    #[error("Invalid shared secret: {0}")]
    InvalidSecret(String),

    /// Aligned server time could not be obtained.
    #[error("Server time unavailable")]
    TimeUnavailable,
}
