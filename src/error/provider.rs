//! Errors reported by the remote confirmation provider.

use thiserror::Error;

use super::category::ErrorCategory;

/// Failure of a provider call other than login.
///
/// The engine only distinguishes session failures (which trigger the
/// refresh/relogin path) from everything else (which fails the fetch).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider rejected the session token.
    #[error("Session invalid: {0}")]
    SessionInvalid(String),

    /// The session token is past its lifetime.
    #[error("Session expired: {0}")]
    SessionExpired(String),

    /// Transport-level failure.
    #[error("Network error: {0}")]
    Network(String),

    /// Any other provider failure.
    #[error("Provider error: {0}")]
    Other(String),
}

impl ProviderError {
    /// Whether this error should be answered with session recovery.
    pub fn is_session_error(&self) -> bool {
        matches!(
            self,
            ProviderError::SessionInvalid(_) | ProviderError::SessionExpired(_)
        )
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ProviderError::SessionInvalid(_) | ProviderError::SessionExpired(_) => {
                ErrorCategory::Session
            }
            ProviderError::Network(_) => ErrorCategory::Network,
            ProviderError::Other(_) => ErrorCategory::Internal,
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            ProviderError::SessionInvalid(_) => "E_PROVIDER_SESSION_INVALID",
            ProviderError::SessionExpired(_) => "E_PROVIDER_SESSION_EXPIRED",
            ProviderError::Network(_) => "E_PROVIDER_NETWORK",
            ProviderError::Other(_) => "E_PROVIDER_OTHER",
        }
    }
}
