//! Error category classification.
//!
//! Categories drive the engine's handling decisions: whether a failure is
//! absorbed into the consecutive-error budget, routed into session recovery,
//! or treated as an expected stop.

use std::fmt;

/// High-level categorization of errors for handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The session is invalid or expired.
    /// Recovered through refresh and relogin.
    Session,

    /// Connectivity problems talking to the provider.
    /// Transient; counted against the consecutive-error budget.
    Network,

    /// Credential, captcha or one-time-code problems during login.
    /// Not retryable without human input.
    Credentials,

    /// Cooperative cancellation. Not a failure.
    Cancelled,

    /// Unexpected failures (provider bugs, panics inside a cycle).
    Internal,

    /// Missing or invalid configuration.
    Configuration,
}

impl ErrorCategory {
    /// Returns true if an operation failing with this category may succeed
    /// when tried again later without any change on the user's side.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Session | ErrorCategory::Network)
    }

    /// Returns a short label for the category suitable for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Session => "session",
            ErrorCategory::Network => "network",
            ErrorCategory::Credentials => "credentials",
            ErrorCategory::Cancelled => "cancelled",
            ErrorCategory::Internal => "internal",
            ErrorCategory::Configuration => "configuration",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
