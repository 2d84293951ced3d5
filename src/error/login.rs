//! Login and relogin error types.

use thiserror::Error;

use super::category::ErrorCategory;

/// Outcome of a single failed provider login call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoginError {
    #[error("Bad username or password")]
    BadCredentials,

    #[error("Captcha required")]
    NeedCaptcha,

    /// The provider wants a one-time code before it will issue a session.
    #[error("Two-factor code required")]
    NeedTwoFactor,

    #[error("Email code required")]
    NeedEmail,

    #[error("Too many failed login attempts")]
    TooManyFailures,

    #[error("Login failed: {0}")]
    General(String),
}

impl LoginError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LoginError::General(_) => ErrorCategory::Network,
            _ => ErrorCategory::Credentials,
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            LoginError::BadCredentials => "E_LOGIN_BAD_CREDENTIALS",
            LoginError::NeedCaptcha => "E_LOGIN_CAPTCHA",
            LoginError::NeedTwoFactor => "E_LOGIN_2FA",
            LoginError::NeedEmail => "E_LOGIN_EMAIL",
            LoginError::TooManyFailures => "E_LOGIN_TOO_MANY",
            LoginError::General(_) => "E_LOGIN_GENERAL",
        }
    }
}

/// Typed failure of the bounded relogin sequence.
///
/// `SessionGuard::relogin` collapses this into `false`; callers that need the
/// reason use `SessionGuard::try_relogin`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReloginError {
    /// No username is known, so there is nothing to log in with.
    #[error("No credentials available for relogin")]
    NoCredentials,

    /// The caller's cancellation context fired between attempts.
    #[error("Relogin cancelled")]
    Cancelled,

    /// Every attempt was consumed without obtaining a session.
    #[error("Relogin failed after {attempts} attempts")]
    Exhausted {
        attempts: u32,
        last: Option<LoginError>,
    },
}

impl ReloginError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ReloginError::NoCredentials => ErrorCategory::Configuration,
            ReloginError::Cancelled => ErrorCategory::Cancelled,
            ReloginError::Exhausted { .. } => ErrorCategory::Credentials,
        }
    }
}
