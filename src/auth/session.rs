//! Session and account types owned by the session guard.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Username and password, kept in memory only.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Token bundle identifying an authenticated connection to the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub account_id: u64,
    pub access_token: String,
    pub refresh_token: String,
}

impl Session {
    pub fn new(
        account_id: u64,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            account_id,
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Whether a refresh can even be attempted.
    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token.is_empty()
    }
}

/// Long-lived device binding used for one-time codes and for signing
/// confirmation responses.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedAccount {
    pub account_name: String,
    /// Base64 secret for one-time codes.
    pub shared_secret: String,
    /// Base64 secret for signing confirmation calls.
    pub identity_secret: String,
    #[serde(default)]
    pub device_id: String,
}

impl fmt::Debug for LinkedAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedAccount")
            .field("account_name", &self.account_name)
            .field("device_id", &self.device_id)
            .finish_non_exhaustive()
    }
}
