//! Remote confirmation provider contract.
//!
//! The provider owns the wire protocol. The engine only sees confirmations,
//! sessions and the typed errors in [`crate::error`].

use std::fmt;

use async_trait::async_trait;

use crate::auth::{LinkedAccount, Session};
use crate::error::{LoginError, ProviderError};
use crate::models::RemoteConfirmation;

/// Arguments of one provider login call.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    /// One-time code, present when answering a two-factor challenge.
    pub two_factor_code: Option<String>,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("two_factor_code", &self.two_factor_code.is_some())
            .finish_non_exhaustive()
    }
}

/// Trait for the remote two-factor confirmation queue.
///
/// Every call receives the session it should use explicitly, so a session
/// replaced mid-flight by the guard is never observed half-updated.
#[async_trait]
pub trait ConfirmationProvider: Send + Sync {
    /// List pending confirmations in provider order.
    async fn list_confirmations(
        &self,
        session: &Session,
        account: &LinkedAccount,
    ) -> Result<Vec<RemoteConfirmation>, ProviderError>;

    /// Accept a confirmation, signed by `account`. Returns whether the
    /// provider reported success.
    async fn accept(
        &self,
        session: &Session,
        account: &LinkedAccount,
        confirmation: &RemoteConfirmation,
    ) -> bool;

    /// Deny a confirmation, signed by `account`.
    async fn deny(
        &self,
        session: &Session,
        account: &LinkedAccount,
        confirmation: &RemoteConfirmation,
    ) -> bool;

    /// Exchange the refresh token for a fresh session.
    async fn refresh_session(&self, session: &Session) -> Result<Session, ProviderError>;

    /// Credential login. Fails with [`LoginError::NeedTwoFactor`] when a
    /// one-time code is required and none (or a wrong one) was supplied.
    async fn login(&self, request: &LoginRequest) -> Result<Session, LoginError>;

    /// The provider's clock, as unix seconds.
    async fn server_time(&self) -> Result<i64, ProviderError> {
        Ok(chrono::Utc::now().timestamp())
    }
}
