//! Session ownership and recovery.
//!
//! [`SessionGuard`] holds the single current session and the in-memory
//! credentials. When the provider stops accepting the session the engine asks
//! the guard to refresh it, and if that fails, to log in again through a
//! bounded retry loop that answers two-factor challenges with a code derived
//! from the linked account.
//!
//! Attempt accounting: every provider login call consumes one of
//! [`MAX_LOGIN_ATTEMPTS`], including the call that only received a
//! two-factor challenge. A provider that challenges once and then accepts
//! the generated code therefore succeeds on the second call.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::session::{Credentials, LinkedAccount, Session};
use crate::error::{CodeError, LoginError, ReloginError};
use crate::traits::{CodeGenerator, ConfirmationProvider, LoginRequest, TimeSource};

/// Provider login calls allowed per login or relogin sequence.
pub const MAX_LOGIN_ATTEMPTS: u32 = 5;

/// Delay between attempts of the asynchronous login loop.
pub const RELOGIN_PACING: Duration = Duration::from_secs(1);

pub struct SessionGuard {
    provider: Arc<dyn ConfirmationProvider>,
    codes: Arc<dyn CodeGenerator>,
    clock: Arc<dyn TimeSource>,
    account: LinkedAccount,
    credentials: RwLock<Option<Credentials>>,
    session: RwLock<Arc<Session>>,
}

impl SessionGuard {
    pub fn new(
        provider: Arc<dyn ConfirmationProvider>,
        codes: Arc<dyn CodeGenerator>,
        clock: Arc<dyn TimeSource>,
        account: LinkedAccount,
        session: Session,
    ) -> Self {
        Self {
            provider,
            codes,
            clock,
            account,
            credentials: RwLock::new(None),
            session: RwLock::new(Arc::new(session)),
        }
    }

    pub fn with_credentials(self, credentials: Credentials) -> Self {
        *self.credentials.write() = Some(credentials);
        self
    }

    pub fn account(&self) -> &LinkedAccount {
        &self.account
    }

    /// The current session. The returned `Arc` is never mutated; a
    /// replacement installs a new one.
    pub fn session(&self) -> Arc<Session> {
        Arc::clone(&self.session.read())
    }

    pub fn credentials(&self) -> Option<Credentials> {
        self.credentials.read().clone()
    }

    pub fn set_credentials(&self, credentials: Credentials) {
        *self.credentials.write() = Some(credentials);
    }

    fn install_session(&self, session: Session) {
        *self.session.write() = Arc::new(session);
    }

    /// Current one-time code for the linked account.
    pub async fn one_time_code(&self) -> Result<String, CodeError> {
        let time = self
            .clock
            .server_time()
            .await
            .ok_or(CodeError::TimeUnavailable)?;
        self.codes.generate(&self.account.shared_secret, time)
    }

    /// Seconds until the current one-time code changes.
    pub async fn seconds_until_code_change(&self) -> Option<i64> {
        let time = self.clock.server_time().await?;
        Some(self.codes.seconds_until_next_code(time))
    }

    /// Ask the provider to refresh the current session.
    ///
    /// On success the refreshed session is installed. On failure the current
    /// session is left as it is.
    pub async fn refresh_session(&self) -> bool {
        let current = self.session();
        debug!("SessionGuard.refresh_session account={}", current.account_id);
        match self.provider.refresh_session(&current).await {
            Ok(session) => {
                self.install_session(session);
                info!("SessionGuard.refresh_session Result: true");
                true
            }
            Err(e) => {
                warn!("SessionGuard.refresh_session failed: {}", e);
                false
            }
        }
    }

    /// Initial credential login. Stores the credentials on success.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ReloginError> {
        info!("SessionGuard.login...");
        if username.is_empty() || password.is_empty() {
            return Err(ReloginError::NoCredentials);
        }
        let session = self
            .login_loop(username, password, Some(RELOGIN_PACING), Some(cancel))
            .await?;
        self.install_session(session);
        self.set_credentials(Credentials::new(username, password));
        Ok(())
    }

    /// Relogin with `password`, reporting only whether it worked.
    pub async fn relogin(&self, password: &str, cancel: &CancellationToken) -> bool {
        let result = self.try_relogin(password, cancel).await;
        if let Err(e) = &result {
            warn!("SessionGuard.relogin Error: {}", e);
        }
        info!("SessionGuard.relogin Result: {}", result.is_ok());
        result.is_ok()
    }

    /// Relogin with `password`, pacing attempts and stopping early when
    /// `cancel` fires.
    pub async fn try_relogin(
        &self,
        password: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ReloginError> {
        info!("SessionGuard.relogin...");
        let username = self.relogin_username()?;
        let session = self
            .login_loop(&username, password, Some(RELOGIN_PACING), Some(cancel))
            .await?;
        self.install_session(session);
        self.set_credentials(Credentials::new(username, password));
        Ok(())
    }

    /// Blocking relogin for callers outside the async runtime.
    ///
    /// Same attempt accounting as [`SessionGuard::relogin`], without pacing
    /// and without a cancellation context. Must not be called from inside
    /// `runtime`'s own worker threads.
    pub fn relogin_blocking(&self, runtime: &tokio::runtime::Runtime, password: &str) -> bool {
        let result = runtime.block_on(async {
            let username = self.relogin_username()?;
            let session = self.login_loop(&username, password, None, None).await?;
            self.install_session(session);
            self.set_credentials(Credentials::new(username, password));
            Ok::<(), ReloginError>(())
        });
        if let Err(e) = &result {
            warn!("SessionGuard.relogin_blocking Error: {}", e);
        }
        result.is_ok()
    }

    fn relogin_username(&self) -> Result<String, ReloginError> {
        let username = self
            .credentials
            .read()
            .as_ref()
            .map(|c| c.username.clone())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| self.account.account_name.clone());
        if username.is_empty() {
            return Err(ReloginError::NoCredentials);
        }
        Ok(username)
    }

    async fn login_loop(
        &self,
        username: &str,
        password: &str,
        pacing: Option<Duration>,
        cancel: Option<&CancellationToken>,
    ) -> Result<Session, ReloginError> {
        let mut two_factor_code: Option<String> = None;
        let mut last_error: Option<LoginError> = None;

        for attempt in 1..=MAX_LOGIN_ATTEMPTS {
            if attempt > 1 {
                if let Some(delay) = pacing {
                    match cancel {
                        Some(token) => {
                            tokio::select! {
                                _ = token.cancelled() => return Err(ReloginError::Cancelled),
                                _ = tokio::time::sleep(delay) => {}
                            }
                        }
                        None => tokio::time::sleep(delay).await,
                    }
                }
            }
            if cancel.is_some_and(|token| token.is_cancelled()) {
                return Err(ReloginError::Cancelled);
            }

            let request = LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
                two_factor_code: two_factor_code.clone(),
            };
            debug!(
                "SessionGuard login attempt {}/{} (code: {})",
                attempt,
                MAX_LOGIN_ATTEMPTS,
                request.two_factor_code.is_some()
            );

            match self.provider.login(&request).await {
                Ok(session) => {
                    info!("SessionGuard login succeeded on attempt {}", attempt);
                    return Ok(session);
                }
                Err(LoginError::NeedTwoFactor) => {
                    match self.one_time_code().await {
                        Ok(code) => two_factor_code = Some(code),
                        Err(e) => warn!("SessionGuard could not derive one-time code: {}", e),
                    }
                    last_error = Some(LoginError::NeedTwoFactor);
                }
                Err(e) => {
                    warn!(
                        "SessionGuard login attempt {} failed [{}]: {}",
                        attempt,
                        e.error_code(),
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(ReloginError::Exhausted {
            attempts: MAX_LOGIN_ATTEMPTS,
            last: last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{FixedCodeGenerator, FixedTimeSource, LoginBehavior, MockProvider};
    use crate::error::ProviderError;

    fn guard(provider: Arc<MockProvider>) -> SessionGuard {
        SessionGuard::new(
            provider,
            Arc::new(FixedCodeGenerator::new("CODE1")),
            Arc::new(FixedTimeSource::new(1_700_000_000)),
            LinkedAccount {
                account_name: "alice".into(),
                shared_secret: "c2VjcmV0".into(),
                identity_secret: "aWQ=".into(),
                device_id: String::new(),
            },
            Session::new(1, "old-access", "old-refresh"),
        )
    }

    #[tokio::test]
    async fn test_refresh_success_installs_session() {
        let provider = Arc::new(MockProvider::new());
        provider.push_refresh(Ok(Session::new(1, "new-access", "new-refresh")));
        let guard = guard(provider.clone());

        assert!(guard.refresh_session().await);
        assert_eq!(guard.session().access_token, "new-access");
        assert_eq!(provider.refresh_calls(), 1);
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_session() {
        let provider = Arc::new(MockProvider::new());
        provider.push_refresh(Err(ProviderError::SessionExpired("refresh token".into())));
        let guard = guard(provider);

        assert!(!guard.refresh_session().await);
        assert_eq!(guard.session().access_token, "old-access");
    }

    #[tokio::test]
    async fn test_session_snapshot_is_stable_across_replacement() {
        let provider = Arc::new(MockProvider::new());
        provider.push_refresh(Ok(Session::new(1, "new-access", "new-refresh")));
        let guard = guard(provider);

        let before = guard.session();
        guard.refresh_session().await;
        assert_eq!(before.access_token, "old-access");
        assert_eq!(before.refresh_token, "old-refresh");
    }

    #[tokio::test(start_paused = true)]
    async fn test_relogin_answers_two_factor_challenge() {
        let provider = Arc::new(MockProvider::new());
        provider.set_login_behavior(LoginBehavior::RequireCode("CODE1".into()));
        let guard = guard(provider.clone());

        assert!(guard.relogin("pw", &CancellationToken::new()).await);
        let calls = provider.login_requests();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].two_factor_code, None);
        assert_eq!(calls[1].two_factor_code.as_deref(), Some("CODE1"));
        assert_eq!(calls[1].username, "alice");
    }

    #[tokio::test(start_paused = true)]
    async fn test_relogin_bad_credentials_uses_exactly_five_calls() {
        let provider = Arc::new(MockProvider::new());
        provider.set_login_behavior(LoginBehavior::Fail(LoginError::BadCredentials));
        let guard = guard(provider.clone());

        let result = guard.try_relogin("pw", &CancellationToken::new()).await;
        assert_eq!(
            result,
            Err(ReloginError::Exhausted {
                attempts: 5,
                last: Some(LoginError::BadCredentials)
            })
        );
        assert_eq!(provider.login_requests().len(), 5);
        assert_eq!(guard.session().access_token, "old-access");
    }

    #[tokio::test(start_paused = true)]
    async fn test_relogin_always_challenged_counts_every_call() {
        let provider = Arc::new(MockProvider::new());
        provider.set_login_behavior(LoginBehavior::Fail(LoginError::NeedTwoFactor));
        let guard = guard(provider.clone());

        assert!(!guard.relogin("pw", &CancellationToken::new()).await);
        assert_eq!(provider.login_requests().len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_relogin_general_errors_count_toward_budget() {
        let provider = Arc::new(MockProvider::new());
        provider.push_login(Err(LoginError::General("timeout".into())));
        provider.push_login(Err(LoginError::General("timeout".into())));
        provider.push_login(Ok(Session::new(1, "fresh", "fresh-refresh")));
        let guard = guard(provider.clone());

        assert!(guard.relogin("pw", &CancellationToken::new()).await);
        assert_eq!(provider.login_requests().len(), 3);
        assert_eq!(guard.session().access_token, "fresh");
    }

    #[tokio::test(start_paused = true)]
    async fn test_relogin_paces_attempts() {
        let provider = Arc::new(MockProvider::new());
        provider.set_login_behavior(LoginBehavior::Fail(LoginError::BadCredentials));
        let guard = guard(provider);

        let start = tokio::time::Instant::now();
        guard.relogin("pw", &CancellationToken::new()).await;
        // Four gaps between five attempts.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(4) && elapsed < Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_relogin_cancelled_between_attempts() {
        let provider = Arc::new(MockProvider::new());
        provider.set_login_behavior(LoginBehavior::Fail(LoginError::BadCredentials));
        let guard = Arc::new(guard(provider.clone()));
        let cancel = CancellationToken::new();

        let task = {
            let guard = Arc::clone(&guard);
            let cancel = cancel.clone();
            tokio::spawn(async move { guard.try_relogin("pw", &cancel).await })
        };
        tokio::time::sleep(Duration::from_millis(1500)).await;
        cancel.cancel();

        assert_eq!(task.await.unwrap(), Err(ReloginError::Cancelled));
        assert_eq!(provider.login_requests().len(), 2);
    }

    #[test]
    fn test_relogin_blocking_matches_async_accounting() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let provider = Arc::new(MockProvider::new());
        provider.set_login_behavior(LoginBehavior::Fail(LoginError::BadCredentials));
        let guard = guard(provider.clone());

        let start = std::time::Instant::now();
        assert!(!guard.relogin_blocking(&runtime, "pw"));
        assert_eq!(provider.login_requests().len(), 5);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_relogin_blocking_success() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let provider = Arc::new(MockProvider::new());
        provider.set_login_behavior(LoginBehavior::RequireCode("CODE1".into()));
        let guard = guard(provider.clone());

        assert!(guard.relogin_blocking(&runtime, "pw"));
        assert_eq!(provider.login_requests().len(), 2);
        assert_eq!(guard.credentials().unwrap().password, "pw");
    }

    #[tokio::test(start_paused = true)]
    async fn test_relogin_prefers_stored_username() {
        let provider = Arc::new(MockProvider::new());
        let guard = guard(provider.clone()).with_credentials(Credentials::new("bob", "old"));

        assert!(guard.relogin("new", &CancellationToken::new()).await);
        assert_eq!(provider.login_requests()[0].username, "bob");
        assert_eq!(guard.credentials().unwrap().password, "new");
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_rejects_empty_credentials() {
        let provider = Arc::new(MockProvider::new());
        let guard = guard(provider.clone());

        let result = guard.login("", "pw", &CancellationToken::new()).await;
        assert_eq!(result, Err(ReloginError::NoCredentials));
        assert!(provider.login_requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_stores_credentials() {
        let provider = Arc::new(MockProvider::new());
        provider.push_login(Ok(Session::new(9, "a", "r")));
        let guard = guard(provider);

        guard
            .login("carol", "pw", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(guard.credentials().unwrap().username, "carol");
        assert_eq!(guard.session().account_id, 9);
    }

    #[tokio::test]
    async fn test_one_time_code_uses_generator() {
        let provider = Arc::new(MockProvider::new());
        let guard = guard(provider);
        assert_eq!(guard.one_time_code().await.unwrap(), "CODE1");
        assert_eq!(guard.seconds_until_code_change().await, Some(10));
    }
}
