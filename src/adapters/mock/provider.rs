//! Scriptable confirmation provider for testing.
//!
//! Responses are queued per call kind and fall back to a configurable
//! default once the queue is empty. Every call is recorded so tests can
//! assert on counts, ordering and the session that was used.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::auth::{LinkedAccount, Session};
use crate::error::{LoginError, ProviderError};
use crate::events::ConfirmationAction;
use crate::models::RemoteConfirmation;
use crate::traits::{ConfirmationProvider, LoginRequest};

/// How `login` answers once its scripted queue is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginBehavior {
    /// Issue a session for any request.
    Succeed,
    /// Challenge with `NeedTwoFactor` until the request carries this code.
    RequireCode(String),
    /// Always fail with this error.
    Fail(LoginError),
}

/// A recorded accept/deny call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedAction {
    pub action: ConfirmationAction,
    pub confirmation_id: u64,
    pub access_token: String,
}

/// Mock provider for testing.
///
/// # Example
///
/// ```ignore
/// use confpoll::adapters::mock::MockProvider;
///
/// let provider = MockProvider::new();
/// provider.push_list(Err(ProviderError::SessionExpired("token".into())));
/// provider.set_default_list(vec![RemoteConfirmation::new(1, 2, 3, ConfirmationType::Trade)]);
///
/// // ...drive the engine...
///
/// assert_eq!(provider.list_calls(), 2);
/// assert_eq!(provider.refresh_calls(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    list_responses: Arc<Mutex<VecDeque<Result<Vec<RemoteConfirmation>, ProviderError>>>>,
    default_list: Arc<Mutex<Result<Vec<RemoteConfirmation>, ProviderError>>>,
    list_delay: Arc<Mutex<Option<Duration>>>,
    list_sessions: Arc<Mutex<Vec<Session>>>,
    active_lists: Arc<AtomicUsize>,
    max_concurrent_lists: Arc<AtomicUsize>,
    panic_on_list: Arc<Mutex<bool>>,
    refresh_responses: Arc<Mutex<VecDeque<Result<Session, ProviderError>>>>,
    refresh_calls: Arc<AtomicUsize>,
    login_responses: Arc<Mutex<VecDeque<Result<Session, LoginError>>>>,
    login_behavior: Arc<Mutex<LoginBehavior>>,
    login_requests: Arc<Mutex<Vec<LoginRequest>>>,
    accept_result: Arc<Mutex<bool>>,
    deny_result: Arc<Mutex<bool>>,
    action_delay: Arc<Mutex<Option<Duration>>>,
    panic_on_action: Arc<Mutex<bool>>,
    actions: Arc<Mutex<Vec<RecordedAction>>>,
    server_time_offset: Arc<Mutex<i64>>,
    server_time_error: Arc<Mutex<Option<ProviderError>>>,
    server_time_calls: Arc<AtomicUsize>,
}

impl MockProvider {
    /// Create a provider that lists nothing, accepts everything and lets
    /// every login and refresh succeed.
    pub fn new() -> Self {
        Self {
            list_responses: Arc::new(Mutex::new(VecDeque::new())),
            default_list: Arc::new(Mutex::new(Ok(Vec::new()))),
            list_delay: Arc::new(Mutex::new(None)),
            list_sessions: Arc::new(Mutex::new(Vec::new())),
            active_lists: Arc::new(AtomicUsize::new(0)),
            max_concurrent_lists: Arc::new(AtomicUsize::new(0)),
            panic_on_list: Arc::new(Mutex::new(false)),
            refresh_responses: Arc::new(Mutex::new(VecDeque::new())),
            refresh_calls: Arc::new(AtomicUsize::new(0)),
            login_responses: Arc::new(Mutex::new(VecDeque::new())),
            login_behavior: Arc::new(Mutex::new(LoginBehavior::Succeed)),
            login_requests: Arc::new(Mutex::new(Vec::new())),
            accept_result: Arc::new(Mutex::new(true)),
            deny_result: Arc::new(Mutex::new(true)),
            action_delay: Arc::new(Mutex::new(None)),
            panic_on_action: Arc::new(Mutex::new(false)),
            actions: Arc::new(Mutex::new(Vec::new())),
            server_time_offset: Arc::new(Mutex::new(0)),
            server_time_error: Arc::new(Mutex::new(None)),
            server_time_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Queue a response for the next list call.
    pub fn push_list(&self, response: Result<Vec<RemoteConfirmation>, ProviderError>) {
        self.list_responses.lock().push_back(response);
    }

    /// Response for list calls once the queue is empty.
    pub fn set_default_list(&self, confirmations: Vec<RemoteConfirmation>) {
        *self.default_list.lock() = Ok(confirmations);
    }

    /// Make every unscripted list call fail with `error`.
    pub fn set_list_error(&self, error: ProviderError) {
        *self.default_list.lock() = Err(error);
    }

    pub fn set_list_delay(&self, delay: Option<Duration>) {
        *self.list_delay.lock() = delay;
    }

    /// Panic inside the list call.
    pub fn set_panic_on_list(&self, panic: bool) {
        *self.panic_on_list.lock() = panic;
    }

    pub fn push_refresh(&self, response: Result<Session, ProviderError>) {
        self.refresh_responses.lock().push_back(response);
    }

    pub fn push_login(&self, response: Result<Session, LoginError>) {
        self.login_responses.lock().push_back(response);
    }

    pub fn set_login_behavior(&self, behavior: LoginBehavior) {
        *self.login_behavior.lock() = behavior;
    }

    pub fn set_accept_result(&self, success: bool) {
        *self.accept_result.lock() = success;
    }

    pub fn set_deny_result(&self, success: bool) {
        *self.deny_result.lock() = success;
    }

    /// Delay applied to every accept/deny call.
    pub fn set_action_delay(&self, delay: Option<Duration>) {
        *self.action_delay.lock() = delay;
    }

    /// Panic inside accept/deny calls, after the call is recorded.
    pub fn set_panic_on_action(&self, panic: bool) {
        *self.panic_on_action.lock() = panic;
    }

    /// Provider clock minus local clock, in seconds.
    pub fn set_server_time_offset(&self, offset: i64) {
        *self.server_time_offset.lock() = offset;
    }

    pub fn set_server_time_error(&self, error: Option<ProviderError>) {
        *self.server_time_error.lock() = error;
    }

    pub fn list_calls(&self) -> usize {
        self.list_sessions.lock().len()
    }

    /// Sessions passed to each list call, in call order.
    pub fn list_sessions(&self) -> Vec<Session> {
        self.list_sessions.lock().clone()
    }

    /// Highest number of list calls observed in flight at once.
    pub fn max_concurrent_lists(&self) -> usize {
        self.max_concurrent_lists.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn login_requests(&self) -> Vec<LoginRequest> {
        self.login_requests.lock().clone()
    }

    pub fn actions(&self) -> Vec<RecordedAction> {
        self.actions.lock().clone()
    }

    pub fn server_time_calls(&self) -> usize {
        self.server_time_calls.load(Ordering::SeqCst)
    }

    async fn record_action(
        &self,
        action: ConfirmationAction,
        session: &Session,
        confirmation: &RemoteConfirmation,
    ) {
        let delay = *self.action_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.actions.lock().push(RecordedAction {
            action,
            confirmation_id: confirmation.id,
            access_token: session.access_token.clone(),
        });
        if *self.panic_on_action.lock() {
            panic!("mock provider action panic");
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Decrements the in-flight list counter even if the call is dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConfirmationProvider for MockProvider {
    async fn list_confirmations(
        &self,
        session: &Session,
        _account: &LinkedAccount,
    ) -> Result<Vec<RemoteConfirmation>, ProviderError> {
        self.list_sessions.lock().push(session.clone());

        let active = self.active_lists.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent_lists.fetch_max(active, Ordering::SeqCst);
        let _in_flight = InFlight(&self.active_lists);

        if *self.panic_on_list.lock() {
            panic!("mock provider list panic");
        }

        let delay = *self.list_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.list_responses.lock().pop_front();
        match scripted {
            Some(response) => response,
            None => self.default_list.lock().clone(),
        }
    }

    async fn accept(
        &self,
        session: &Session,
        _account: &LinkedAccount,
        confirmation: &RemoteConfirmation,
    ) -> bool {
        self.record_action(ConfirmationAction::Accept, session, confirmation)
            .await;
        *self.accept_result.lock()
    }

    async fn deny(
        &self,
        session: &Session,
        _account: &LinkedAccount,
        confirmation: &RemoteConfirmation,
    ) -> bool {
        self.record_action(ConfirmationAction::Decline, session, confirmation)
            .await;
        *self.deny_result.lock()
    }

    async fn refresh_session(&self, session: &Session) -> Result<Session, ProviderError> {
        let call = self.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let scripted = self.refresh_responses.lock().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(Session::new(
                session.account_id,
                format!("refreshed-{}", call),
                session.refresh_token.clone(),
            ))
        })
    }

    async fn login(&self, request: &LoginRequest) -> Result<Session, LoginError> {
        let attempt = {
            let mut requests = self.login_requests.lock();
            requests.push(request.clone());
            requests.len()
        };

        if let Some(response) = self.login_responses.lock().pop_front() {
            return response;
        }

        let behavior = self.login_behavior.lock().clone();
        match behavior {
            LoginBehavior::Succeed => Ok(Session::new(
                1,
                format!("login-{}", attempt),
                format!("login-refresh-{}", attempt),
            )),
            LoginBehavior::RequireCode(code) => {
                if request.two_factor_code.as_deref() == Some(code.as_str()) {
                    Ok(Session::new(
                        1,
                        format!("login-{}", attempt),
                        format!("login-refresh-{}", attempt),
                    ))
                } else {
                    Err(LoginError::NeedTwoFactor)
                }
            }
            LoginBehavior::Fail(error) => Err(error),
        }
    }

    async fn server_time(&self) -> Result<i64, ProviderError> {
        self.server_time_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.server_time_error.lock().clone() {
            return Err(error);
        }
        Ok(chrono::Utc::now().timestamp() + *self.server_time_offset.lock())
    }
}
