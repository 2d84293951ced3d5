//! Confirmation polling engine.
//!
//! [`PollingEngine`] drives the fetch, auto-process and wait cycle against a
//! remote [`ConfirmationProvider`], keeps the [`ConfirmationStore`] current
//! and recovers the session through the [`SessionGuard`] when the provider
//! rejects it.
//!
//! Three independent locks coordinate overlapping work:
//!
//! - the fetch lock serializes every fetch, manual or automatic, and `clear`
//! - the process lock serializes processing batches
//! - the loop slot admits one auto-loop instance at a time
//!
//! State changes are published both on a `watch` channel (latest state only)
//! and as [`EngineEvent::StateChanged`] on the event bus.
//!
//! # Example
//!
//! ```ignore
//! use confpoll::engine::{EngineDeps, PollingEngine};
//!
//! let deps = EngineDeps::new(provider, Arc::new(TracingHistory));
//! let engine = PollingEngine::new(deps, account, session, "password", EngineConfig::default())?;
//! let mut events = engine.subscribe();
//!
//! let handle = engine.start_loop(30, true, ConfirmationAction::Accept, CancellationToken::new());
//! ```

mod auto_loop;
mod fetch;
mod process;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::auth::{Credentials, GuardCodeGenerator, LinkedAccount, Session, SessionGuard, TimeAligner};
use crate::config::{clamp_timeout, EngineConfig, Settings};
use crate::error::EngineError;
use crate::events::{ConfirmationAction, EngineEvent, EngineState, EventBus, EventReceiver};
use crate::models::ConfirmationItem;
use crate::store::ConfirmationStore;
use crate::traits::{CodeGenerator, ConfirmationProvider, HistorySink, SettingsStore, TimeSource};

pub use auto_loop::LoopExit;

/// Consecutive failed cycles after which the auto-loop gives up.
pub const MAX_ERRORS: u32 = 10;

/// Provider list calls allowed per fetch, including retries after session
/// recovery.
pub const MAX_FETCH_ATTEMPTS: u32 = 3;

/// Collaborators injected into the engine.
pub struct EngineDeps {
    pub provider: Arc<dyn ConfirmationProvider>,
    pub history: Arc<dyn HistorySink>,
    pub codes: Arc<dyn CodeGenerator>,
    pub clock: Arc<dyn TimeSource>,
    pub settings: Option<Arc<dyn SettingsStore>>,
}

impl EngineDeps {
    /// Dependencies with the default code generator and a provider-aligned
    /// clock.
    pub fn new(provider: Arc<dyn ConfirmationProvider>, history: Arc<dyn HistorySink>) -> Self {
        let clock = Arc::new(TimeAligner::new(Arc::clone(&provider)));
        Self {
            provider,
            history,
            codes: Arc::new(GuardCodeGenerator::default()),
            clock,
            settings: None,
        }
    }

    pub fn with_code_generator(mut self, codes: Arc<dyn CodeGenerator>) -> Self {
        self.codes = codes;
        self
    }

    pub fn with_time_source(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_settings_store(mut self, settings: Arc<dyn SettingsStore>) -> Self {
        self.settings = Some(settings);
        self
    }
}

/// Parameters of the running (or most recent) auto-loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LoopSettings {
    timeout_secs: u64,
    auto_confirm: bool,
    action: ConfirmationAction,
}

/// Sets a flag for as long as the guard lives.
struct FlagGuard<'a>(&'a AtomicBool);

impl<'a> FlagGuard<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

struct EngineInner {
    provider: Arc<dyn ConfirmationProvider>,
    history: Arc<dyn HistorySink>,
    settings: Option<Arc<dyn SettingsStore>>,
    guard: SessionGuard,
    store: ConfirmationStore,
    events: EventBus,
    state_tx: watch::Sender<EngineState>,
    fetch_lock: tokio::sync::Mutex<()>,
    process_lock: tokio::sync::Mutex<()>,
    loop_slot: tokio::sync::Mutex<()>,
    /// Token of the most recently started auto-loop.
    auto_token: Mutex<Option<CancellationToken>>,
    loop_settings: Mutex<LoopSettings>,
    updating: AtomicBool,
    processing: AtomicBool,
    last_update: Mutex<Option<DateTime<Local>>>,
    password: String,
    config: EngineConfig,
    /// Parent of every token the engine creates.
    shutdown: CancellationToken,
}

impl EngineInner {
    fn set_state(&self, state: EngineState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            info!("Engine state: {} -> {}", previous, state);
        }
        self.events.publish(EngineEvent::StateChanged(state));
    }

    fn state(&self) -> EngineState {
        *self.state_tx.borrow()
    }

    fn stopped(&self, cancel: &CancellationToken) -> bool {
        cancel.is_cancelled() || self.shutdown.is_cancelled()
    }
}

/// Long-lived orchestrator of fetching, processing and session recovery.
///
/// Dropping the engine cancels every loop and batch it started.
pub struct PollingEngine {
    inner: Arc<EngineInner>,
}

impl PollingEngine {
    /// Build an engine for `account`, starting from `session`.
    ///
    /// `password` is kept in memory for relogin. It and the account name must
    /// not be empty.
    pub fn new(
        deps: EngineDeps,
        account: LinkedAccount,
        session: Session,
        password: impl Into<String>,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        let password = password.into();
        if password.is_empty() {
            return Err(EngineError::MissingPassword);
        }
        if account.account_name.is_empty() {
            return Err(EngineError::MissingAccount);
        }

        let credentials = Credentials::new(account.account_name.clone(), password.clone());
        let guard = SessionGuard::new(
            Arc::clone(&deps.provider),
            deps.codes,
            deps.clock,
            account,
            session,
        )
        .with_credentials(credentials);

        let events = EventBus::new();
        let (state_tx, _) = watch::channel(EngineState::Ready);
        let loop_settings = LoopSettings {
            timeout_secs: clamp_timeout(config.timeout_secs),
            auto_confirm: config.auto_confirm,
            action: config.action,
        };

        Ok(Self {
            inner: Arc::new(EngineInner {
                provider: deps.provider,
                history: deps.history,
                settings: deps.settings,
                guard,
                store: ConfirmationStore::new(events.clone()),
                events,
                state_tx,
                fetch_lock: tokio::sync::Mutex::new(()),
                process_lock: tokio::sync::Mutex::new(()),
                loop_slot: tokio::sync::Mutex::new(()),
                auto_token: Mutex::new(None),
                loop_settings: Mutex::new(loop_settings),
                updating: AtomicBool::new(false),
                processing: AtomicBool::new(false),
                last_update: Mutex::new(None),
                password,
                config,
                shutdown: CancellationToken::new(),
            }),
        })
    }

    /// Start the auto-loop if the engine was configured with auto-update.
    pub fn start_configured(&self) -> Option<JoinHandle<LoopExit>> {
        let config = &self.inner.config;
        if !config.auto_update {
            return None;
        }
        Some(self.start_loop(
            config.timeout_secs,
            config.auto_confirm,
            config.action,
            CancellationToken::new(),
        ))
    }

    /// Single fetch cycle. Returns whether the fetch succeeded.
    pub async fn fetch_once(&self) -> bool {
        let shutdown = self.inner.shutdown.clone();
        self.inner.fetch(&shutdown).await
    }

    /// Process `items` in order under the process lock.
    ///
    /// Returns true only if every item was dispatched and the provider
    /// reported success for each.
    pub async fn process_many(
        &self,
        items: &[Arc<ConfirmationItem>],
        action: ConfirmationAction,
        cancel: &CancellationToken,
    ) -> bool {
        self.inner.process_many(items, action, cancel).await
    }

    /// Process every item currently waiting.
    pub async fn process_waiting(
        &self,
        action: ConfirmationAction,
        cancel: &CancellationToken,
    ) -> bool {
        let waiting = self.inner.store.waiting();
        self.inner.process_many(&waiting, action, cancel).await
    }

    /// Accept or decline a single item.
    ///
    /// Returns false without calling the provider if the item is not waiting.
    pub async fn process_one(
        &self,
        item: &Arc<ConfirmationItem>,
        action: ConfirmationAction,
    ) -> bool {
        self.inner.process_one(item, action).await
    }

    /// Start the auto-loop, replacing any loop started earlier.
    ///
    /// The loop stops when `cancel` fires, when [`PollingEngine::stop_loop`]
    /// or [`PollingEngine::shutdown`] is called, when the error budget is
    /// exhausted, or when a cycle panics. Must be called inside a tokio
    /// runtime.
    pub fn start_loop(
        &self,
        timeout_secs: u64,
        auto_confirm: bool,
        action: ConfirmationAction,
        cancel: CancellationToken,
    ) -> JoinHandle<LoopExit> {
        let settings = LoopSettings {
            timeout_secs: clamp_timeout(timeout_secs),
            auto_confirm,
            action,
        };
        auto_loop::start(&self.inner, settings, cancel)
    }

    /// Cancel the running auto-loop, if any.
    pub fn stop_loop(&self) {
        if let Some(token) = self.inner.auto_token.lock().as_ref() {
            token.cancel();
        }
    }

    /// Remove every item from the store.
    pub async fn clear(&self) {
        let _fetch = self.inner.fetch_lock.lock().await;
        let removed = self.inner.store.clear();
        info!("Cleared {} confirmations", removed);
    }

    /// Current one-time code, or an empty string if it cannot be derived.
    pub async fn guard_code(&self) -> String {
        match self.inner.guard.one_time_code().await {
            Ok(code) => code,
            Err(e) => {
                warn!("Failed to generate one-time code: {}", e);
                String::new()
            }
        }
    }

    /// Seconds until [`PollingEngine::guard_code`] changes.
    pub async fn seconds_until_change(&self) -> Option<i64> {
        self.inner.guard.seconds_until_code_change().await
    }

    /// Persist the engine's settings. Failures are logged, not raised.
    pub async fn save_settings(&self, auto_update: bool, auto_confirm: bool, timeout_secs: u64) {
        let Some(store) = &self.inner.settings else {
            return;
        };
        let settings = Settings {
            account_file_path: self.inner.config.account_file_path.clone().unwrap_or_default(),
            password: self.inner.password.clone(),
            auto_update,
            auto_confirm,
            timeout: clamp_timeout(timeout_secs),
        };
        if let Err(e) = store.save(&settings).await {
            warn!("Failed to save settings: {}", e);
        }
    }

    /// Remove persisted settings. Failures are logged, not raised.
    pub async fn clear_settings(&self) {
        let Some(store) = &self.inner.settings else {
            return;
        };
        if let Err(e) = store.clear().await {
            warn!("Failed to clear settings: {}", e);
        }
    }

    /// Cancel every loop and batch started by this engine.
    ///
    /// Final: loops started afterwards stop immediately.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }

    pub fn state(&self) -> EngineState {
        self.inner.state()
    }

    pub fn state_receiver(&self) -> watch::Receiver<EngineState> {
        self.inner.state_tx.subscribe()
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.inner.events.subscribe()
    }

    pub fn store(&self) -> &ConfirmationStore {
        &self.inner.store
    }

    pub fn session_guard(&self) -> &SessionGuard {
        &self.inner.guard
    }

    /// Time of the last successful fetch.
    pub fn last_update(&self) -> Option<DateTime<Local>> {
        *self.inner.last_update.lock()
    }

    pub fn is_update_in_process(&self) -> bool {
        self.inner.updating.load(Ordering::SeqCst)
    }

    pub fn is_processing(&self) -> bool {
        self.inner.processing.load(Ordering::SeqCst)
    }

    /// Whether an auto-loop is running and has not been asked to stop.
    pub fn is_auto_update(&self) -> bool {
        self.inner
            .auto_token
            .lock()
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }

    pub fn auto_confirm(&self) -> bool {
        self.inner.loop_settings.lock().auto_confirm
    }

    pub fn timeout_secs(&self) -> u64 {
        self.inner.loop_settings.lock().timeout_secs
    }

    pub fn action(&self) -> ConfirmationAction {
        self.inner.loop_settings.lock().action
    }
}

impl Drop for PollingEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
