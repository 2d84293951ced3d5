//! Fetch cycle and session recovery.

use chrono::Local;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{EngineInner, FlagGuard, MAX_FETCH_ATTEMPTS};
use crate::error::ProviderError;
use crate::events::{ActionResult, EngineEvent, EngineState};
use crate::models::RemoteConfirmation;

enum FetchFailure {
    Cancelled,
    Provider(ProviderError),
    SessionUnrecovered(ProviderError),
}

impl EngineInner {
    /// One fetch cycle under the fetch lock.
    ///
    /// A session error triggers refresh, then relogin, and the list call is
    /// retried while attempts remain. Any other provider error fails the
    /// cycle immediately.
    pub(super) async fn fetch(&self, cancel: &CancellationToken) -> bool {
        let _fetch = self.fetch_lock.lock().await;
        let _updating = FlagGuard::raise(&self.updating);
        self.set_state(EngineState::ConfirmationUpdating);

        match self.list_with_recovery(cancel).await {
            Ok(confirmations) => {
                let listed = confirmations.len();
                let added = confirmations
                    .into_iter()
                    .filter_map(|remote| self.store.add(remote))
                    .count();
                *self.last_update.lock() = Some(Local::now());
                self.set_state(EngineState::ConfirmationUpdated);
                if added > 0 {
                    self.events.publish(EngineEvent::ConfirmationsBatch {
                        action: ActionResult::Added,
                        count: added,
                    });
                }
                info!("Fetched {} confirmations, {} new", listed, added);
                true
            }
            Err(FetchFailure::Cancelled) => {
                debug!("Fetch cancelled");
                false
            }
            Err(FetchFailure::Provider(e)) => {
                error!("Fetch failed [{}]: {}", e.error_code(), e);
                self.set_state(EngineState::ConfirmationError);
                false
            }
            Err(FetchFailure::SessionUnrecovered(e)) => {
                error!("Fetch failed, session could not be recovered: {}", e);
                self.set_state(EngineState::ConfirmationError);
                false
            }
        }
    }

    async fn list_with_recovery(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<RemoteConfirmation>, FetchFailure> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            if self.stopped(cancel) {
                return Err(FetchFailure::Cancelled);
            }

            // Each attempt picks up whatever session recovery installed.
            let session = self.guard.session();
            let error = match self
                .provider
                .list_confirmations(&session, self.guard.account())
                .await
            {
                Ok(confirmations) => return Ok(confirmations),
                Err(e) if e.is_session_error() => e,
                Err(e) => return Err(FetchFailure::Provider(e)),
            };

            warn!(
                "Fetch attempt {}/{} hit a session error: {}",
                attempt, MAX_FETCH_ATTEMPTS, error
            );
            if attempt >= MAX_FETCH_ATTEMPTS {
                return Err(FetchFailure::SessionUnrecovered(error));
            }
            if !self.recover_session(cancel).await {
                if self.stopped(cancel) {
                    return Err(FetchFailure::Cancelled);
                }
                return Err(FetchFailure::SessionUnrecovered(error));
            }
        }
    }

    /// Refresh the session, falling back to a full relogin.
    pub(super) async fn recover_session(&self, cancel: &CancellationToken) -> bool {
        self.set_state(EngineState::SessionRefreshing);
        if self.guard.refresh_session().await {
            self.set_state(EngineState::SessionRefreshed);
            return true;
        }

        self.set_state(EngineState::Relogin);
        let recovered = self.guard.relogin(&self.password, cancel).await;
        if recovered {
            self.set_state(EngineState::ReloginSuccess);
        } else {
            self.set_state(EngineState::ReloginError);
        }
        recovered
    }
}
