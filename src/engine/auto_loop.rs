//! The fetch, auto-process and wait cycle.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{EngineInner, LoopSettings, MAX_ERRORS};
use crate::error::EngineError;
use crate::events::EngineState;

/// Why an auto-loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopExit {
    /// Stopped by its token, a replacement loop, or engine shutdown.
    /// The engine returns to `Ready`.
    Cancelled,
    /// `MAX_ERRORS` consecutive cycles failed. The engine moves to `Error`.
    ErrorBudgetExhausted,
    /// A cycle panicked. The engine moves to `Error`.
    Fatal(EngineError),
}

/// Spawn a loop, cancelling the one started before it.
pub(super) fn start(
    inner: &Arc<EngineInner>,
    settings: LoopSettings,
    cancel: CancellationToken,
) -> JoinHandle<LoopExit> {
    let token = inner.shutdown.child_token();
    if let Some(previous) = inner.auto_token.lock().replace(token.clone()) {
        debug!("Replacing running auto-loop");
        previous.cancel();
    }
    *inner.loop_settings.lock() = settings;

    // Forward the caller's cancellation to the loop's own token.
    let linked = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => linked.cancel(),
            _ = linked.cancelled() => {}
        }
    });

    let inner = Arc::clone(inner);
    tokio::spawn(async move { inner.run_loop(token, settings).await })
}

impl EngineInner {
    async fn run_loop(&self, token: CancellationToken, settings: LoopSettings) -> LoopExit {
        // Wait for a previous loop to wind down before taking the slot.
        let _slot = tokio::select! {
            slot = self.loop_slot.lock() => slot,
            _ = token.cancelled() => return LoopExit::Cancelled,
        };
        info!(
            "Auto-loop started (timeout: {}s, auto-confirm: {}, action: {})",
            settings.timeout_secs, settings.auto_confirm, settings.action
        );

        let timeout = std::time::Duration::from_secs(settings.timeout_secs);
        let mut errors = 0;
        let exit = loop {
            if token.is_cancelled() {
                break LoopExit::Cancelled;
            }

            match AssertUnwindSafe(self.run_cycle(&token, &settings))
                .catch_unwind()
                .await
            {
                Ok(true) => errors = 0,
                Ok(false) => {
                    if token.is_cancelled() {
                        break LoopExit::Cancelled;
                    }
                    errors += 1;
                    warn!("Auto-loop cycle failed ({}/{})", errors, MAX_ERRORS);
                    if errors >= MAX_ERRORS {
                        error!("Auto-loop stopping after {} consecutive failures", errors);
                        break LoopExit::ErrorBudgetExhausted;
                    }
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    error!("Auto-loop cycle panicked: {}", message);
                    break LoopExit::Fatal(EngineError::Fatal(message));
                }
            }

            self.set_state(EngineState::Wait);
            tokio::select! {
                _ = token.cancelled() => break LoopExit::Cancelled,
                _ = tokio::time::sleep(timeout) => {}
            }
        };

        // Marks this loop as no longer running and releases the link task.
        token.cancel();
        match &exit {
            LoopExit::Cancelled => self.set_state(EngineState::Ready),
            _ => self.set_state(EngineState::Error),
        }
        info!("Auto-loop stopped: {:?}", exit);
        exit
    }

    /// Fetch, then process whatever is waiting if auto-confirm is on.
    ///
    /// Returns whether the fetch succeeded. Processing failures do not count
    /// against the error budget.
    async fn run_cycle(&self, token: &CancellationToken, settings: &LoopSettings) -> bool {
        if !self.fetch(token).await {
            return false;
        }
        if settings.auto_confirm {
            let waiting = self.store.waiting();
            if !waiting.is_empty() {
                self.process_many(&waiting, settings.action, token).await;
            }
        }
        true
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
