//! Accepting and declining confirmations.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::{EngineInner, FlagGuard};
use crate::events::{ActionResult, ConfirmationAction, EngineEvent, EngineState};
use crate::models::{ConfirmationItem, ConfirmationStatus};

impl EngineInner {
    /// Process a batch sequentially under the process lock.
    ///
    /// Cancellation is checked before each item. An item already handed to
    /// the provider always finishes.
    pub(super) async fn process_many(
        &self,
        items: &[Arc<ConfirmationItem>],
        action: ConfirmationAction,
        cancel: &CancellationToken,
    ) -> bool {
        let _process = self.process_lock.lock().await;
        let _processing = FlagGuard::raise(&self.processing);
        self.set_state(EngineState::ConfirmationProcessing);

        let mut succeeded = 0;
        let mut all_succeeded = true;
        for (index, item) in items.iter().enumerate() {
            if self.stopped(cancel) {
                info!(
                    "Processing cancelled, {} of {} items not started",
                    items.len() - index,
                    items.len()
                );
                all_succeeded = false;
                break;
            }
            if self.process_one(item, action).await {
                succeeded += 1;
            } else {
                all_succeeded = false;
            }
        }

        self.events.publish(EngineEvent::ConfirmationsBatch {
            action: action.success_result(),
            count: succeeded,
        });
        self.set_state(EngineState::ConfirmationProcessed);
        info!("{} {} of {} confirmations", action, succeeded, items.len());
        all_succeeded
    }

    /// Accept or decline one item, moving it to a terminal status.
    ///
    /// A provider call that panics still leaves the item `Unknown` with a
    /// history line before the panic continues.
    pub(super) async fn process_one(
        &self,
        item: &Arc<ConfirmationItem>,
        action: ConfirmationAction,
    ) -> bool {
        if !item.transition(ConfirmationStatus::Processing) {
            debug!("Skipping {}: status is {:?}", item, item.status());
            return false;
        }

        let session = self.guard.session();
        let account = self.guard.account();
        trace!("{} {}...", action, item);
        let call = async {
            match action {
                ConfirmationAction::Accept => self.provider.accept(&session, account, item.remote()).await,
                ConfirmationAction::Decline => self.provider.deny(&session, account, item.remote()).await,
            }
        };
        let (success, panicked) = match AssertUnwindSafe(call).catch_unwind().await {
            Ok(success) => (success, None),
            Err(payload) => (false, Some(payload)),
        };

        let (status, result) = match (success, action) {
            (true, ConfirmationAction::Accept) => (ConfirmationStatus::Accepted, ActionResult::Accept),
            (true, ConfirmationAction::Decline) => (ConfirmationStatus::Declined, ActionResult::Decline),
            (false, _) => (ConfirmationStatus::Unknown, ActionResult::Error),
        };
        item.transition(status);

        let outcome = if success { "Success" } else { "Failed" };
        if success {
            info!("{} {}: {}", item, action, outcome);
        } else {
            warn!("{} {}: {}", item, action, outcome);
        }
        self.history.write(&format!("{} {}: {}", item, action, outcome));

        self.events.publish(EngineEvent::Confirmation {
            action: result,
            item: Arc::clone(item),
        });
        if let Some(payload) = panicked {
            panic::resume_unwind(payload);
        }
        success
    }
}
