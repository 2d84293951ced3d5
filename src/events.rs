//! Engine states and the notification surface.
//!
//! The engine publishes [`EngineEvent`]s through an [`EventBus`]. Every
//! subscriber owns an unbounded queue, so a connected subscriber sees every
//! event published after it subscribed, however far behind it reads.
//! Publishing with no subscribers is not an error, and a dropped receiver is
//! pruned on the next publish.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::models::ConfirmationItem;

/// Receiving end handed out by [`EventBus::subscribe`].
pub type EventReceiver = mpsc::UnboundedReceiver<EngineEvent>;

/// State of the polling engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineState {
    /// Idle. Initial state, and the state after a cancelled loop.
    Ready,
    /// Between auto-loop cycles.
    Wait,
    ConfirmationUpdating,
    ConfirmationUpdated,
    ConfirmationError,
    ConfirmationProcessing,
    ConfirmationProcessed,
    SessionRefreshing,
    SessionRefreshed,
    Relogin,
    ReloginSuccess,
    ReloginError,
    /// The auto-loop stopped on failure. The engine can be restarted.
    Error,
}

impl EngineState {
    pub fn is_session_recovery(&self) -> bool {
        matches!(
            self,
            EngineState::SessionRefreshing
                | EngineState::SessionRefreshed
                | EngineState::Relogin
                | EngineState::ReloginSuccess
                | EngineState::ReloginError
        )
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What to do with a confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConfirmationAction {
    #[default]
    Accept,
    Decline,
}

impl ConfirmationAction {
    /// The result reported when the action succeeds.
    pub fn success_result(&self) -> ActionResult {
        match self {
            ConfirmationAction::Accept => ActionResult::Accept,
            ConfirmationAction::Decline => ActionResult::Decline,
        }
    }
}

impl fmt::Display for ConfirmationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Result tag carried by confirmation notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionResult {
    None,
    Fetched,
    Added,
    Accept,
    Decline,
    Error,
}

/// A notification published by the engine.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    StateChanged(EngineState),
    /// Aggregate result of a fetch (`Added`) or a processing batch.
    ConfirmationsBatch { action: ActionResult, count: usize },
    /// Result for a single confirmation.
    Confirmation {
        action: ActionResult,
        item: Arc<ConfirmationItem>,
    },
}

/// Cloneable publishing handle for engine events.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<EngineEvent>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: EngineEvent) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscribe(&self) -> EventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Subscribers still registered. Dropped receivers are counted until
    /// the next publish.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
