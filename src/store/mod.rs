//! Ordered, deduplicated confirmation store.
//!
//! Insertion order is display order. Items are keyed by
//! [`ConfirmationId`], so re-reporting a known confirmation is a no-op.
//! Readers never hold the lock while iterating: [`ConfirmationStore::snapshot_of`]
//! copies the matching `Arc`s out, and the copy stays valid while the store
//! keeps changing underneath it.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::trace;

use crate::events::{ActionResult, EngineEvent, EventBus};
use crate::models::{ConfirmationId, ConfirmationItem, ConfirmationStatus, RemoteConfirmation};

#[derive(Debug)]
pub struct ConfirmationStore {
    items: RwLock<IndexMap<ConfirmationId, Arc<ConfirmationItem>>>,
    events: EventBus,
}

impl ConfirmationStore {
    /// Create an empty store publishing "added" notifications on `events`.
    pub fn new(events: EventBus) -> Self {
        Self {
            items: RwLock::new(IndexMap::new()),
            events,
        }
    }

    /// Insert a confirmation unless one with the same identity is present.
    ///
    /// Returns the new item, or `None` when the add was a no-op. Only a real
    /// insertion publishes an `Added` notification.
    pub fn add(&self, remote: RemoteConfirmation) -> Option<Arc<ConfirmationItem>> {
        let item = {
            let mut items = self.items.write();
            let identity = remote.identity();
            if items.contains_key(&identity) {
                return None;
            }
            let item = Arc::new(ConfirmationItem::new(remote, items.len() + 1));
            items.insert(identity, Arc::clone(&item));
            item
        };

        trace!("ConfirmationStore added {}", item);
        self.events.publish(EngineEvent::Confirmation {
            action: ActionResult::Added,
            item: Arc::clone(&item),
        });
        Some(item)
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    pub fn contains(&self, identity: &ConfirmationId) -> bool {
        self.items.read().contains_key(identity)
    }

    pub fn get(&self, identity: &ConfirmationId) -> Option<Arc<ConfirmationItem>> {
        self.items.read().get(identity).cloned()
    }

    /// Independent list of every item, in display order.
    pub fn snapshot(&self) -> Vec<Arc<ConfirmationItem>> {
        self.items.read().values().cloned().collect()
    }

    /// Independent list of the items matching `predicate`, in display order.
    pub fn snapshot_of<F>(&self, predicate: F) -> Vec<Arc<ConfirmationItem>>
    where
        F: Fn(&ConfirmationItem) -> bool,
    {
        self.items
            .read()
            .values()
            .filter(|item| predicate(item))
            .cloned()
            .collect()
    }

    /// Items still waiting for a decision.
    pub fn waiting(&self) -> Vec<Arc<ConfirmationItem>> {
        self.snapshot_of(|item| item.status() == ConfirmationStatus::Waiting)
    }

    /// Discard every item and return how many were removed.
    ///
    /// Outstanding `Arc`s keep working; their status is not touched.
    pub fn clear(&self) -> usize {
        let mut items = self.items.write();
        let removed = items.len();
        items.clear();
        removed
    }
}
