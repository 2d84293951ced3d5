//! Confirmation model types.
//!
//! A [`ConfirmationItem`] pairs the provider-assigned identity of a pending
//! confirmation with its local processing status. Items are shared behind
//! `Arc` between the store, processing batches and event subscribers, so the
//! status lives in an atomic and only ever moves forward.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

/// Kind of remote action awaiting confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationType {
    Unknown,
    Generic,
    Trade,
    MarketSell,
    FeatureOptOut,
    PhoneNumberChange,
    AccountRecovery,
    ApiKeyCreation,
    JoinFamily,
}

impl ConfirmationType {
    /// Map the provider's integer type code.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => ConfirmationType::Generic,
            2 => ConfirmationType::Trade,
            3 => ConfirmationType::MarketSell,
            4 => ConfirmationType::FeatureOptOut,
            5 => ConfirmationType::PhoneNumberChange,
            6 => ConfirmationType::AccountRecovery,
            9 => ConfirmationType::ApiKeyCreation,
            11 => ConfirmationType::JoinFamily,
            _ => ConfirmationType::Unknown,
        }
    }
}

impl fmt::Display for ConfirmationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConfirmationType::Unknown => "Unknown",
            ConfirmationType::Generic => "GenericConfirmation",
            ConfirmationType::Trade => "Trade",
            ConfirmationType::MarketSell => "MarketSellTransaction",
            ConfirmationType::FeatureOptOut => "FeatureOptOut",
            ConfirmationType::PhoneNumberChange => "PhoneNumberChange",
            ConfirmationType::AccountRecovery => "AccountRecovery",
            ConfirmationType::ApiKeyCreation => "ApiKeyCreation",
            ConfirmationType::JoinFamily => "JoinSteamFamily",
        };
        f.write_str(name)
    }
}

/// Local processing status of a confirmation.
///
/// Legal transitions: `Waiting -> Processing -> {Accepted, Declined, Unknown}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ConfirmationStatus {
    Waiting = 0,
    Processing = 1,
    Accepted = 2,
    Declined = 3,
    /// The provider call failed; the remote outcome is not known.
    Unknown = 4,
}

impl ConfirmationStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ConfirmationStatus::Waiting,
            1 => ConfirmationStatus::Processing,
            2 => ConfirmationStatus::Accepted,
            3 => ConfirmationStatus::Declined,
            _ => ConfirmationStatus::Unknown,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConfirmationStatus::Accepted | ConfirmationStatus::Declined | ConfirmationStatus::Unknown
        )
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(&self, next: ConfirmationStatus) -> bool {
        match self {
            ConfirmationStatus::Waiting => next == ConfirmationStatus::Processing,
            ConfirmationStatus::Processing => next.is_terminal(),
            _ => false,
        }
    }
}

/// Identity of a confirmation: `(id, key, creator_id)`.
///
/// Type, status and ordinal are deliberately not part of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConfirmationId {
    pub id: u64,
    pub key: u64,
    pub creator_id: u64,
}

/// A confirmation as reported by the provider's list call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfirmation {
    pub id: u64,
    /// Confirmation nonce
    pub key: u64,
    /// The action that created the confirmation
    pub creator_id: u64,
    #[serde(rename = "type")]
    pub kind: ConfirmationType,
}

impl RemoteConfirmation {
    pub fn new(id: u64, key: u64, creator_id: u64, kind: ConfirmationType) -> Self {
        Self {
            id,
            key,
            creator_id,
            kind,
        }
    }

    pub fn identity(&self) -> ConfirmationId {
        ConfirmationId {
            id: self.id,
            key: self.key,
            creator_id: self.creator_id,
        }
    }
}

/// A pending confirmation tracked by the engine.
#[derive(Debug)]
pub struct ConfirmationItem {
    remote: RemoteConfirmation,
    ordinal: usize,
    status: AtomicU8,
}

impl ConfirmationItem {
    /// Create a waiting item with the given display ordinal.
    pub fn new(remote: RemoteConfirmation, ordinal: usize) -> Self {
        Self {
            remote,
            ordinal,
            status: AtomicU8::new(ConfirmationStatus::Waiting as u8),
        }
    }

    pub fn id(&self) -> u64 {
        self.remote.id
    }

    pub fn key(&self) -> u64 {
        self.remote.key
    }

    pub fn creator_id(&self) -> u64 {
        self.remote.creator_id
    }

    pub fn kind(&self) -> ConfirmationType {
        self.remote.kind
    }

    /// Display sequence number assigned at insertion.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn identity(&self) -> ConfirmationId {
        self.remote.identity()
    }

    /// The provider-side record, as needed by accept/deny calls.
    pub fn remote(&self) -> &RemoteConfirmation {
        &self.remote
    }

    pub fn status(&self) -> ConfirmationStatus {
        ConfirmationStatus::from_u8(self.status.load(Ordering::SeqCst))
    }

    /// Move the status forward to `next`.
    ///
    /// Returns `false` and leaves the status untouched if the transition is
    /// not legal from the current status (including a concurrent winner).
    pub fn transition(&self, next: ConfirmationStatus) -> bool {
        let mut current = self.status.load(Ordering::SeqCst);
        loop {
            if !ConfirmationStatus::from_u8(current).can_transition_to(next) {
                return false;
            }
            match self.status.compare_exchange(
                current,
                next as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }
}

impl PartialEq for ConfirmationItem {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for ConfirmationItem {}

impl std::hash::Hash for ConfirmationItem {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl fmt::Display for ConfirmationItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Confirmation ID:{} Key:{} Creator:{} Type:{}",
            self.remote.id, self.remote.key, self.remote.creator_id, self.remote.kind
        )
    }
}
