//! Data model shared by the store, the engine and event subscribers.

pub mod confirmation;

pub use confirmation::{
    ConfirmationId, ConfirmationItem, ConfirmationStatus, ConfirmationType, RemoteConfirmation,
};
