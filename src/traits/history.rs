//! Append-only history sink.

/// Destination for one human-readable line per processed confirmation.
///
/// There is no read-back and no format contract beyond "one line".
pub trait HistorySink: Send + Sync {
    fn write(&self, message: &str);
}
