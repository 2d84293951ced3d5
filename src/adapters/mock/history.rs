//! In-memory history sink for testing.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::traits::HistorySink;

/// History sink that keeps every line in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHistory {
    lines: Arc<Mutex<Vec<String>>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every line written so far, oldest first.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }
}

impl HistorySink for InMemoryHistory {
    fn write(&self, message: &str) {
        self.lines.lock().push(message.to_string());
    }
}
