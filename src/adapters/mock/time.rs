//! Deterministic clock and code generator for testing.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::CodeError;
use crate::traits::{CodeGenerator, TimeSource};

/// Time source returning a settable instant, or nothing.
#[derive(Debug, Clone)]
pub struct FixedTimeSource {
    time: Arc<Mutex<Option<i64>>>,
}

impl FixedTimeSource {
    pub fn new(time: i64) -> Self {
        Self {
            time: Arc::new(Mutex::new(Some(time))),
        }
    }

    /// A source whose aligned time can never be determined.
    pub fn unavailable() -> Self {
        Self {
            time: Arc::new(Mutex::new(None)),
        }
    }

    pub fn set_time(&self, time: Option<i64>) {
        *self.time.lock() = time;
    }
}

#[async_trait]
impl TimeSource for FixedTimeSource {
    async fn server_time(&self) -> Option<i64> {
        *self.time.lock()
    }
}

/// Code generator returning the same code for every input.
#[derive(Debug, Clone)]
pub struct FixedCodeGenerator {
    code: String,
    calls: Arc<Mutex<Vec<(String, i64)>>>,
}

impl FixedCodeGenerator {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// `(shared_secret, server_time)` of every generate call.
    pub fn calls(&self) -> Vec<(String, i64)> {
        self.calls.lock().clone()
    }
}

impl CodeGenerator for FixedCodeGenerator {
    fn generate(&self, shared_secret: &str, server_time: i64) -> Result<String, CodeError> {
        self.calls
            .lock()
            .push((shared_secret.to_string(), server_time));
        Ok(self.code.clone())
    }
}
