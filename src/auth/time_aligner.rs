//! Provider-aligned clock.
//!
//! One-time codes only validate inside the provider's 30-second window, so
//! local time is corrected by an offset measured against the provider's clock.
//! The offset is measured lazily on first use and cached until `realign`.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::traits::{ConfirmationProvider, TimeSource};

pub struct TimeAligner {
    provider: Arc<dyn ConfirmationProvider>,
    offset: Mutex<Option<i64>>,
}

impl TimeAligner {
    pub fn new(provider: Arc<dyn ConfirmationProvider>) -> Self {
        Self {
            provider,
            offset: Mutex::new(None),
        }
    }

    /// Measured offset in seconds (provider minus local), if aligned.
    pub fn offset(&self) -> Option<i64> {
        *self.offset.lock()
    }

    /// Measure the offset again.
    pub async fn realign(&self) -> Option<i64> {
        let local = chrono::Utc::now().timestamp();
        match self.provider.server_time().await {
            Ok(remote) => {
                let offset = remote - local;
                debug!("TimeAligner offset: {}s", offset);
                *self.offset.lock() = Some(offset);
                Some(offset)
            }
            Err(e) => {
                warn!("TimeAligner failed to query server time: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl TimeSource for TimeAligner {
    async fn server_time(&self) -> Option<i64> {
        let offset = match self.offset() {
            Some(offset) => offset,
            None => self.realign().await?,
        };
        Some(chrono::Utc::now().timestamp() + offset)
    }
}
