//! Local system clock as a time source.

use async_trait::async_trait;

use crate::traits::TimeSource;

/// Unaligned local clock. Use [`crate::auth::TimeAligner`] when the provider's
/// clock may drift from the local one.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

#[async_trait]
impl TimeSource for SystemTimeSource {
    async fn server_time(&self) -> Option<i64> {
        Some(chrono::Utc::now().timestamp())
    }
}
