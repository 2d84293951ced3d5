//! One-time code generation and server time contracts.

use async_trait::async_trait;

use crate::error::CodeError;

/// Length of one code window in seconds.
pub const CODE_PERIOD_SECS: i64 = 30;

/// Deterministic one-time code generator.
pub trait CodeGenerator: Send + Sync {
    /// Code for `shared_secret` at `server_time` (unix seconds).
    fn generate(&self, shared_secret: &str, server_time: i64) -> Result<String, CodeError>;

    /// Seconds until the code for `server_time` rolls over.
    fn seconds_until_next_code(&self, server_time: i64) -> i64 {
        CODE_PERIOD_SECS - server_time.rem_euclid(CODE_PERIOD_SECS)
    }
}

/// Source of provider-aligned time.
#[async_trait]
pub trait TimeSource: Send + Sync {
    /// Current aligned time in unix seconds, or `None` if it cannot be
    /// determined.
    async fn server_time(&self) -> Option<i64>;
}
