//! Session ownership and one-time codes.
//!
//! - [`SessionGuard`] owns the current session and recovers it
//! - [`GuardCodeGenerator`] derives one-time codes from a shared secret
//! - [`TimeAligner`] keeps those codes inside the provider's time window

pub mod guard;
pub mod guard_code;
pub mod session;
pub mod time_aligner;

pub use guard::{SessionGuard, MAX_LOGIN_ATTEMPTS, RELOGIN_PACING};
pub use guard_code::{CodeFormat, GuardCodeGenerator};
pub use session::{Credentials, LinkedAccount, Session};
pub use time_aligner::TimeAligner;
