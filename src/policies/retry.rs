//! # Retry policy for publish attempts.
//!
//! [`ResiliencePolicy`] decides whether a sink failure is worth retrying and
//! how long to back off before each attempt. The default implementation,
//! [`ExponentialBackoff`], retries only transient failures and waits
//! `2^k` seconds before the k-th retry.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use eventcast::{ExponentialBackoff, ResiliencePolicy};
//!
//! let policy = ExponentialBackoff::new(3);
//!
//! assert_eq!(policy.max_attempts(), 3);
//! assert_eq!(policy.delay(1), Duration::from_secs(2));
//! assert_eq!(policy.delay(2), Duration::from_secs(4));
//! assert_eq!(policy.delay(3), Duration::from_secs(8));
//! ```

use std::time::Duration;

use crate::config::DEFAULT_MAX_RETRY_ATTEMPTS;
use crate::error::SinkError;

/// Classifier plus retry schedule applied around each publish attempt.
///
/// Injectable per channel through
/// [`ChannelConfig::policy`](crate::ChannelConfig); workers consult it after
/// every failed sink call.
pub trait ResiliencePolicy: Send + Sync + 'static {
    /// Retry budget; attempts beyond this surface the last error.
    fn max_attempts(&self) -> u32;

    /// Backoff before retry number `attempt` (starting from 1).
    fn delay(&self, attempt: u32) -> Duration;

    /// Whether `error` is transient enough to retry.
    fn should_retry(&self, error: &SinkError) -> bool {
        error.is_transient()
    }
}

/// Default policy: exponential backoff over transient failures.
///
/// Retries `Throttled`, `Internal`, and transport failures with status 500
/// or 503. With `max_attempts = 0` the first transient failure is treated
/// as permanent.
#[derive(Clone, Copy, Debug)]
pub struct ExponentialBackoff {
    /// Retry budget for transient failures.
    pub max_attempts: u32,
}

impl ExponentialBackoff {
    // Caps the delay at 2^16 seconds so a misconfigured budget cannot
    // overflow the shift.
    const MAX_SHIFT: u32 = 16;

    /// Creates a policy with the given retry budget.
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }
}

impl Default for ExponentialBackoff {
    /// Returns a policy with `max_attempts = 3`.
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRY_ATTEMPTS)
    }
}

impl ResiliencePolicy for ExponentialBackoff {
    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn delay(&self, attempt: u32) -> Duration {
        Duration::from_secs(1u64 << attempt.min(Self::MAX_SHIFT))
    }
}
