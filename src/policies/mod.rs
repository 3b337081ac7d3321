//! Policies applied around publish attempts:
//!  - [`ResiliencePolicy`] classifies failures and schedules retries;
//!  - [`ExponentialBackoff`] the default `2^k`-second schedule.

mod retry;

pub use retry::{ExponentialBackoff, ResiliencePolicy};
