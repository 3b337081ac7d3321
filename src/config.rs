//! # Per-channel publisher configuration.
//!
//! [`ChannelConfig`] describes one event type's binding to a remote topic:
//! the topic identifier, the retry budget, the queue sizing, and optional
//! per-channel overrides for the resilience policy and the sink client.
//!
//! # Example
//! ```
//! use eventcast::ChannelConfig;
//!
//! let mut cfg = ChannelConfig::new("arn:aws:sns:us-east-1:123456789012:order-events-topic");
//! cfg.max_retry_attempts = 5;
//! cfg.bounded_capacity = 10_000;
//!
//! assert!(cfg.use_bounded_capacity);
//! assert_eq!(cfg.max_retry_attempts, 5);
//! ```

use std::fmt;
use std::sync::Arc;

use crate::policies::ResiliencePolicy;
use crate::sink::TopicSink;

/// Default retry budget for transient sink failures.
pub const DEFAULT_MAX_RETRY_ATTEMPTS: u32 = 3;

/// Default queue depth when bounded.
pub const DEFAULT_BOUNDED_CAPACITY: usize = 1_000_000;

/// Configuration for one event channel (queue + worker + topic binding).
///
/// Channels are configured before the host starts; the directory is not
/// mutated in steady state.
#[derive(Clone)]
pub struct ChannelConfig {
    /// Remote topic identifier the worker publishes to.
    pub topic_id: String,
    /// Retry budget for transient failures (`0` = no retries).
    pub max_retry_attempts: u32,
    /// Switch between a bounded and an unbounded queue.
    pub use_bounded_capacity: bool,
    /// Queue depth when bounded.
    pub bounded_capacity: usize,
    /// Optional resilience policy override for this channel.
    pub policy: Option<Arc<dyn ResiliencePolicy>>,
    /// Optional sink client override for this channel.
    pub sink: Option<Arc<dyn TopicSink>>,
}

impl ChannelConfig {
    /// Creates a configuration for `topic_id` with the defaults:
    /// - `max_retry_attempts = 3`
    /// - `use_bounded_capacity = true`
    /// - `bounded_capacity = 1_000_000`
    /// - no policy or sink override
    pub fn new(topic_id: impl Into<String>) -> Self {
        Self {
            topic_id: topic_id.into(),
            max_retry_attempts: DEFAULT_MAX_RETRY_ATTEMPTS,
            use_bounded_capacity: true,
            bounded_capacity: DEFAULT_BOUNDED_CAPACITY,
            policy: None,
            sink: None,
        }
    }
}

impl fmt::Debug for ChannelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelConfig")
            .field("topic_id", &self.topic_id)
            .field("max_retry_attempts", &self.max_retry_attempts)
            .field("use_bounded_capacity", &self.use_bounded_capacity)
            .field("bounded_capacity", &self.bounded_capacity)
            .field("policy", &self.policy.as_ref().map(|_| "<override>"))
            .field("sink", &self.sink.as_ref().map(|_| "<override>"))
            .finish()
    }
}
