//! # Topic sink: the delivery seam.
//!
//! [`TopicSink`] is the only I/O interface the pipeline touches. A sink
//! accepts a batch of up to [`MAX_BATCH_ENTRIES`] pre-serialized entries for
//! one topic and reports, per entry, whether the topic service accepted it.
//!
//! Implementations wrap a real notification service client (for instance an
//! SNS `PublishBatch` call); the crate ships none. A sink must be safe for
//! concurrent use, since every worker holds a handle to it, and should map
//! its client's failures onto [`SinkError`](crate::SinkError) so the retry
//! classifier can distinguish transient from permanent faults.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::SinkError;

/// Maximum number of entries a sink accepts in one publish call.
pub const MAX_BATCH_ENTRIES: usize = 10;

/// One pre-serialized event in a publish batch.
///
/// `id` is the batch-local index rendered as a decimal string ("0".."9");
/// the sink echoes it back so per-entry outcomes can be correlated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    /// Batch-local identifier.
    pub id: String,
    /// JSON body of the event.
    pub message: String,
}

/// An entry the topic service accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccessfulEntry {
    /// Batch-local identifier echoed from the request.
    pub id: String,
    /// Message id assigned by the topic service.
    pub message_id: String,
}

/// An entry the topic service rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedEntry {
    /// Batch-local identifier echoed from the request.
    pub id: String,
    /// Service error code (for example "InvalidParameter").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Per-batch publish result: two disjoint entry lists.
#[derive(Debug, Clone, Default)]
pub struct PublishOutcome {
    /// Entries the service accepted.
    pub successful: Vec<SuccessfulEntry>,
    /// Entries the service rejected.
    pub failed: Vec<FailedEntry>,
}

/// Client for a topic-based notification service.
#[async_trait]
pub trait TopicSink: Send + Sync + 'static {
    /// Publishes up to [`MAX_BATCH_ENTRIES`] entries to `topic`.
    ///
    /// A whole-call failure returns `Err`; per-entry rejections come back in
    /// the outcome's `failed` list. Implementations should observe `ctx` and
    /// return [`SinkError::Canceled`] promptly when it fires.
    async fn publish_batch(
        &self,
        topic: &str,
        entries: Vec<BatchEntry>,
        ctx: &CancellationToken,
    ) -> Result<PublishOutcome, SinkError>;
}
