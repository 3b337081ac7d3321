//! # Error types used by the publisher runtime.
//!
//! This module defines the error enums for each seam of the pipeline:
//!
//! - [`QueueError`] failures visible to producers writing into a queue.
//! - [`SinkError`] failures raised by the topic sink; carries the
//!   transient/permanent classification consumed by the retry layer.
//! - [`WorkerError`] terminal outcomes of a publish worker.
//! - [`RuntimeError`] host lifecycle failures.
//!
//! All types provide `as_label()` for stable snake_case log/metric labels.
//! [`SinkError`] additionally provides `is_transient()`.

use std::time::Duration;

use thiserror::Error;

/// Errors a producer can observe when writing into an event queue.
///
/// Misconfigured channels are *not* errors at this level; the raiser reports
/// them through the event bus and returns `false` to the producer.
#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum QueueError {
    /// The queue was closed for writes; remaining items drain to the reader.
    #[error("queue is closed for writes")]
    Closed,

    /// The cancellation token fired before the operation could complete.
    ///
    /// Expected during shutdown; signals intentional termination rather than
    /// a fault.
    #[error("operation canceled")]
    Canceled,
}

impl QueueError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            QueueError::Closed => "queue_closed",
            QueueError::Canceled => "queue_canceled",
        }
    }
}

/// Errors raised by a [`TopicSink`](crate::TopicSink) publish call.
///
/// The retry layer treats `Throttled`, `Internal`, and `Transport` with
/// status 500 or 503 as transient; everything else is permanent and the
/// batch is dropped after an error-level report.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SinkError {
    /// The topic service rejected the call due to throttling.
    #[error("throttled by the topic service: {message}")]
    Throttled { message: String },

    /// The topic service reported an internal failure.
    #[error("topic service internal error: {message}")]
    Internal { message: String },

    /// Transport-level failure carrying an HTTP-like status code.
    #[error("transport failure (status {status}): {message}")]
    Transport { status: u16, message: String },

    /// The request itself was rejected (bad topic, malformed entry).
    ///
    /// Never retried.
    #[error("request rejected ({code}): {message}")]
    Rejected { code: String, message: String },

    /// The publish was aborted by the cancellation token.
    #[error("publish canceled")]
    Canceled,
}

impl SinkError {
    /// Returns a short stable label.
    pub fn as_label(&self) -> &'static str {
        match self {
            SinkError::Throttled { .. } => "sink_throttled",
            SinkError::Internal { .. } => "sink_internal",
            SinkError::Transport { .. } => "sink_transport",
            SinkError::Rejected { .. } => "sink_rejected",
            SinkError::Canceled => "sink_canceled",
        }
    }

    /// Indicates whether a retry may succeed.
    ///
    /// Transient: throttling, service-internal errors, and transport
    /// failures with status 500 or 503.
    pub fn is_transient(&self) -> bool {
        match self {
            SinkError::Throttled { .. } | SinkError::Internal { .. } => true,
            SinkError::Transport { status, .. } => matches!(status, 500 | 503),
            _ => false,
        }
    }
}

/// Terminal outcome of a publish worker.
///
/// Sink failures never terminate a worker; after retries are exhausted the
/// batch is dropped and the drain loop continues. Only cancellation and
/// serialization failures end the task.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum WorkerError {
    /// An event in the batch could not be serialized to JSON.
    ///
    /// Fails the entire batch and terminates the worker.
    #[error("failed to serialize event for entry {entry_id}: {source}")]
    Serialization {
        /// Batch-local id of the offending entry.
        entry_id: String,
        #[source]
        source: serde_json::Error,
    },

    /// The worker was canceled during shutdown.
    ///
    /// This is **not an error** in the traditional sense; the host swallows
    /// it when draining workers.
    #[error("worker canceled")]
    Canceled,
}

impl WorkerError {
    /// Returns a short stable label.
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkerError::Serialization { .. } => "worker_serialization",
            WorkerError::Canceled => "worker_canceled",
        }
    }
}

/// Errors produced by the publisher host lifecycle.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// `start` was called while the workers were already running.
    #[error("publisher already started")]
    AlreadyStarted,

    /// `stop` was called without a preceding `start`.
    #[error("publisher is not running")]
    NotStarted,

    /// Shutdown grace was exceeded; some workers remained stuck and were
    /// force-terminated.
    #[error("shutdown grace {grace:?} exceeded; stuck workers: {stuck:?}")]
    GraceExceeded {
        /// The fixed shutdown grace.
        grace: Duration,
        /// Names of the workers that did not stop in time.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::AlreadyStarted => "runtime_already_started",
            RuntimeError::NotStarted => "runtime_not_started",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}
