//! # Runtime events emitted by the raiser, workers, and host.
//!
//! [`EventKind`] classifies events across four categories:
//! - **Directory events**: channel registration and routing misses
//! - **Publish events**: batch outcomes, per-entry rejections, retries
//! - **Worker/host lifecycle**: start, stop, failure, shutdown progress
//! - **Observer diagnostics**: lag reports for observers that fall behind
//!
//! The [`Event`] struct carries optional metadata (channel name, topic,
//! batch-local entry id, error text, attempt count, backoff delay) attached
//! through builder-style `with_*` methods.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically, so consumers can re-order events delivered through async
//! channels.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use eventcast::{Event, EventKind};
//!
//! let ev = Event::now(EventKind::RetryScheduled)
//!     .with_channel("OrderCreated")
//!     .with_topic("orders")
//!     .with_attempt(1)
//!     .with_delay(Duration::from_secs(2))
//!     .with_error("topic service internal error");
//!
//! assert_eq!(ev.kind, EventKind::RetryScheduled);
//! assert_eq!(ev.attempt, Some(1));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Observer diagnostics ===
    /// An observer fell behind the bus and skipped its oldest events.
    ///
    /// Delivered only to the lagging observer, never re-published.
    ObserverLagged,

    // === Channel directory ===
    /// A queue was registered for an event type.
    ChannelRegistered,
    /// An event was raised for a type with no registered channel.
    ChannelMissing,
    /// The directory entry for a type did not match its queue type.
    ChannelMismatch,

    // === Publishing ===
    /// A batch (or part of one) was accepted by the sink.
    BatchPublished,
    /// The sink rejected one entry of a batch.
    EntryRejected,
    /// A transient failure scheduled a retry with backoff.
    RetryScheduled,
    /// A batch was dropped after a permanent failure or retry exhaustion.
    PublishFailed,
    /// An event could not be serialized; the worker terminates.
    SerializationFailed,

    // === Worker lifecycle ===
    /// A publish worker began draining its queue.
    WorkerStarted,
    /// A publish worker stopped (end of stream or cancellation).
    WorkerStopped,
    /// A publish worker terminated abnormally.
    WorkerFailed,

    // === Host shutdown ===
    /// Host stop was requested.
    ShutdownRequested,
    /// All workers stopped within the shutdown grace.
    AllStoppedWithin,
    /// Shutdown grace exceeded; stuck workers were force-terminated.
    GraceExceeded,
}

/// Runtime event with optional metadata.
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp (may go backwards, use for logging only).
    pub at: SystemTime,
    /// The kind of event.
    pub kind: EventKind,
    /// Event type name of the channel involved, if applicable.
    pub channel: Option<String>,
    /// Remote topic identifier, if applicable.
    pub topic: Option<String>,
    /// Batch-local entry id ("0".."9"), if the event concerns one entry.
    pub entry_id: Option<String>,
    /// Sink-returned error code, if applicable.
    pub code: Option<String>,
    /// Error message, if the event represents a failure.
    pub error: Option<String>,
    /// Retry attempt count (starting from 1).
    pub attempt: Option<u32>,
    /// Backoff delay before the retry, if relevant.
    pub delay: Option<Duration>,
    /// Number of entries, for aggregate publish reports.
    pub count: Option<usize>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp and
    /// next sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            channel: None,
            topic: None,
            entry_id: None,
            code: None,
            error: None,
            attempt: None,
            delay: None,
            count: None,
        }
    }

    /// Attaches the channel's event type name.
    pub fn with_channel(mut self, name: impl Into<String>) -> Self {
        self.channel = Some(name.into());
        self
    }

    /// Attaches the remote topic identifier.
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Attaches a batch-local entry id.
    pub fn with_entry(mut self, id: impl Into<String>) -> Self {
        self.entry_id = Some(id.into());
        self
    }

    /// Attaches a sink error code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attaches an error message.
    pub fn with_error(mut self, msg: impl Into<String>) -> Self {
        self.error = Some(msg.into());
        self
    }

    /// Attaches a retry attempt count.
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a backoff delay.
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay = Some(d);
        self
    }

    /// Attaches an entry count.
    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(n);
        self
    }
}
