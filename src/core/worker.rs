//! # Publish worker: drains one queue into batched sink calls.
//!
//! [`PublishWorker<T>`] is the long-lived task behind one event channel. It
//! reads events from the channel's queue, coalesces them into batches of up
//! to ten, serializes each event to JSON, and publishes the batch to the
//! topic sink under the channel's resilience policy.
//!
//! ## Drain loop
//! ```text
//! loop {
//!   ├─► wait_to_read (cancellable)
//!   │     ├─► end-of-stream ──► exit Ok
//!   │     └─► canceled ──────► exit (buffer may be discarded)
//!   └─► while try_read() ──► buf.push(item)
//!         └─► flush when |buf| == 10  or  try_peek() == false
//!               ├─► serialize each event (failure kills the worker)
//!               ├─► publish via retry wrapper
//!               ├─► report: BatchPublished / EntryRejected per entry
//!               └─► permanent failure ──► PublishFailed, batch dropped,
//!                                         loop continues
//! }
//! ```
//!
//! The flush-on-peek-empty rule is what keeps latency low under light
//! traffic: a single event is published the moment the queue briefly drains
//! instead of waiting for nine more. Under load the buffer fills to ten and
//! batches form naturally. It also means the buffer is always empty when the
//! loop re-enters `wait_to_read`, so closing the queue never strands a
//! partial batch.
//!
//! ## Rules
//! - Batches are submitted in coalescing order; entries carry their
//!   batch-local index as id ("0".."9").
//! - Failed entries are reported, **never re-enqueued**; delivery is
//!   at-least-once and the error report is the contract.
//! - Sink failures never terminate the worker. Only cancellation and
//!   serialization failures do.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::error::{SinkError, WorkerError};
use crate::events::{Bus, Event, EventKind};
use crate::policies::ResiliencePolicy;
use crate::queue::QueueReader;
use crate::raiser::short_type_name;
use crate::sink::{BatchEntry, PublishOutcome, TopicSink, MAX_BATCH_ENTRIES};

/// Boxed future returned by [`Worker::spawn`].
pub type BoxWorkerFuture = Pin<Box<dyn Future<Output = Result<(), WorkerError>> + Send + 'static>>;

/// Asynchronous, cancelable drain task supervised by the host.
///
/// Each `spawn` call creates a fresh, independent future; the host spawns
/// one per `start` and may spawn again after a stop. Implementations must
/// observe the token promptly to enable graceful shutdown.
pub trait Worker: Send + Sync + 'static {
    /// Stable name for logs and stuck-worker reporting.
    fn name(&self) -> &str;

    /// Creates the future that drains until end-of-stream or cancellation.
    fn spawn(&self, ctx: CancellationToken) -> BoxWorkerFuture;
}

/// Worker publishing events of type `T` to one topic.
pub struct PublishWorker<T> {
    name: &'static str,
    topic: String,
    reader: Arc<Mutex<QueueReader<T>>>,
    sink: Arc<dyn TopicSink>,
    policy: Arc<dyn ResiliencePolicy>,
    bus: Bus,
}

impl<T> Clone for PublishWorker<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            topic: self.topic.clone(),
            reader: Arc::clone(&self.reader),
            sink: Arc::clone(&self.sink),
            policy: Arc::clone(&self.policy),
            bus: self.bus.clone(),
        }
    }
}

impl<T> PublishWorker<T>
where
    T: Serialize + Send + 'static,
{
    /// Creates a worker draining `reader` into `topic` through `sink`.
    pub fn new(
        reader: QueueReader<T>,
        topic: impl Into<String>,
        sink: Arc<dyn TopicSink>,
        policy: Arc<dyn ResiliencePolicy>,
        bus: Bus,
    ) -> Self {
        Self {
            name: short_type_name::<T>(),
            topic: topic.into(),
            reader: Arc::new(Mutex::new(reader)),
            sink,
            policy,
            bus,
        }
    }

    /// Remote topic this worker publishes to.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    async fn run(self, ctx: CancellationToken) -> Result<(), WorkerError> {
        self.bus.publish(
            Event::now(EventKind::WorkerStarted)
                .with_channel(self.name)
                .with_topic(self.topic.as_str()),
        );

        let mut reader = self.reader.lock().await;
        let result = self.drain(&mut reader, &ctx).await;

        match &result {
            Ok(()) | Err(WorkerError::Canceled) => {
                // Cancellation is a graceful exit, same as end-of-stream.
                self.bus
                    .publish(Event::now(EventKind::WorkerStopped).with_channel(self.name));
            }
            Err(err) => {
                self.bus.publish(
                    Event::now(EventKind::WorkerFailed)
                        .with_channel(self.name)
                        .with_error(err.to_string()),
                );
            }
        }
        result
    }

    async fn drain(
        &self,
        reader: &mut QueueReader<T>,
        ctx: &CancellationToken,
    ) -> Result<(), WorkerError> {
        let mut buf: Vec<T> = Vec::with_capacity(MAX_BATCH_ENTRIES);
        loop {
            match reader.wait_to_read(ctx).await {
                Ok(true) => {}
                Ok(false) => return Ok(()),
                // Cancellation is the only error a reader observes. Items
                // still buffered are not guaranteed to be published.
                Err(_) => return Err(WorkerError::Canceled),
            }

            while let Some(item) = reader.try_read() {
                buf.push(item);
                if buf.len() >= MAX_BATCH_ENTRIES || !reader.try_peek() {
                    self.flush(&mut buf, ctx).await?;
                }
            }
        }
    }

    /// Publishes the buffered events as one batch and clears the buffer.
    async fn flush(&self, buf: &mut Vec<T>, ctx: &CancellationToken) -> Result<(), WorkerError> {
        if buf.is_empty() {
            return Ok(());
        }

        let entries = self.encode(buf)?;
        let result = self.publish_with_retry(entries, ctx).await;
        buf.clear();

        match result {
            Ok(outcome) => {
                self.report(outcome);
                Ok(())
            }
            Err(SinkError::Canceled) => Err(WorkerError::Canceled),
            Err(err) => {
                // The batch is dropped: re-queuing would risk unbounded
                // duplication during a partial outage and break the
                // bounded-memory property.
                self.bus.publish(
                    Event::now(EventKind::PublishFailed)
                        .with_channel(self.name)
                        .with_topic(self.topic.as_str())
                        .with_error(err.to_string()),
                );
                Ok(())
            }
        }
    }

    // Serialization failure for any event fails the entire batch and
    // terminates the worker.
    fn encode(&self, buf: &[T]) -> Result<Vec<BatchEntry>, WorkerError> {
        let mut entries = Vec::with_capacity(buf.len());
        for (i, event) in buf.iter().enumerate() {
            let id = i.to_string();
            match serde_json::to_string(event) {
                Ok(message) => entries.push(BatchEntry { id, message }),
                Err(source) => {
                    self.bus.publish(
                        Event::now(EventKind::SerializationFailed)
                            .with_channel(self.name)
                            .with_entry(id.clone())
                            .with_error(source.to_string()),
                    );
                    return Err(WorkerError::Serialization {
                        entry_id: id,
                        source,
                    });
                }
            }
        }
        Ok(entries)
    }

    async fn publish_with_retry(
        &self,
        entries: Vec<BatchEntry>,
        ctx: &CancellationToken,
    ) -> Result<PublishOutcome, SinkError> {
        let mut attempt: u32 = 0;
        loop {
            let err = match self
                .sink
                .publish_batch(&self.topic, entries.clone(), ctx)
                .await
            {
                Ok(outcome) => return Ok(outcome),
                Err(SinkError::Canceled) => return Err(SinkError::Canceled),
                Err(err) => err,
            };

            if attempt >= self.policy.max_attempts() || !self.policy.should_retry(&err) {
                return Err(err);
            }

            attempt += 1;
            let delay = self.policy.delay(attempt);
            self.bus.publish(
                Event::now(EventKind::RetryScheduled)
                    .with_channel(self.name)
                    .with_topic(self.topic.as_str())
                    .with_attempt(attempt)
                    .with_delay(delay)
                    .with_error(err.to_string()),
            );

            let sleep = time::sleep(delay);
            tokio::pin!(sleep);
            tokio::select! {
                _ = &mut sleep => {}
                _ = ctx.cancelled() => return Err(SinkError::Canceled),
            }
        }
    }

    fn report(&self, outcome: PublishOutcome) {
        if !outcome.successful.is_empty() {
            self.bus.publish(
                Event::now(EventKind::BatchPublished)
                    .with_channel(self.name)
                    .with_topic(self.topic.as_str())
                    .with_count(outcome.successful.len()),
            );
        }
        for entry in outcome.failed {
            self.bus.publish(
                Event::now(EventKind::EntryRejected)
                    .with_channel(self.name)
                    .with_topic(self.topic.as_str())
                    .with_entry(entry.id)
                    .with_code(entry.code)
                    .with_error(entry.message),
            );
        }
    }
}

impl<T> Worker for PublishWorker<T>
where
    T: Serialize + Send + 'static,
{
    fn name(&self) -> &str {
        self.name
    }

    fn spawn(&self, ctx: CancellationToken) -> BoxWorkerFuture {
        let worker = self.clone();
        Box::pin(async move { worker.run(ctx).await })
    }
}
