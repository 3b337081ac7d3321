//! # eventcast
//!
//! **Eventcast** is an in-process typed event dispatch layer with batched
//! topic publication. Producers hand typed events to a raiser; per-type
//! bounded queues absorb bursts under blocking backpressure; per-type
//! workers drain the queues, coalesce events into batches of up to ten,
//! serialize each event to JSON, and publish the batch to a pluggable topic
//! sink with retries, partial-failure reporting, and a bounded graceful
//! shutdown.
//!
//! ## Features
//!
//! | Area              | Description                                                      | Key types / traits                       |
//! |-------------------|------------------------------------------------------------------|------------------------------------------|
//! | **Dispatch**      | Route typed events to their registered queue.                    | [`EventRaiser`]                          |
//! | **Backpressure**  | Bounded per-type FIFO; writers block while full.                 | [`EventQueue`], [`QueueReader`]          |
//! | **Publication**   | Drain, batch (≤10), serialize, publish, report partial failures. | [`PublishWorker`], [`Worker`]            |
//! | **Resilience**    | Classify transient failures, retry with exponential backoff.     | [`ResiliencePolicy`], [`ExponentialBackoff`] |
//! | **Lifecycle**     | Start workers in the background; stop bounded by a 5 s grace.    | [`PublisherHost`]                        |
//! | **Observability** | Runtime events broadcast to per-observer tasks; built-in log writer. | [`Bus`], [`Event`], [`Observer`], [`LogWriter`] |
//! | **Delivery seam** | The one I/O interface: batched publish to a remote topic.        | [`TopicSink`]                            |
//!
//! Delivery is at-least-once: entries rejected by the sink are reported
//! entry-by-entry and never re-enqueued, and a batch that still fails after
//! retries is dropped with an error report. Events of different types flow
//! through independent streams with no cross-type ordering.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use serde::Serialize;
//! use tokio_util::sync::CancellationToken;
//!
//! use eventcast::{
//!     BatchEntry, Bus, ChannelConfig, EventRaiser, LogWriter, PublishOutcome, PublisherHost,
//!     SinkError, TopicSink,
//! };
//!
//! #[derive(Serialize)]
//! struct OrderCreated {
//!     order_id: String,
//!     amount: f64,
//! }
//!
//! struct NullSink;
//!
//! #[async_trait]
//! impl TopicSink for NullSink {
//!     async fn publish_batch(
//!         &self,
//!         _topic: &str,
//!         entries: Vec<BatchEntry>,
//!         _ctx: &CancellationToken,
//!     ) -> Result<PublishOutcome, SinkError> {
//!         let mut outcome = PublishOutcome::default();
//!         for entry in entries {
//!             outcome.successful.push(eventcast::SuccessfulEntry {
//!                 id: entry.id,
//!                 message_id: "m-0".into(),
//!             });
//!         }
//!         Ok(outcome)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = Bus::new(1024);
//!     let raiser = EventRaiser::new(bus.clone());
//!     let mut host = PublisherHost::new(
//!         bus,
//!         Arc::new(NullSink),
//!         vec![Arc::new(LogWriter) as Arc<dyn eventcast::Observer>],
//!     );
//!
//!     host.add_channel::<OrderCreated>(
//!         &raiser,
//!         ChannelConfig::new("arn:aws:sns:us-east-1:123456789012:order-events-topic"),
//!     );
//!
//!     let ctx = CancellationToken::new();
//!     host.start(&ctx).await?;
//!
//!     raiser
//!         .raise(
//!             OrderCreated {
//!                 order_id: "ORD-12345".into(),
//!                 amount: 199.99,
//!             },
//!             &ctx,
//!         )
//!         .await?;
//!
//!     host.stop(&ctx).await?;
//!     Ok(())
//! }
//! ```
//!
//! ---

mod config;
mod core;
mod error;
mod events;
mod observers;
mod policies;
mod queue;
mod raiser;
mod sink;

// ---- Public re-exports ----

pub use config::{ChannelConfig, DEFAULT_BOUNDED_CAPACITY, DEFAULT_MAX_RETRY_ATTEMPTS};
pub use crate::core::{BoxWorkerFuture, PublishWorker, PublisherHost, Worker, SHUTDOWN_GRACE};
pub use error::{QueueError, RuntimeError, SinkError, WorkerError};
pub use events::{Bus, Event, EventKind};
pub use observers::{spawn_observer, LogWriter, Observer};
pub use policies::{ExponentialBackoff, ResiliencePolicy};
pub use queue::{EventQueue, QueueReader};
pub use raiser::EventRaiser;
pub use sink::{
    BatchEntry, FailedEntry, PublishOutcome, SuccessfulEntry, TopicSink, MAX_BATCH_ENTRIES,
};
