//! Core runtime: the publish workers and the host driving them.
//!
//! ## Wiring
//! ```text
//! producer ──► EventRaiser ──► EventQueue<T> ──► PublishWorker<T> ──► TopicSink
//!                   ▲               ▲                  │
//!                   └── add_channel::<T>() ────────────┘
//!                              PublisherHost
//! ```
//!
//! - [`worker`]: the [`Worker`] seam and the batching drain loop.
//! - [`host`]: channel wiring, start/stop with the fixed shutdown grace.
//! - [`shutdown`]: OS signal helper for `run_until_shutdown`.

mod host;
mod shutdown;
mod worker;

pub use host::{PublisherHost, SHUTDOWN_GRACE};
pub use worker::{BoxWorkerFuture, PublishWorker, Worker};
