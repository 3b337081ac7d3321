//! # Observers of the publisher runtime.
//!
//! Provides the [`Observer`] trait, the [`spawn_observer`] task plumbing,
//! and the built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! raiser / workers / host ── publish(Event) ──► Bus (broadcast)
//!                                                 ├──► LogWriter task
//!                                                 ├──► custom Observer task
//!                                                 └──► plain receivers (tests)
//! ```
//!
//! Every observer owns a receiver on the broadcast bus and runs on its own
//! task, so a slow or panicking observer never touches the publish path or
//! the other observers. See [`observer`] for the lag and panic rules.
//!
//! ## Implementing custom observers
//! ```no_run
//! use async_trait::async_trait;
//! use eventcast::{Event, EventKind, Observer};
//!
//! struct FailureCounter;
//!
//! #[async_trait]
//! impl Observer for FailureCounter {
//!     async fn observe(&self, event: &Event) {
//!         if event.kind == EventKind::EntryRejected {
//!             // increment a counter
//!         }
//!     }
//!     fn name(&self) -> &'static str {
//!         "failure-counter"
//!     }
//! }
//! ```

mod log;
mod observer;

pub use log::LogWriter;
pub use observer::{spawn_observer, Observer};
