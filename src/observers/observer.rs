//! # Observer trait and task plumbing.
//!
//! An [`Observer`] watches the runtime events the pipeline publishes on its
//! [`Bus`]. [`spawn_observer`] gives each observer its own broadcast
//! receiver on a dedicated task, so observation can never exert
//! backpressure on the publish path.
//!
//! ## Rules
//! - **Per-observer buffering**: the bus is a broadcast channel, so every
//!   observer reads at its own pace from its own receiver.
//! - **Lag instead of loss reports**: an observer that falls behind the bus
//!   capacity skips the oldest events; the skip is surfaced to that observer
//!   alone as an [`ObserverLagged`](crate::EventKind::ObserverLagged) event
//!   carrying the dropped count. It is not re-published on the bus, so a
//!   slow observer cannot start an event storm.
//! - **Panic containment**: a panicking observer ends its own task; the
//!   pipeline and other observers are unaffected.
//! - **Shutdown**: observer tasks drain the remaining events and exit once
//!   every bus handle has been dropped.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::events::{Bus, Event, EventKind};

/// Watches runtime events from a dedicated task.
///
/// Implementations may be slow (I/O, batching); they delay only their own
/// view of the event stream.
#[async_trait]
pub trait Observer: Send + Sync + 'static {
    /// Handles one runtime event.
    async fn observe(&self, event: &Event);

    /// Stable name, used in lag diagnostics.
    fn name(&self) -> &'static str;
}

/// Spawns a task feeding `observer` from its own receiver on `bus`.
///
/// The receiver is created before this function returns, so events
/// published immediately afterwards are already in view. The task runs
/// until the bus closes; the returned handle is mainly useful for awaiting
/// that exit in tests.
pub fn spawn_observer(bus: &Bus, observer: Arc<dyn Observer>) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => observer.observe(&event).await,
                Err(RecvError::Closed) => break,
                Err(RecvError::Lagged(missed)) => {
                    let diagnostic = Event::now(EventKind::ObserverLagged)
                        .with_channel(observer.name())
                        .with_count(usize::try_from(missed).unwrap_or(usize::MAX))
                        .with_error("observer too slow, oldest events dropped");
                    observer.observe(&diagnostic).await;
                }
            }
        }
    })
}
