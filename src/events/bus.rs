//! # Event bus for broadcasting runtime events.
//!
//! [`Bus`] is a wrapper around [`tokio::sync::broadcast`] that lets the
//! raiser, publish workers, and host broadcast [`Event`]s to any number of
//! receivers simultaneously.
//!
//! ## Key characteristics:
//! - **Broadcast semantics**: every active receiver sees a clone of each event
//! - **Non-persistent**: events are lost if there are no active receivers
//! - **Bounded capacity**: a lagging receiver skips the oldest events when
//!   the channel overruns
//!
//! Publishing is non-blocking and infallible; observability must never exert
//! backpressure on the publish path.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events.
#[derive(Clone)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity.
    ///
    /// When capacity is exceeded, the oldest unsent events are dropped for
    /// lagging receivers.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    ///
    /// If there are no active receivers the event is dropped silently;
    /// the pipeline operates the same with or without observers.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that will observe all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
