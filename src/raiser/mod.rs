//! # Event raiser: the producer-facing entry point.
//!
//! [`EventRaiser`] maps each event type to its registered queue and routes
//! raised events accordingly. Producers depend only on the raiser; they
//! never see the queues, workers, or sink.
//!
//! ## Architecture
//! ```text
//! raise::<OrderCreated>(ev) ──► directory[TypeId(OrderCreated)] ──► queue.write(ev)
//! raise::<UserSignedUp>(ev) ──► directory[TypeId(UserSignedUp)] ──► queue.write(ev)
//! raise::<Unregistered>(ev) ──► miss ──► ChannelMissing (warn) ──► Ok(false)
//! ```
//!
//! ## Rules
//! - At most one queue per event type; re-registration replaces the entry
//!   (the later registration wins).
//! - A missing or mismatched channel is a **misconfiguration, not a fault**:
//!   it is reported through the bus and `raise` returns `Ok(false)` so a
//!   producer never crashes over an unregistered type.
//! - The directory is populated at configuration time and only read in
//!   steady state.
//! - The erased downcast is confined to lookup; registration is fully typed.

use std::any::{Any, TypeId};
use std::sync::Arc;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use crate::error::QueueError;
use crate::events::{Bus, Event, EventKind};
use crate::queue::EventQueue;

struct Channel {
    type_name: &'static str,
    queue: Arc<dyn Any + Send + Sync>,
}

/// Directory from event type to queue, with the producer-side write API.
pub struct EventRaiser {
    channels: DashMap<TypeId, Channel>,
    bus: Bus,
}

impl EventRaiser {
    /// Creates an empty raiser publishing directory events to `bus`.
    pub fn new(bus: Bus) -> Self {
        Self {
            channels: DashMap::new(),
            bus,
        }
    }

    /// Installs `queue` as the channel for events of type `T`.
    ///
    /// Idempotent: registering a second queue for the same type replaces
    /// the first.
    pub fn register_channel<T: Send + 'static>(&self, queue: Arc<EventQueue<T>>) {
        let type_name = short_type_name::<T>();
        let queue: Arc<dyn Any + Send + Sync> = queue;
        self.channels.insert(TypeId::of::<T>(), Channel { type_name, queue });
        self.bus
            .publish(Event::now(EventKind::ChannelRegistered).with_channel(type_name));
    }

    /// Raises one event of type `T`.
    ///
    /// Returns `Ok(true)` once the event is admitted to its queue, blocking
    /// under backpressure. Returns `Ok(false)` when no channel is registered
    /// for `T` (reported as a warning) or the registered entry does not
    /// match `T`'s queue type (reported as an error). Fails with
    /// `Err(Canceled)` or `Err(Closed)` from the underlying write.
    pub async fn raise<T: Send + 'static>(
        &self,
        event: T,
        ctx: &CancellationToken,
    ) -> Result<bool, QueueError> {
        let Some(queue) = self.channel_for::<T>() else {
            return Ok(false);
        };
        queue.write(event, ctx).await?;
        Ok(true)
    }

    /// Raises a sequence of events of type `T`, preserving their order.
    ///
    /// Routing behaves as in [`raise`](Self::raise); on a hit the whole
    /// sequence is written through
    /// [`EventQueue::write_all`](crate::EventQueue::write_all).
    pub async fn raise_all<T: Send + 'static>(
        &self,
        events: impl IntoIterator<Item = T>,
        ctx: &CancellationToken,
    ) -> Result<bool, QueueError> {
        let Some(queue) = self.channel_for::<T>() else {
            return Ok(false);
        };
        queue.write_all(events, ctx).await?;
        Ok(true)
    }

    /// Returns the sorted event type names with a registered channel.
    pub fn channels(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> =
            self.channels.iter().map(|e| e.value().type_name).collect();
        names.sort_unstable();
        names
    }

    // Resolves the queue for `T`, reporting misses and mismatches. The
    // dashmap guard is dropped before the caller awaits on the queue.
    fn channel_for<T: Send + 'static>(&self) -> Option<Arc<EventQueue<T>>> {
        let Some(entry) = self.channels.get(&TypeId::of::<T>()) else {
            self.bus.publish(
                Event::now(EventKind::ChannelMissing)
                    .with_channel(short_type_name::<T>())
                    .with_error("no channel registered for event type"),
            );
            return None;
        };

        match Arc::clone(&entry.queue).downcast::<EventQueue<T>>() {
            Ok(queue) => Some(queue),
            Err(_) => {
                self.bus.publish(
                    Event::now(EventKind::ChannelMismatch)
                        .with_channel(entry.type_name)
                        .with_error("registered channel does not match the event type"),
                );
                None
            }
        }
    }
}

// Last path segment of the type name; enough for logs.
pub(crate) fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
