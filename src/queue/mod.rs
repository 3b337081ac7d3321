//! # Bounded per-type event queue.
//!
//! [`EventQueue<T>`] is a FIFO buffer between producers raising events of one
//! type and the single publish worker draining them. It is the only shared
//! mutable structure in the pipeline and the central backpressure mechanism:
//! when a bounded queue is full, `write` **blocks the producer** until the
//! worker frees a slot. It never drops, never overwrites, never fails fast.
//!
//! ## Architecture
//! ```text
//! producer A ──write()──┐
//! producer B ──write()──┼──► [ VecDeque, cap N ] ──► QueueReader ──► worker
//! producer C ──write()──┘         │
//!                                 └── close() ⇒ drain, then end-of-stream
//! ```
//!
//! ## Rules
//! - **One consumer**: constructors return `(Arc<EventQueue<T>>, QueueReader<T>)`;
//!   the reader half exists exactly once.
//! - **FIFO per producer**: a producer's writes are dequeued in submission
//!   order. Interleaving across producers is unspecified.
//! - **Close-for-write**: after [`EventQueue::close`], writes fail with
//!   [`QueueError::Closed`]; the reader drains remaining items and then
//!   observes end-of-stream (`wait_to_read` returns `Ok(false)`).
//! - **Cancellation**: every blocking operation takes a [`CancellationToken`]
//!   and fails promptly with [`QueueError::Canceled`] when it fires.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::error::QueueError;

struct State<T> {
    items: VecDeque<T>,
    closed: bool,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    /// Signaled once per push; wakes the reader.
    readable: Notify,
    /// Signaled once per pop; wakes one blocked writer.
    writable: Notify,
    capacity: Option<usize>,
}

impl<T> Shared<T> {
    // The state is only ever mutated by short push/pop sections, so a
    // poisoned lock still holds a consistent queue.
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Writer half of a per-type event queue.
///
/// Cheap to share: wrap in `Arc` and hand clones to any number of producers.
pub struct EventQueue<T> {
    shared: Arc<Shared<T>>,
}

/// Reader half of a per-type event queue.
///
/// Exists exactly once per queue and is consumed by the publish worker.
pub struct QueueReader<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Send + 'static> EventQueue<T> {
    /// Creates a bounded queue holding at most `capacity` events.
    ///
    /// A capacity of zero is clamped to one.
    pub fn bounded(capacity: usize) -> (Arc<Self>, QueueReader<T>) {
        Self::with_capacity(Some(capacity.max(1)))
    }

    /// Creates an unbounded queue; `write` never blocks on space.
    pub fn unbounded() -> (Arc<Self>, QueueReader<T>) {
        Self::with_capacity(None)
    }

    fn with_capacity(capacity: Option<usize>) -> (Arc<Self>, QueueReader<T>) {
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                items: VecDeque::new(),
                closed: false,
            }),
            readable: Notify::new(),
            writable: Notify::new(),
            capacity,
        });
        let reader = QueueReader {
            shared: Arc::clone(&shared),
        };
        (Arc::new(Self { shared }), reader)
    }

    /// Writes one event, waiting for space while the queue is full.
    ///
    /// Returns `Err(Canceled)` if `ctx` fires before space frees up and
    /// `Err(Closed)` once the queue has been closed for writes.
    pub async fn write(&self, item: T, ctx: &CancellationToken) -> Result<(), QueueError> {
        loop {
            // Register interest before re-checking state so a pop between
            // the check and the await cannot be missed.
            let notified = self.shared.writable.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.shared.lock();
                if state.closed {
                    return Err(QueueError::Closed);
                }
                let has_room = match self.shared.capacity {
                    Some(cap) => state.items.len() < cap,
                    None => true,
                };
                if has_room {
                    state.items.push_back(item);
                    drop(state);
                    self.shared.readable.notify_one();
                    return Ok(());
                }
            }

            tokio::select! {
                _ = &mut notified => {}
                _ = ctx.cancelled() => return Err(QueueError::Canceled),
            }
        }
    }

    /// Writes a sequence of events, preserving their order.
    ///
    /// Short-circuits with `Err(Canceled)` when the token fires. If the
    /// queue closes partway through, the remaining items are dropped and the
    /// call reports success; callers needing all-or-nothing semantics must
    /// build them above this layer.
    pub async fn write_all<I>(&self, items: I, ctx: &CancellationToken) -> Result<(), QueueError>
    where
        I: IntoIterator<Item = T>,
    {
        for item in items {
            match self.write(item, ctx).await {
                Ok(()) => {}
                Err(QueueError::Canceled) => return Err(QueueError::Canceled),
                Err(QueueError::Closed) => break,
            }
        }
        Ok(())
    }

    /// Marks the queue closed for writes.
    ///
    /// Blocked writers observe [`QueueError::Closed`]; the reader drains the
    /// remaining items and then sees end-of-stream. Idempotent.
    pub fn close(&self) {
        {
            let mut state = self.shared.lock();
            state.closed = true;
        }
        self.shared.readable.notify_one();
        self.shared.writable.notify_waiters();
    }

    /// Number of events currently buffered.
    pub fn len(&self) -> usize {
        self.shared.lock().items.len()
    }

    /// True when no events are buffered.
    pub fn is_empty(&self) -> bool {
        self.shared.lock().items.is_empty()
    }

    /// True once the queue has been closed for writes.
    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }
}

impl<T: Send + 'static> QueueReader<T> {
    /// Waits until at least one event is readable.
    ///
    /// Returns `Ok(true)` when an item is available, `Ok(false)` on
    /// end-of-stream (closed and fully drained), and `Err(Canceled)` when
    /// `ctx` fires. Cancellation is the only error a reader can observe.
    pub async fn wait_to_read(&mut self, ctx: &CancellationToken) -> Result<bool, QueueError> {
        loop {
            let notified = self.shared.readable.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let state = self.shared.lock();
                if !state.items.is_empty() {
                    return Ok(true);
                }
                if state.closed {
                    return Ok(false);
                }
            }

            tokio::select! {
                _ = &mut notified => {}
                _ = ctx.cancelled() => return Err(QueueError::Canceled),
            }
        }
    }

    /// Pops the next event without blocking; `None` when the buffer is empty.
    pub fn try_read(&mut self) -> Option<T> {
        let item = {
            let mut state = self.shared.lock();
            state.items.pop_front()
        };
        if item.is_some() {
            self.shared.writable.notify_one();
        }
        item
    }

    /// True when an event could be read immediately.
    ///
    /// Returns false the moment the buffer is empty, closed or not; the
    /// worker relies on this to flush a partial batch instead of waiting
    /// for more items.
    pub fn try_peek(&self) -> bool {
        !self.shared.lock().items.is_empty()
    }
}
