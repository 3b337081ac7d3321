//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the raiser, the publish
//! workers, and the host.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `EventRaiser` (directory events), `PublishWorker`
//!   (publish + lifecycle events), `PublisherHost` (shutdown events).
//! - **Consumers**: observer tasks spawned over their own receivers, plus
//!   anything holding a `Bus::subscribe()` receiver (tests, custom
//!   monitors).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
