//! # Publisher host: wires channels and drives worker lifecycle.
//!
//! [`PublisherHost`] owns the configured workers and orchestrates them from
//! startup to graceful termination.
//!
//! ## Architecture
//! ```text
//! ChannelConfig[] ──► add_channel::<T>()
//!                        ├──► EventQueue<T> (bounded/unbounded)
//!                        ├──► raiser.register_channel::<T>()
//!                        └──► PublishWorker<T>
//!
//! start(ctx) ──► child token ──► JoinSet::spawn(worker) per channel
//!                                  (returns immediately)
//!
//! stop(ctx)  ──► cancel child token
//!                └──► wait for workers
//!                      ├──► all done within 5 s ──► AllStoppedWithin, Ok
//!                      ├──► 5 s grace elapsed ───► GraceExceeded { stuck }
//!                      └──► ctx fired ───────────► return immediately
//! ```
//!
//! ## Rules
//! - `start` never awaits the drain loops; application startup is not
//!   blocked by publishing.
//! - Each worker runs under its own token linked to the one given to
//!   `start`; cancelling either tears the worker down.
//! - `stop` swallows the expected `Canceled` worker result and reports any
//!   other error through the bus.
//! - Workers still running when the grace elapses are force-terminated.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::{Id, JoinSet};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::config::ChannelConfig;
use crate::core::shutdown;
use crate::core::worker::{PublishWorker, Worker};
use crate::error::{RuntimeError, WorkerError};
use crate::events::{Bus, Event, EventKind};
use crate::observers::{spawn_observer, Observer};
use crate::policies::ExponentialBackoff;
use crate::queue::EventQueue;
use crate::raiser::EventRaiser;
use crate::sink::TopicSink;

/// Fixed upper bound on shutdown latency.
///
/// `stop` waits at most this long for workers to finish, so a stuck sink
/// call cannot hang process exit.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

struct Running {
    stop_token: CancellationToken,
    set: JoinSet<Result<(), WorkerError>>,
    names: HashMap<Id, String>,
}

enum StopOutcome {
    Drained,
    GraceElapsed,
    Abandoned,
}

/// Owns the configured publish workers and their lifecycle.
pub struct PublisherHost {
    bus: Bus,
    sink: Arc<dyn TopicSink>,
    workers: Vec<Arc<dyn Worker>>,
    running: Mutex<Option<Running>>,
}

impl PublisherHost {
    /// Creates a host publishing through `sink` by default.
    ///
    /// Each observer gets its own receiver task on the bus; must be called
    /// from within a tokio runtime. The tasks run until the bus closes.
    pub fn new(bus: Bus, sink: Arc<dyn TopicSink>, observers: Vec<Arc<dyn Observer>>) -> Self {
        for observer in observers {
            spawn_observer(&bus, observer);
        }
        Self {
            bus,
            sink,
            workers: Vec::new(),
            running: Mutex::new(None),
        }
    }

    /// Builds one event channel: queue, directory entry, and worker.
    ///
    /// The queue is sized per `cfg`, registered with `raiser`, and returned
    /// so the caller may close it for a producer-side graceful drain. A
    /// `cfg.policy` override supersedes `cfg.max_retry_attempts`. Channels
    /// added after `start` are picked up at the next `start`.
    pub fn add_channel<T>(
        &mut self,
        raiser: &EventRaiser,
        cfg: ChannelConfig,
    ) -> Arc<EventQueue<T>>
    where
        T: Serialize + Send + 'static,
    {
        let (queue, reader) = if cfg.use_bounded_capacity {
            EventQueue::bounded(cfg.bounded_capacity)
        } else {
            EventQueue::unbounded()
        };
        raiser.register_channel(Arc::clone(&queue));

        let sink = cfg.sink.unwrap_or_else(|| Arc::clone(&self.sink));
        let policy = cfg
            .policy
            .unwrap_or_else(|| Arc::new(ExponentialBackoff::new(cfg.max_retry_attempts)));
        let worker = PublishWorker::new(reader, cfg.topic_id, sink, policy, self.bus.clone());
        self.workers.push(Arc::new(worker));
        queue
    }

    /// Launches every worker as a background task and returns immediately.
    ///
    /// Each worker runs under a fresh token linked to `ctx`.
    pub async fn start(&self, ctx: &CancellationToken) -> Result<(), RuntimeError> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Err(RuntimeError::AlreadyStarted);
        }

        let stop_token = ctx.child_token();
        let mut set = JoinSet::new();
        let mut names = HashMap::new();
        for worker in &self.workers {
            let fut = worker.spawn(stop_token.child_token());
            let handle = set.spawn(fut);
            names.insert(handle.id(), worker.name().to_string());
        }

        *running = Some(Running {
            stop_token,
            set,
            names,
        });
        Ok(())
    }

    /// Cancels the workers and waits for them, bounded by [`SHUTDOWN_GRACE`].
    ///
    /// Returns once all workers finished, the grace elapsed, or `ctx` fired,
    /// whichever comes first. The expected `Canceled` worker result is
    /// swallowed; any other failure is reported through the bus. On a grace
    /// overrun the remaining workers are force-terminated and their names
    /// returned in [`RuntimeError::GraceExceeded`].
    pub async fn stop(&self, ctx: &CancellationToken) -> Result<(), RuntimeError> {
        let Some(running) = self.running.lock().await.take() else {
            return Err(RuntimeError::NotStarted);
        };
        let Running {
            stop_token,
            mut set,
            names,
        } = running;

        self.bus.publish(Event::now(EventKind::ShutdownRequested));
        stop_token.cancel();

        let mut alive: BTreeSet<String> = names.values().cloned().collect();
        let outcome = tokio::select! {
            drained = timeout(
                SHUTDOWN_GRACE,
                drain_workers(&mut set, &names, &mut alive, &self.bus),
            ) => match drained {
                Ok(()) => StopOutcome::Drained,
                Err(_elapsed) => StopOutcome::GraceElapsed,
            },
            _ = ctx.cancelled() => StopOutcome::Abandoned,
        };

        // Dropping the JoinSet aborts whatever is still running.
        drop(set);

        match outcome {
            StopOutcome::Drained => {
                self.bus.publish(Event::now(EventKind::AllStoppedWithin));
                Ok(())
            }
            StopOutcome::GraceElapsed => {
                let stuck: Vec<String> = alive.into_iter().collect();
                self.bus.publish(
                    Event::now(EventKind::GraceExceeded)
                        .with_error(format!("stuck workers: {stuck:?}")),
                );
                Err(RuntimeError::GraceExceeded {
                    grace: SHUTDOWN_GRACE,
                    stuck,
                })
            }
            StopOutcome::Abandoned => Ok(()),
        }
    }

    /// Starts the workers, parks until an OS termination signal or `ctx`,
    /// then stops with the usual shutdown bound.
    pub async fn run_until_shutdown(&self, ctx: &CancellationToken) -> Result<(), RuntimeError> {
        self.start(ctx).await?;
        tokio::select! {
            _ = shutdown::wait_for_shutdown_signal() => {}
            _ = ctx.cancelled() => {}
        }
        self.stop(ctx).await
    }
}

// Joins workers as they finish, reporting abnormal exits. `alive` shrinks to
// the set of still-running worker names for stuck reporting.
async fn drain_workers(
    set: &mut JoinSet<Result<(), WorkerError>>,
    names: &HashMap<Id, String>,
    alive: &mut BTreeSet<String>,
    bus: &Bus,
) {
    while let Some(res) = set.join_next_with_id().await {
        match res {
            Ok((id, result)) => {
                let name = names.get(&id).cloned().unwrap_or_default();
                alive.remove(&name);
                match result {
                    Ok(()) | Err(WorkerError::Canceled) => {}
                    Err(err) => bus.publish(
                        Event::now(EventKind::WorkerFailed)
                            .with_channel(name)
                            .with_error(err.to_string()),
                    ),
                }
            }
            Err(join_err) => {
                let name = names.get(&join_err.id()).cloned().unwrap_or_default();
                alive.remove(&name);
                bus.publish(
                    Event::now(EventKind::WorkerFailed)
                        .with_channel(name)
                        .with_error("worker panicked"),
                );
            }
        }
    }
}
