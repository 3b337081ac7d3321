use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::observers::Observer;

/// Built-in observer that renders runtime events through `tracing`.
///
/// Level mapping follows the event's severity: per-batch successes at
/// debug, registration and lifecycle at info, retries and routing misses
/// at warn, rejected entries and dropped batches at error.
pub struct LogWriter;

#[async_trait]
impl Observer for LogWriter {
    async fn observe(&self, e: &Event) {
        match e.kind {
            EventKind::BatchPublished => {
                debug!(
                    channel = e.channel.as_deref(),
                    topic = e.topic.as_deref(),
                    "successfully published {} entries",
                    e.count.unwrap_or(0),
                );
            }
            EventKind::EntryRejected => {
                error!(
                    channel = e.channel.as_deref(),
                    topic = e.topic.as_deref(),
                    entry_id = e.entry_id.as_deref(),
                    code = e.code.as_deref(),
                    "failed to publish entry: {}",
                    e.error.as_deref().unwrap_or("unknown error"),
                );
            }
            EventKind::RetryScheduled => {
                warn!(
                    channel = e.channel.as_deref(),
                    topic = e.topic.as_deref(),
                    "retrying publish after {}ms, attempt {}: {}",
                    e.delay.map(|d| d.as_millis()).unwrap_or(0),
                    e.attempt.unwrap_or(0),
                    e.error.as_deref().unwrap_or("unknown error"),
                );
            }
            EventKind::PublishFailed => {
                error!(
                    channel = e.channel.as_deref(),
                    topic = e.topic.as_deref(),
                    "failed to publish batch: {}",
                    e.error.as_deref().unwrap_or("unknown error"),
                );
            }
            EventKind::SerializationFailed => {
                error!(
                    channel = e.channel.as_deref(),
                    entry_id = e.entry_id.as_deref(),
                    "event serialization failed: {}",
                    e.error.as_deref().unwrap_or("unknown error"),
                );
            }
            EventKind::ChannelRegistered => {
                info!(channel = e.channel.as_deref(), "channel registered");
            }
            EventKind::ChannelMissing => {
                warn!(
                    channel = e.channel.as_deref(),
                    "no channel registered for raised event type",
                );
            }
            EventKind::ChannelMismatch => {
                error!(
                    channel = e.channel.as_deref(),
                    "registered channel does not match the raised event type",
                );
            }
            EventKind::WorkerStarted => {
                debug!(
                    channel = e.channel.as_deref(),
                    topic = e.topic.as_deref(),
                    "publish worker started",
                );
            }
            EventKind::WorkerStopped => {
                info!(channel = e.channel.as_deref(), "publish worker stopped");
            }
            EventKind::WorkerFailed => {
                error!(
                    channel = e.channel.as_deref(),
                    "publish worker failed: {}",
                    e.error.as_deref().unwrap_or("unknown error"),
                );
            }
            EventKind::ShutdownRequested => {
                info!("shutdown requested");
            }
            EventKind::AllStoppedWithin => {
                info!("all workers stopped within the shutdown grace");
            }
            EventKind::GraceExceeded => {
                error!("shutdown grace exceeded; stuck workers force-terminated");
            }
            EventKind::ObserverLagged => {
                warn!(
                    observer = e.channel.as_deref(),
                    "observer lagged, {} events dropped",
                    e.count.unwrap_or(0),
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
