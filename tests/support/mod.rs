#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use eventcast::{
    BatchEntry, Event, EventKind, PublishOutcome, SinkError, SuccessfulEntry, TopicSink,
};

static TRACING: Once = Once::new();

/// Installs a `tracing` subscriber once per test binary.
///
/// Off by default so test output stays clean; run with
/// `EVENTCAST_TEST_LOG=debug` (any `EnvFilter` directive) to watch the
/// `LogWriter` output while a test runs.
pub fn init_tracing() {
    TRACING.call_once(|| {
        if std::env::var_os("EVENTCAST_TEST_LOG").is_some() {
            let filter = tracing_subscriber::EnvFilter::try_from_env("EVENTCAST_TEST_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"));
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    });
}

/// One recorded `publish_batch` invocation.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub topic: String,
    pub entries: Vec<BatchEntry>,
}

/// Sink that records every call and replays scripted responses.
///
/// Responses pushed via [`push_response`](Self::push_response) are consumed
/// in order; once the script is empty every entry is acknowledged.
pub struct RecordingSink {
    calls: Mutex<Vec<RecordedCall>>,
    script: Mutex<VecDeque<Result<PublishOutcome, SinkError>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            script: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push_response(&self, response: Result<PublishOutcome, SinkError>) {
        self.script.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TopicSink for RecordingSink {
    async fn publish_batch(
        &self,
        topic: &str,
        entries: Vec<BatchEntry>,
        _ctx: &CancellationToken,
    ) -> Result<PublishOutcome, SinkError> {
        self.calls.lock().unwrap().push(RecordedCall {
            topic: topic.to_string(),
            entries: entries.clone(),
        });
        if let Some(scripted) = self.script.lock().unwrap().pop_front() {
            return scripted;
        }
        Ok(ack_all(&entries))
    }
}

/// Sink that never completes, ignoring cancellation.
pub struct StuckSink;

#[async_trait]
impl TopicSink for StuckSink {
    async fn publish_batch(
        &self,
        _topic: &str,
        _entries: Vec<BatchEntry>,
        _ctx: &CancellationToken,
    ) -> Result<PublishOutcome, SinkError> {
        std::future::pending().await
    }
}

/// Outcome acknowledging every entry.
pub fn ack_all(entries: &[BatchEntry]) -> PublishOutcome {
    PublishOutcome {
        successful: entries
            .iter()
            .map(|e| SuccessfulEntry {
                id: e.id.clone(),
                message_id: format!("m-{}", e.id),
            })
            .collect(),
        failed: Vec::new(),
    }
}

/// Receives bus events until one of `kind` arrives.
pub async fn wait_for_event(rx: &mut broadcast::Receiver<Event>, kind: EventKind) -> Event {
    tokio::time::timeout(Duration::from_secs(30), async {
        loop {
            match rx.recv().await {
                Ok(ev) if ev.kind == kind => return ev,
                Ok(_) => continue,
                Err(err) => panic!("bus closed while waiting for {kind:?}: {err}"),
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {kind:?}"))
}
