mod support;

use std::sync::Arc;
use std::time::Duration;

use serde::ser::{Error as _, Serializer};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use eventcast::{
    Bus, EventKind, EventQueue, ExponentialBackoff, FailedEntry, PublishOutcome, PublishWorker,
    QueueReader, SinkError, SuccessfulEntry, Worker, WorkerError,
};
use support::{wait_for_event, RecordingSink};

const TOPIC: &str = "arn:aws:sns:us-east-1:123456789012:order-events-topic";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct OrderCreated {
    order_id: String,
    amount: f64,
    customer_id: String,
}

fn sample_order() -> OrderCreated {
    OrderCreated {
        order_id: "ORD-12345".into(),
        amount: 199.99,
        customer_id: "CUST-456".into(),
    }
}

fn spawn_worker<T: Serialize + Send + 'static>(
    reader: QueueReader<T>,
    sink: Arc<RecordingSink>,
    max_retry_attempts: u32,
    bus: &Bus,
    token: &CancellationToken,
) -> JoinHandle<Result<(), WorkerError>> {
    let worker = PublishWorker::new(
        reader,
        TOPIC,
        sink,
        Arc::new(ExponentialBackoff::new(max_retry_attempts)),
        bus.clone(),
    );
    tokio::spawn(worker.spawn(token.clone()))
}

#[tokio::test]
async fn publishes_a_single_event_without_waiting_for_a_full_batch() {
    let bus = Bus::new(256);
    let mut rx = bus.subscribe();
    let (queue, reader) = EventQueue::bounded(64);
    let sink = Arc::new(RecordingSink::new());
    let token = CancellationToken::new();
    let _worker = spawn_worker(reader, Arc::clone(&sink), 3, &bus, &token);

    let ctx = CancellationToken::new();
    let event = sample_order();
    queue.write(event.clone(), &ctx).await.unwrap();

    let published = wait_for_event(&mut rx, EventKind::BatchPublished).await;
    assert_eq!(published.count, Some(1));
    assert_eq!(published.topic.as_deref(), Some(TOPIC));

    let calls = sink.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].topic, TOPIC);
    assert_eq!(calls[0].entries.len(), 1);
    assert_eq!(calls[0].entries[0].id, "0");

    // The JSON body reconstructs the event on all public fields.
    let round_trip: OrderCreated = serde_json::from_str(&calls[0].entries[0].message).unwrap();
    assert_eq!(round_trip, event);

    token.cancel();
}

#[tokio::test]
async fn coalesces_queued_events_into_one_batch() {
    let bus = Bus::new(256);
    let mut rx = bus.subscribe();
    let (queue, reader) = EventQueue::bounded(64);
    let sink = Arc::new(RecordingSink::new());
    let token = CancellationToken::new();

    let ctx = CancellationToken::new();
    for i in 0..3u32 {
        queue.write(i, &ctx).await.unwrap();
    }
    let _worker = spawn_worker(reader, Arc::clone(&sink), 3, &bus, &token);

    wait_for_event(&mut rx, EventKind::BatchPublished).await;
    let calls = sink.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].entries.len(), 3);
    let ids: Vec<&str> = calls[0].entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["0", "1", "2"]);
    let bodies: Vec<&str> = calls[0].entries.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(bodies, ["0", "1", "2"]);

    token.cancel();
}

#[tokio::test]
async fn batches_never_exceed_ten_entries() {
    let bus = Bus::new(256);
    let mut rx = bus.subscribe();
    let (queue, reader) = EventQueue::bounded(64);
    let sink = Arc::new(RecordingSink::new());
    let token = CancellationToken::new();

    let ctx = CancellationToken::new();
    for i in 0..25u32 {
        queue.write(i, &ctx).await.unwrap();
    }
    let _worker = spawn_worker(reader, Arc::clone(&sink), 3, &bus, &token);

    for _ in 0..3 {
        wait_for_event(&mut rx, EventKind::BatchPublished).await;
    }
    let calls = sink.calls();
    assert_eq!(calls.len(), 3);
    let sizes: Vec<usize> = calls.iter().map(|c| c.entries.len()).collect();
    assert_eq!(sizes, [10, 10, 5]);
    assert!(calls.iter().all(|c| (1..=10).contains(&c.entries.len())));

    token.cancel();
}

#[tokio::test]
async fn reports_each_rejected_entry_without_requeueing() {
    let bus = Bus::new(256);
    let mut rx = bus.subscribe();
    let (queue, reader) = EventQueue::bounded(64);
    let sink = Arc::new(RecordingSink::new());
    sink.push_response(Ok(PublishOutcome {
        successful: vec![SuccessfulEntry {
            id: "0".into(),
            message_id: "mid-0".into(),
        }],
        failed: vec![FailedEntry {
            id: "1".into(),
            code: "InvalidParameter".into(),
            message: "Invalid parameter".into(),
        }],
    }));
    let token = CancellationToken::new();

    let ctx = CancellationToken::new();
    queue.write(1u32, &ctx).await.unwrap();
    queue.write(2u32, &ctx).await.unwrap();
    let _worker = spawn_worker(reader, Arc::clone(&sink), 3, &bus, &token);

    let published = wait_for_event(&mut rx, EventKind::BatchPublished).await;
    assert_eq!(published.count, Some(1));

    let rejected = wait_for_event(&mut rx, EventKind::EntryRejected).await;
    assert_eq!(rejected.entry_id.as_deref(), Some("1"));
    assert_eq!(rejected.code.as_deref(), Some("InvalidParameter"));
    assert_eq!(rejected.error.as_deref(), Some("Invalid parameter"));

    // Failed entries are not re-enqueued.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(sink.call_count(), 1);
    assert!(queue.is_empty());

    token.cancel();
}

#[tokio::test(start_paused = true)]
async fn retries_a_transient_failure_with_exponential_backoff() {
    let bus = Bus::new(256);
    let mut rx = bus.subscribe();
    let (queue, reader) = EventQueue::bounded(64);
    let sink = Arc::new(RecordingSink::new());
    sink.push_response(Err(SinkError::Internal {
        message: "InternalError".into(),
    }));
    let token = CancellationToken::new();

    let ctx = CancellationToken::new();
    queue.write(sample_order(), &ctx).await.unwrap();
    let _worker = spawn_worker(reader, Arc::clone(&sink), 1, &bus, &token);

    let retry = wait_for_event(&mut rx, EventKind::RetryScheduled).await;
    assert_eq!(retry.attempt, Some(1));
    assert_eq!(retry.delay, Some(Duration::from_secs(2)));

    wait_for_event(&mut rx, EventKind::BatchPublished).await;
    assert_eq!(sink.call_count(), 2);

    token.cancel();
}

#[tokio::test(start_paused = true)]
async fn drops_the_batch_after_retry_exhaustion_and_keeps_running() {
    let bus = Bus::new(256);
    let mut rx = bus.subscribe();
    let (queue, reader) = EventQueue::bounded(64);
    let sink = Arc::new(RecordingSink::new());
    sink.push_response(Err(SinkError::Internal {
        message: "InternalError".into(),
    }));
    sink.push_response(Err(SinkError::Internal {
        message: "InternalError".into(),
    }));
    let token = CancellationToken::new();

    let ctx = CancellationToken::new();
    queue.write(1u32, &ctx).await.unwrap();
    let _worker = spawn_worker(reader, Arc::clone(&sink), 1, &bus, &token);

    wait_for_event(&mut rx, EventKind::RetryScheduled).await;
    wait_for_event(&mut rx, EventKind::PublishFailed).await;
    assert_eq!(sink.call_count(), 2);

    // The worker keeps draining after the dropped batch.
    queue.write(2u32, &ctx).await.unwrap();
    wait_for_event(&mut rx, EventKind::BatchPublished).await;
    assert_eq!(sink.call_count(), 3);

    token.cancel();
}

#[tokio::test]
async fn zero_retry_budget_turns_the_first_transient_failure_permanent() {
    let bus = Bus::new(256);
    let mut rx = bus.subscribe();
    let (queue, reader) = EventQueue::bounded(64);
    let sink = Arc::new(RecordingSink::new());
    sink.push_response(Err(SinkError::Internal {
        message: "InternalError".into(),
    }));
    let token = CancellationToken::new();

    let ctx = CancellationToken::new();
    queue.write(1u32, &ctx).await.unwrap();
    let _worker = spawn_worker(reader, Arc::clone(&sink), 0, &bus, &token);

    // No retry is scheduled before the failure is reported.
    loop {
        let ev = rx.recv().await.unwrap();
        match ev.kind {
            EventKind::RetryScheduled => panic!("unexpected retry with a zero budget"),
            EventKind::PublishFailed => break,
            _ => continue,
        }
    }
    assert_eq!(sink.call_count(), 1);

    token.cancel();
}

#[tokio::test]
async fn permanent_failures_are_never_retried() {
    let bus = Bus::new(256);
    let mut rx = bus.subscribe();
    let (queue, reader) = EventQueue::bounded(64);
    let sink = Arc::new(RecordingSink::new());
    sink.push_response(Err(SinkError::Rejected {
        code: "NotFound".into(),
        message: "topic does not exist".into(),
    }));
    let token = CancellationToken::new();

    let ctx = CancellationToken::new();
    queue.write(1u32, &ctx).await.unwrap();
    let _worker = spawn_worker(reader, Arc::clone(&sink), 3, &bus, &token);

    wait_for_event(&mut rx, EventKind::PublishFailed).await;
    assert_eq!(sink.call_count(), 1);

    token.cancel();
}

struct Unserializable;

impl Serialize for Unserializable {
    fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        Err(S::Error::custom("refused"))
    }
}

#[tokio::test]
async fn serialization_failure_fails_the_batch_and_terminates_the_worker() {
    let bus = Bus::new(256);
    let mut rx = bus.subscribe();
    let (queue, reader) = EventQueue::bounded(64);
    let sink = Arc::new(RecordingSink::new());
    let token = CancellationToken::new();

    let ctx = CancellationToken::new();
    queue.write(Unserializable, &ctx).await.unwrap();
    let worker = spawn_worker(reader, Arc::clone(&sink), 3, &bus, &token);

    wait_for_event(&mut rx, EventKind::SerializationFailed).await;
    wait_for_event(&mut rx, EventKind::WorkerFailed).await;

    let result = worker.await.unwrap();
    assert!(matches!(
        result,
        Err(WorkerError::Serialization { ref entry_id, .. }) if entry_id == "0"
    ));
    assert_eq!(sink.call_count(), 0);
}

#[tokio::test]
async fn closing_the_queue_flushes_pending_events_then_stops_the_worker() {
    let bus = Bus::new(256);
    let (queue, reader) = EventQueue::bounded(64);
    let sink = Arc::new(RecordingSink::new());
    let token = CancellationToken::new();

    let ctx = CancellationToken::new();
    queue.write(1u32, &ctx).await.unwrap();
    queue.write(2u32, &ctx).await.unwrap();
    queue.close();

    let worker = spawn_worker(reader, Arc::clone(&sink), 3, &bus, &token);
    worker.await.unwrap().unwrap();

    let calls = sink.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].entries.len(), 2);
}

#[tokio::test]
async fn cancellation_stops_an_idle_worker() {
    let bus = Bus::new(256);
    let mut rx = bus.subscribe();
    let (_queue, reader) = EventQueue::<u32>::bounded(64);
    let sink = Arc::new(RecordingSink::new());
    let token = CancellationToken::new();

    let worker = spawn_worker(reader, Arc::clone(&sink), 3, &bus, &token);
    wait_for_event(&mut rx, EventKind::WorkerStarted).await;

    token.cancel();
    let result = worker.await.unwrap();
    assert!(matches!(result, Err(WorkerError::Canceled)));
    assert_eq!(sink.call_count(), 0);
}

#[test]
fn transient_classification_matches_the_retry_contract() {
    let throttled = SinkError::Throttled {
        message: "slow down".into(),
    };
    let internal = SinkError::Internal {
        message: "oops".into(),
    };
    let unavailable = SinkError::Transport {
        status: 503,
        message: "service unavailable".into(),
    };
    let server_error = SinkError::Transport {
        status: 500,
        message: "server error".into(),
    };
    let not_found = SinkError::Transport {
        status: 404,
        message: "not found".into(),
    };
    let rejected = SinkError::Rejected {
        code: "InvalidParameter".into(),
        message: "bad request".into(),
    };

    assert!(throttled.is_transient());
    assert!(internal.is_transient());
    assert!(unavailable.is_transient());
    assert!(server_error.is_transient());
    assert!(!not_found.is_transient());
    assert!(!rejected.is_transient());
    assert!(!SinkError::Canceled.is_transient());
}
