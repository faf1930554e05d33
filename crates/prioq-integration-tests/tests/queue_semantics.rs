//! End-to-end semantics of the queue contract through the public client
//! API: priority order, FCFS tie-breaks, acknowledgment, lease expiry, and
//! empty-queue behavior.

mod common;

use common::{body, queue, test_client};
use chrono::Duration;
use prioq_runtime::{
    Clock, InMemoryProvider, ManualClock, PriorityOrder, QueueClient, Timestamp, VisibilityTimeout,
};
use std::sync::Arc;

/// Verify messages with distinct priorities are delivered lowest number
/// first, then the queue runs empty.
#[tokio::test]
async fn priority_order_is_strict() {
    let client = test_client();
    let q = queue("orders");

    client.push(&q, body("A"), 1).await.unwrap();
    client.push(&q, body("B"), 2).await.unwrap();
    client.push(&q, body("C"), 3).await.unwrap();

    assert_eq!(client.pull(&q).await.unwrap().unwrap().body, body("A"));
    assert_eq!(client.pull(&q).await.unwrap().unwrap().body, body("B"));
    assert_eq!(client.pull(&q).await.unwrap().unwrap().body, body("C"));
    assert!(client.pull(&q).await.unwrap().is_none());
}

/// Verify equal-priority messages come back in push order.
#[tokio::test]
async fn equal_priorities_are_fcfs() {
    let client = test_client();
    let q = queue("orders");

    client.push(&q, body("first"), 10).await.unwrap();
    client.push(&q, body("second"), 10).await.unwrap();

    assert_eq!(client.pull(&q).await.unwrap().unwrap().body, body("first"));
    assert_eq!(client.pull(&q).await.unwrap().unwrap().body, body("second"));
}

/// Verify a larger interleaved workload: priorities dominate, FCFS within
/// each priority class.
#[tokio::test]
async fn bulk_ordering_is_deterministic() {
    let client = test_client();
    let q = queue("orders");

    for i in 0..10 {
        client.push(&q, body(&format!("low-{i}")), 5).await.unwrap();
        client.push(&q, body(&format!("high-{i}")), 1).await.unwrap();
    }

    for i in 0..10 {
        let msg = client.pull(&q).await.unwrap().unwrap();
        assert_eq!(msg.body, body(&format!("high-{i}")));
    }
    for i in 0..10 {
        let msg = client.pull(&q).await.unwrap().unwrap();
        assert_eq!(msg.body, body(&format!("low-{i}")));
    }
}

/// Verify acknowledgment with the pull's receipt removes the message for
/// good.
#[tokio::test]
async fn acknowledged_message_never_returns() {
    let client = test_client();
    let q = queue("orders");

    client.push(&q, body("A"), 10).await.unwrap();
    let pulled = client.pull(&q).await.unwrap().unwrap();

    client.delete(&q, &pulled.receipt_id).await.unwrap();
    assert!(client.pull(&q).await.unwrap().is_none());
}

/// Verify the full lease cycle against a manual clock: leased messages
/// stay hidden for the timeout, then redeliver with a fresh receipt and an
/// incremented attempt count.
#[tokio::test]
async fn lease_expiry_redelivers_with_new_receipt() {
    let clock = Arc::new(ManualClock::new(Timestamp::from_timestamp_millis(
        1_700_000_000_000,
    )));
    let provider = InMemoryProvider::with_clock(
        VisibilityTimeout::default(),
        PriorityOrder::default(),
        Arc::clone(&clock) as Arc<dyn Clock>,
    );
    let q = queue("orders");

    provider.push(&q, body("A"), 10).await.unwrap();
    clock.advance(Duration::milliseconds(1));

    let first = provider.pull(&q).await.unwrap().unwrap();
    assert_eq!(first.attempts, 1);
    assert!(provider.pull(&q).await.unwrap().is_none());

    clock.advance(Duration::seconds(31));
    let second = provider.pull(&q).await.unwrap().unwrap();

    assert_eq!(second.body, body("A"));
    assert_eq!(second.attempts, 2);
    assert_ne!(second.receipt_id, first.receipt_id);
}

/// Verify pulling a never-pushed queue is empty with no error and no
/// side effects.
#[tokio::test]
async fn pull_on_unknown_queue_is_empty() {
    let client = test_client();

    let result = client.pull(&queue("never-pushed")).await.unwrap();
    assert!(result.is_none());
}

/// Verify deleting with a stale receipt leaves the queue intact.
#[tokio::test]
async fn stale_delete_leaves_queue_unchanged() {
    let client = test_client();
    let q = queue("orders");

    client.push(&q, body("A"), 10).await.unwrap();
    let stale = "not-a-real-receipt".parse().unwrap();
    client.delete(&q, &stale).await.unwrap();

    assert!(client.pull(&q).await.unwrap().is_some());
}

/// Verify queue identifiers are isolated namespaces.
#[tokio::test]
async fn queues_do_not_interleave() {
    let client = test_client();

    client.push(&queue("alpha"), body("a"), 1).await.unwrap();
    client.push(&queue("beta"), body("b"), 1).await.unwrap();

    assert_eq!(
        client.pull(&queue("alpha")).await.unwrap().unwrap().body,
        body("a")
    );
    assert_eq!(
        client.pull(&queue("beta")).await.unwrap().unwrap().body,
        body("b")
    );
    assert!(client.pull(&queue("alpha")).await.unwrap().is_none());
}
