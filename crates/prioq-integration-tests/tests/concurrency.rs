//! Concurrent producers and consumers against a single service instance.
//!
//! These tests exercise the per-queue serialization discipline: no message
//! may be leased by two consumers at once, and create-on-first-push must
//! produce one queue per identifier even under racing producers.

mod common;

use common::{queue, test_client};
use bytes::Bytes;
use prioq_runtime::QueueClient;
use std::collections::HashSet;
use std::sync::Arc;

const PRODUCERS: usize = 4;
const MESSAGES_PER_PRODUCER: usize = 25;

/// Verify racing consumers never receive the same message while its lease
/// is active, and together drain the queue exactly once.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_consumers_share_the_queue_exactly_once() {
    let client = test_client();
    let q = queue("contested");

    for p in 0..PRODUCERS {
        for i in 0..MESSAGES_PER_PRODUCER {
            client
                .push(&q, Bytes::from(format!("p{p}-m{i}")), 1)
                .await
                .unwrap();
        }
    }

    let mut consumers = Vec::new();
    for _ in 0..PRODUCERS {
        let client = Arc::clone(&client);
        let q = q.clone();
        consumers.push(tokio::spawn(async move {
            let mut delivered = Vec::new();
            while let Some(msg) = client.pull(&q).await.unwrap() {
                client.delete(&q, &msg.receipt_id).await.unwrap();
                delivered.push(msg.body);
            }
            delivered
        }));
    }

    let mut seen = HashSet::new();
    let mut total = 0;
    for consumer in consumers {
        for delivered in consumer.await.unwrap() {
            total += 1;
            assert!(
                seen.insert(delivered),
                "a message was delivered to two consumers while leased"
            );
        }
    }

    assert_eq!(total, PRODUCERS * MESSAGES_PER_PRODUCER);
    assert!(client.pull(&q).await.unwrap().is_none());
}

/// Verify concurrent producers pushing to the same fresh identifier all
/// land in one queue.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn racing_first_pushes_share_one_queue() {
    let client = test_client();
    let q = queue("fresh");

    let mut producers = Vec::new();
    for p in 0..PRODUCERS {
        let client = Arc::clone(&client);
        let q = q.clone();
        producers.push(tokio::spawn(async move {
            for i in 0..MESSAGES_PER_PRODUCER {
                client
                    .push(&q, Bytes::from(format!("p{p}-m{i}")), 1)
                    .await
                    .unwrap();
            }
        }));
    }
    for producer in producers {
        producer.await.unwrap();
    }

    let mut drained = 0;
    while let Some(msg) = client.pull(&q).await.unwrap() {
        client.delete(&q, &msg.receipt_id).await.unwrap();
        drained += 1;
    }

    assert_eq!(drained, PRODUCERS * MESSAGES_PER_PRODUCER);
}

/// Verify producers on different identifiers do not interfere: each queue
/// drains exactly its own messages.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn independent_queues_do_not_contend() {
    let client = test_client();

    let mut producers = Vec::new();
    for p in 0..PRODUCERS {
        let client = Arc::clone(&client);
        let q = queue(&format!("shard-{p}"));
        producers.push(tokio::spawn(async move {
            for i in 0..MESSAGES_PER_PRODUCER {
                client
                    .push(&q, Bytes::from(format!("m{i}")), 1)
                    .await
                    .unwrap();
            }
        }));
    }
    for producer in producers {
        producer.await.unwrap();
    }

    for p in 0..PRODUCERS {
        let q = queue(&format!("shard-{p}"));
        let mut drained = 0;
        while let Some(msg) = client.pull(&q).await.unwrap() {
            client.delete(&q, &msg.receipt_id).await.unwrap();
            drained += 1;
        }
        assert_eq!(drained, MESSAGES_PER_PRODUCER, "queue shard-{p} leaked");
    }
}
