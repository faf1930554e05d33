//! In-memory queue backend: the authoritative single-instance core.
//!
//! This provider owns the registry of [`PriorityVisibilityQueue`]s and is
//! the authoritative implementation of the queue contract. All lease-expiry
//! logic is evaluated lazily against the injected clock at pull time; there
//! is no background sweep.
//!
//! Concurrency discipline: each queue's state sits behind its own mutex, so
//! two concurrent pulls can never lease the same message and a delete
//! racing a pull cannot remove a message whose lease was just renewed.
//! Operations on different queues only share the registry's brief read
//! lock. No lock is ever held across an await point; the trait methods are
//! async solely to match the network-bound backends.

use crate::client::QueueClient;
use crate::clock::{Clock, SystemClock};
use crate::config::{PriorityOrder, VisibilityTimeout};
use crate::error::QueueError;
use crate::message::{PulledMessage, QueueName, ReceiptId};
use crate::registry::QueueRegistry;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tracing::debug;

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;

/// In-memory queue backend
pub struct InMemoryProvider {
    registry: QueueRegistry,
    clock: Arc<dyn Clock>,
    visibility_timeout: chrono::Duration,
}

impl InMemoryProvider {
    /// Create a backend with the wall clock
    pub fn new(visibility_timeout: VisibilityTimeout, order: PriorityOrder) -> Self {
        Self::with_clock(visibility_timeout, order, Arc::new(SystemClock))
    }

    /// Create a backend with an injected clock (deterministic tests)
    pub fn with_clock(
        visibility_timeout: VisibilityTimeout,
        order: PriorityOrder,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry: QueueRegistry::new(order),
            clock,
            visibility_timeout: visibility_timeout.as_duration(),
        }
    }

    /// Number of queues materialized so far
    pub fn queue_count(&self) -> usize {
        self.registry.queue_count()
    }
}

impl Default for InMemoryProvider {
    fn default() -> Self {
        Self::new(VisibilityTimeout::default(), PriorityOrder::default())
    }
}

#[async_trait]
impl QueueClient for InMemoryProvider {
    async fn push(
        &self,
        queue: &QueueName,
        body: Bytes,
        priority: i32,
    ) -> Result<(), QueueError> {
        let handle = self.registry.resolve_or_create(queue);
        let now = self.clock.now();

        let mut state = handle.lock().expect("queue lock poisoned");
        state.push(body, priority, now);
        debug!(queue_id = %queue, %priority, depth = state.len(), "message pushed");

        Ok(())
    }

    async fn pull(&self, queue: &QueueName) -> Result<Option<PulledMessage>, QueueError> {
        // A read must not materialize the queue.
        let Some(handle) = self.registry.lookup(queue) else {
            debug!(queue_id = %queue, "pull on unknown queue");
            return Ok(None);
        };
        let now = self.clock.now();

        let mut state = handle.lock().expect("queue lock poisoned");
        let pulled = state.pull(now, self.visibility_timeout);

        match &pulled {
            Some(msg) => {
                debug!(
                    queue_id = %queue,
                    receipt = %msg.receipt_id,
                    priority = msg.priority,
                    attempts = msg.attempts,
                    "message leased"
                );
            }
            None => debug!(queue_id = %queue, "no visible message"),
        }

        Ok(pulled)
    }

    async fn delete(&self, queue: &QueueName, receipt: &ReceiptId) -> Result<(), QueueError> {
        let Some(handle) = self.registry.lookup(queue) else {
            debug!(queue_id = %queue, "delete on unknown queue");
            return Ok(());
        };
        let now = self.clock.now();

        let mut state = handle.lock().expect("queue lock poisoned");
        let removed = state.delete(receipt, now);
        debug!(queue_id = %queue, %receipt, removed, "delete processed");

        Ok(())
    }
}
