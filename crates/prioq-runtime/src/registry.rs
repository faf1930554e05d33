//! Queue registry: maps queue identifiers to their queues.

use crate::config::PriorityOrder;
use crate::message::QueueName;
use crate::queue::PriorityVisibilityQueue;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

/// Handle to one queue's state; the mutex serializes all mutating
/// operations against that queue.
pub type QueueHandle = Arc<Mutex<PriorityVisibilityQueue>>;

/// Owned registry of queues for one service instance.
///
/// Queues are created lazily on first push. Growth is unbounded for the
/// lifetime of the process; removal is out of scope. Lookups take the read
/// lock only, so operations against different queue identifiers do not
/// contend beyond the brief map access.
pub struct QueueRegistry {
    queues: RwLock<HashMap<QueueName, QueueHandle>>,
    order: PriorityOrder,
}

impl QueueRegistry {
    /// Create an empty registry whose queues all share one comparator
    /// direction
    pub fn new(order: PriorityOrder) -> Self {
        Self {
            queues: RwLock::new(HashMap::new()),
            order,
        }
    }

    /// Resolve the queue for `name`, creating it if absent.
    ///
    /// Get-or-create is atomic under the write lock: exactly one queue
    /// object is ever created per identifier, even under concurrent first
    /// pushes. Used by push only.
    pub fn resolve_or_create(&self, name: &QueueName) -> QueueHandle {
        {
            let queues = self.queues.read().expect("queue registry lock poisoned");
            if let Some(handle) = queues.get(name) {
                return Arc::clone(handle);
            }
        }

        let mut queues = self.queues.write().expect("queue registry lock poisoned");
        let handle = queues
            .entry(name.clone())
            .or_insert_with(|| {
                tracing::info!(queue_id = %name, "queue created");
                Arc::new(Mutex::new(PriorityVisibilityQueue::new(self.order)))
            });
        Arc::clone(handle)
    }

    /// Resolve the queue for `name` without creating it.
    ///
    /// Used by pull and delete, which must not materialize a queue as a
    /// side effect of a read.
    pub fn lookup(&self, name: &QueueName) -> Option<QueueHandle> {
        let queues = self.queues.read().expect("queue registry lock poisoned");
        queues.get(name).map(Arc::clone)
    }

    /// Number of queues created so far
    pub fn queue_count(&self) -> usize {
        let queues = self.queues.read().expect("queue registry lock poisoned");
        queues.len()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
