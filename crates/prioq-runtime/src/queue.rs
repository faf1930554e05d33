//! Core per-queue ordering and lease management.
//!
//! [`PriorityVisibilityQueue`] is the ordered collection behind one queue
//! identifier. It decides which message a pull returns, how priority and
//! arrival order interact, how leases are granted, and how acknowledgment
//! removes a message exactly once. It holds no lock itself; the owning
//! provider serializes all mutating calls per queue.

use crate::config::PriorityOrder;
use crate::message::{LeaseState, Message, PulledMessage, ReceiptId, Timestamp};
use bytes::Bytes;
use std::collections::{BTreeMap, HashMap};

/// Ordering key for one queue entry.
///
/// `rank` is the direction-adjusted priority, `created_at_ms` the arrival
/// tie-break, and `seq` a per-queue counter that keeps same-millisecond
/// arrivals in push order. Derived `Ord` on this field order IS the queue's
/// single comparator: it fixes both insert position and pull scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct MessageKey {
    rank: i64,
    created_at_ms: i64,
    seq: u64,
}

/// One active entry: the immutable message core plus its lease record.
/// Both parts are updated together under the owning provider's lock.
#[derive(Debug, Clone)]
struct StoredMessage {
    message: Message,
    lease: LeaseState,
}

/// The ordered collection for one queue identifier.
///
/// Entries are kept in a `BTreeMap` ordered by [`MessageKey`], with a side
/// index from active receipt to entry so delete does not rescan. Leased
/// (in-flight) entries stay in the map at their original position; pull
/// skips them without disturbing relative order.
pub struct PriorityVisibilityQueue {
    entries: BTreeMap<MessageKey, StoredMessage>,
    by_receipt: HashMap<ReceiptId, MessageKey>,
    order: PriorityOrder,
    next_seq: u64,
}

impl PriorityVisibilityQueue {
    /// Create an empty queue with the configured comparator direction
    pub fn new(order: PriorityOrder) -> Self {
        Self {
            entries: BTreeMap::new(),
            by_receipt: HashMap::new(),
            order,
            next_seq: 0,
        }
    }

    /// Insert a new message. Always succeeds; bodies are not deduplicated.
    ///
    /// The message is created with a fresh `created_at`, zero attempts, no
    /// receipt, and `visible_from` equal to its creation instant.
    pub fn push(&mut self, body: Bytes, priority: i32, now: Timestamp) {
        let key = MessageKey {
            rank: self.order.rank_of(priority),
            created_at_ms: now.timestamp_millis(),
            seq: self.next_seq,
        };
        self.next_seq += 1;

        let stored = StoredMessage {
            message: Message::new(body, priority, now),
            lease: LeaseState::new(now),
        };
        self.entries.insert(key, stored);
    }

    /// Lease the highest-priority visible message, if any.
    ///
    /// Single deterministic pass in comparator order: the first entry with
    /// `visible_from < now` is granted a fresh receipt, its attempt count is
    /// incremented, and it is hidden until `now + visibility_timeout` while
    /// staying in the collection. Entries skipped along the way are left
    /// untouched. `None` means nothing is visible right now; that is a
    /// normal outcome, not an error.
    pub fn pull(
        &mut self,
        now: Timestamp,
        visibility_timeout: chrono::Duration,
    ) -> Option<PulledMessage> {
        let key = self
            .entries
            .iter()
            .find(|(_, stored)| stored.lease.is_visible_at(now))
            .map(|(key, _)| *key)?;

        let stored = self.entries.get_mut(&key)?;

        // The old lease's receipt stops resolving the moment a new lease
        // is granted.
        if let Some(previous) = stored.lease.receipt_id().cloned() {
            self.by_receipt.remove(&previous);
        }

        let receipt = ReceiptId::generate();
        let hidden_until = Timestamp::from_datetime(now.as_datetime() + visibility_timeout);
        stored.lease.grant(receipt.clone(), hidden_until);
        self.by_receipt.insert(receipt.clone(), key);

        Some(PulledMessage {
            body: stored.message.body.clone(),
            receipt_id: receipt,
            priority: stored.message.priority,
            attempts: stored.lease.attempts(),
        })
    }

    /// Acknowledge a leased message, removing it permanently.
    ///
    /// The receipt must be the *current* receipt of an entry that is still
    /// invisible (in flight). A visible entry is not a candidate: its old
    /// receipt was invalidated by lease expiry, so acknowledgment against it
    /// is silently refused. Returns whether an entry was removed.
    pub fn delete(&mut self, receipt: &ReceiptId, now: Timestamp) -> bool {
        let Some(key) = self.by_receipt.get(receipt).copied() else {
            return false;
        };

        let leased = self
            .entries
            .get(&key)
            .is_some_and(|stored| {
                !stored.lease.is_visible_at(now) && stored.lease.receipt_id() == Some(receipt)
            });

        if !leased {
            return false;
        }

        self.entries.remove(&key);
        self.by_receipt.remove(receipt);
        true
    }

    /// Number of active entries, leased or not
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue holds no entries at all
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
