//! Message types and core domain identifiers.

use crate::error::ValidationError;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ============================================================================
// Core Domain Identifiers
// ============================================================================

/// Validated queue identifier.
///
/// Queue identifiers are opaque strings chosen by producers; the original
/// deployment used full SQS-style URLs, so everything printable is accepted.
/// Only length and control characters are restricted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueName(String);

impl QueueName {
    /// Create new queue name with validation
    pub fn new(name: String) -> Result<Self, ValidationError> {
        if name.is_empty() {
            return Err(ValidationError::Required {
                field: "queue_name".to_string(),
            });
        }

        if name.len() > 512 {
            return Err(ValidationError::OutOfRange {
                field: "queue_name".to_string(),
                message: "must be 1-512 bytes".to_string(),
            });
        }

        if name.chars().any(|c| c.is_control()) {
            return Err(ValidationError::InvalidFormat {
                field: "queue_name".to_string(),
                message: "control characters not allowed".to_string(),
            });
        }

        Ok(Self(name))
    }

    /// Get queue name as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QueueName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for QueueName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

/// Opaque token identifying the current lease on a message.
///
/// A fresh receipt is generated on every successful pull; the previous
/// receipt stops being accepted at that moment. It is the only credential
/// `delete` honors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReceiptId(String);

impl ReceiptId {
    /// Generate a new random receipt
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get receipt as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReceiptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ReceiptId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ValidationError::Required {
                field: "receipt_id".to_string(),
            });
        }

        Ok(Self(s.to_string()))
    }
}

/// Timestamp wrapper for consistent time handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create timestamp for current time
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Create timestamp from DateTime
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Create timestamp from milliseconds since the Unix epoch.
    ///
    /// Out-of-range values saturate to the epoch; the wire format never
    /// produces them in practice.
    pub fn from_timestamp_millis(millis: i64) -> Self {
        Self(DateTime::from_timestamp_millis(millis).unwrap_or_default())
    }

    /// Get underlying DateTime
    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Milliseconds since the Unix epoch (the wire-format unit)
    pub fn timestamp_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S%.3f UTC"))
    }
}

// ============================================================================
// Message Types
// ============================================================================

/// The immutable core of a queued message: fixed at push time, never
/// mutated afterwards. Lease bookkeeping lives in [`LeaseState`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(with = "bytes_serde")]
    pub body: Bytes,
    pub priority: i32,
    pub created_at: Timestamp,
}

impl Message {
    /// Create new message with body and priority, stamped at `created_at`
    pub fn new(body: Bytes, priority: i32, created_at: Timestamp) -> Self {
        Self {
            body,
            priority,
            created_at,
        }
    }
}

/// Custom serialization for Bytes
pub(crate) mod bytes_serde {
    use base64::{engine::general_purpose, Engine as _};
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let encoded = general_purpose::STANDARD.encode(bytes);
        encoded.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Bytes, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        let decoded = general_purpose::STANDARD
            .decode(encoded)
            .map_err(serde::de::Error::custom)?;
        Ok(Bytes::from(decoded))
    }
}

/// Mutable lease bookkeeping for one message.
///
/// Invariant: the message is visible at time `t` iff `visible_from < t`
/// (strict). A message holds at most one active lease at any instant; the
/// receipt recorded here is the credential for that lease.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseState {
    attempts: u32,
    receipt_id: Option<ReceiptId>,
    visible_from: Timestamp,
}

impl LeaseState {
    /// Fresh lease state for a newly pushed message: zero attempts, no
    /// receipt, visible from its creation instant.
    pub fn new(created_at: Timestamp) -> Self {
        Self {
            attempts: 0,
            receipt_id: None,
            visible_from: created_at,
        }
    }

    /// Rebuild lease state from wire fields (remote backend round-trip)
    pub fn from_parts(
        attempts: u32,
        receipt_id: Option<ReceiptId>,
        visible_from: Timestamp,
    ) -> Self {
        Self {
            attempts,
            receipt_id,
            visible_from,
        }
    }

    /// Check visibility at an instant. Strictly less-than: a message pulled
    /// at `t` with its lease expiring exactly at `t` is still leased.
    pub fn is_visible_at(&self, instant: Timestamp) -> bool {
        self.visible_from < instant
    }

    /// Grant a lease: record the new receipt, count the delivery attempt,
    /// and hide the message until `hidden_until`.
    pub fn grant(&mut self, receipt: ReceiptId, hidden_until: Timestamp) {
        self.receipt_id = Some(receipt);
        self.attempts += 1;
        self.visible_from = hidden_until;
    }

    /// Delivery attempts so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Receipt of the most recent lease, if the message was ever pulled
    pub fn receipt_id(&self) -> Option<&ReceiptId> {
        self.receipt_id.as_ref()
    }

    /// Instant from which the message is (or becomes) visible
    pub fn visible_from(&self) -> Timestamp {
        self.visible_from
    }
}

/// A message handed to a consumer by pull: a detached copy of the leased
/// entry. Mutating it has no effect on queue state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PulledMessage {
    pub body: Bytes,
    pub receipt_id: ReceiptId,
    pub priority: i32,
    pub attempts: u32,
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
