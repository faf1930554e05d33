//! Upstash Redis sorted-set backend over the REST API.
//!
//! Messages live in one sorted set per queue identifier. The member is the
//! JSON-encoded wire record; the score encodes priority-then-arrival order,
//! so a plain `ZRANGE` yields members in exactly the order the in-memory
//! core would scan them:
//!
//! ```text
//! score = rank + created_at_ms / 1e13
//! ```
//!
//! where `rank` is the direction-adjusted priority. The millisecond
//! timestamp divided by 1e13 stays below 1 for any realistic date, so the
//! fractional part never bleeds into the priority component.
//!
//! Commands are sent as JSON arrays over HTTP (`["ZADD", key, score,
//! member]`) with bearer-token authentication, the same direct-REST shape
//! used for the other hosted backends. This keeps the provider testable
//! against a mocked HTTP server without real infrastructure.
//!
//! Failure semantics: any transport, HTTP, or decode failure is surfaced to
//! the caller as a fatal backend error and never retried here. The
//! read-modify-write between `ZRANGE` and `ZADD` is not transactional;
//! single-writer discipline across broker instances is this backend's own
//! concern, not the core's.

use crate::client::QueueClient;
use crate::clock::{Clock, SystemClock};
use crate::config::{PriorityOrder, UpstashRedisConfig, VisibilityTimeout};
use crate::error::{ConfigurationError, QueueError};
use crate::message::{PulledMessage, QueueName, ReceiptId};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

#[cfg(test)]
#[path = "redis_tests.rs"]
mod tests;

/// Provider name used in backend error reports
const PROVIDER_NAME: &str = "upstash-redis";

// ============================================================================
// Error Types
// ============================================================================

/// Upstash REST specific errors
#[derive(Debug, thiserror::Error)]
pub enum RedisRestError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Redis command failed with HTTP {status}: {body}")]
    Service { status: u16, body: String },

    #[error("Unexpected response shape: {0}")]
    Protocol(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl RedisRestError {
    /// Map into the crate-level error type
    pub fn to_queue_error(self) -> QueueError {
        match self {
            Self::Configuration(message) => {
                QueueError::Configuration(ConfigurationError::Invalid { message })
            }
            other => QueueError::backend(PROVIDER_NAME, other.to_string()),
        }
    }
}

// ============================================================================
// Wire Format
// ============================================================================

/// JSON record stored as the sorted-set member. Field layout is the
/// backend's serialization contract; timestamps are epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct WireMessage {
    #[serde(with = "crate::message::bytes_serde")]
    body: Bytes,
    priority: i32,
    created_at_ms: i64,
    receipt_id: Option<String>,
    visible_from_ms: i64,
    attempts: u32,
}

impl WireMessage {
    fn is_visible_at(&self, now_ms: i64) -> bool {
        self.visible_from_ms < now_ms
    }
}

/// A fetched member: the exact stored string (needed for ZREM) plus its
/// decoded record.
struct FetchedMember {
    raw: String,
    wire: WireMessage,
}

// ============================================================================
// UpstashRedisProvider
// ============================================================================

/// Remote queue backend on an Upstash Redis sorted set
pub struct UpstashRedisProvider {
    http: HttpClient,
    endpoint: Url,
    token: String,
    clock: Arc<dyn Clock>,
    visibility_timeout: chrono::Duration,
    order: PriorityOrder,
}

impl UpstashRedisProvider {
    /// Create a backend with the wall clock
    pub fn new(
        config: UpstashRedisConfig,
        visibility_timeout: VisibilityTimeout,
        order: PriorityOrder,
    ) -> Result<Self, QueueError> {
        Self::with_clock(config, visibility_timeout, order, Arc::new(SystemClock))
    }

    /// Create a backend with an injected clock (deterministic tests)
    pub fn with_clock(
        config: UpstashRedisConfig,
        visibility_timeout: VisibilityTimeout,
        order: PriorityOrder,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, QueueError> {
        config.validate()?;
        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            RedisRestError::Configuration(format!("endpoint is not a valid URL: {e}"))
                .to_queue_error()
        })?;

        Ok(Self {
            http: HttpClient::new(),
            endpoint,
            token: config.token,
            clock,
            visibility_timeout: visibility_timeout.as_duration(),
            order,
        })
    }

    /// Score preserving priority-then-FCFS order under ZRANGE
    fn score(&self, priority: i32, created_at_ms: i64) -> f64 {
        self.order.rank_of(priority) as f64 + created_at_ms as f64 / 1e13
    }

    /// Execute one Redis command via the REST endpoint, returning the
    /// `result` payload.
    async fn execute(&self, command: &[String]) -> Result<serde_json::Value, RedisRestError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.token)
            .json(&command)
            .send()
            .await
            .map_err(|e| RedisRestError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RedisRestError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(RedisRestError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| RedisRestError::Protocol(format!("response is not JSON: {e}")))?;

        value
            .get("result")
            .cloned()
            .ok_or_else(|| RedisRestError::Protocol("response has no 'result' field".to_string()))
    }

    /// Fetch all members of the queue's sorted set in score order
    async fn fetch_members(&self, queue: &QueueName) -> Result<Vec<FetchedMember>, RedisRestError> {
        let result = self
            .execute(&[
                "ZRANGE".to_string(),
                queue.as_str().to_string(),
                "0".to_string(),
                "-1".to_string(),
            ])
            .await?;

        let Some(raw_members) = result.as_array() else {
            return Err(RedisRestError::Protocol(
                "ZRANGE result is not an array".to_string(),
            ));
        };

        let mut members = Vec::with_capacity(raw_members.len());
        for raw in raw_members {
            let Some(raw) = raw.as_str() else {
                return Err(RedisRestError::Protocol(
                    "ZRANGE member is not a string".to_string(),
                ));
            };
            let wire: WireMessage = serde_json::from_str(raw)
                .map_err(|e| RedisRestError::Protocol(format!("undecodable member: {e}")))?;
            members.push(FetchedMember {
                raw: raw.to_string(),
                wire,
            });
        }

        Ok(members)
    }

    async fn store(
        &self,
        queue: &QueueName,
        wire: &WireMessage,
    ) -> Result<(), RedisRestError> {
        let member = serde_json::to_string(wire)
            .map_err(|e| RedisRestError::Protocol(format!("unencodable member: {e}")))?;
        let score = self.score(wire.priority, wire.created_at_ms);

        self.execute(&[
            "ZADD".to_string(),
            queue.as_str().to_string(),
            score.to_string(),
            member,
        ])
        .await?;

        Ok(())
    }

    async fn remove(&self, queue: &QueueName, raw_member: &str) -> Result<(), RedisRestError> {
        self.execute(&[
            "ZREM".to_string(),
            queue.as_str().to_string(),
            raw_member.to_string(),
        ])
        .await?;

        Ok(())
    }
}

#[async_trait]
impl QueueClient for UpstashRedisProvider {
    async fn push(
        &self,
        queue: &QueueName,
        body: Bytes,
        priority: i32,
    ) -> Result<(), QueueError> {
        let now_ms = self.clock.now().timestamp_millis();
        let wire = WireMessage {
            body,
            priority,
            created_at_ms: now_ms,
            receipt_id: None,
            visible_from_ms: now_ms,
            attempts: 0,
        };

        self.store(queue, &wire).await.map_err(|e| {
            warn!(queue_id = %queue, error = %e, "push failed");
            e.to_queue_error()
        })?;

        debug!(queue_id = %queue, %priority, "message pushed");
        Ok(())
    }

    async fn pull(&self, queue: &QueueName) -> Result<Option<PulledMessage>, QueueError> {
        let now_ms = self.clock.now().timestamp_millis();
        let members = self
            .fetch_members(queue)
            .await
            .map_err(RedisRestError::to_queue_error)?;

        let Some(member) = members.iter().find(|m| m.wire.is_visible_at(now_ms)) else {
            debug!(queue_id = %queue, "no visible message");
            return Ok(None);
        };

        // Replace the stored record under a fresh lease. The score is a
        // function of priority and created_at only, so the entry keeps its
        // position in the set.
        let receipt = ReceiptId::generate();
        let mut updated = member.wire.clone();
        updated.receipt_id = Some(receipt.as_str().to_string());
        updated.attempts += 1;
        updated.visible_from_ms = now_ms + self.visibility_timeout.num_milliseconds();

        self.remove(queue, &member.raw)
            .await
            .map_err(RedisRestError::to_queue_error)?;
        self.store(queue, &updated)
            .await
            .map_err(RedisRestError::to_queue_error)?;

        debug!(
            queue_id = %queue,
            receipt = %receipt,
            priority = updated.priority,
            attempts = updated.attempts,
            "message leased"
        );

        Ok(Some(PulledMessage {
            body: updated.body,
            receipt_id: receipt,
            priority: updated.priority,
            attempts: updated.attempts,
        }))
    }

    async fn delete(&self, queue: &QueueName, receipt: &ReceiptId) -> Result<(), QueueError> {
        let now_ms = self.clock.now().timestamp_millis();
        let members = self
            .fetch_members(queue)
            .await
            .map_err(RedisRestError::to_queue_error)?;

        // Only a currently leased (invisible) entry is a candidate; a
        // visible entry's old receipt is no longer a valid credential.
        let target = members.iter().find(|m| {
            !m.wire.is_visible_at(now_ms) && m.wire.receipt_id.as_deref() == Some(receipt.as_str())
        });

        let Some(member) = target else {
            debug!(queue_id = %queue, %receipt, "delete matched no leased message");
            return Ok(());
        };

        self.remove(queue, &member.raw)
            .await
            .map_err(RedisRestError::to_queue_error)?;

        debug!(queue_id = %queue, %receipt, "message acknowledged");
        Ok(())
    }
}
