//! Client contract and factory for queue operations.

use crate::config::{ProviderConfig, RuntimeConfig};
use crate::error::QueueError;
use crate::message::{PulledMessage, QueueName, ReceiptId};
use crate::providers::{InMemoryProvider, UpstashRedisProvider};
use async_trait::async_trait;
use bytes::Bytes;

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

/// The queue operation contract. Every backend, whether the authoritative
/// in-memory core or a remote persistence backend, honors the same
/// visibility and ordering semantics behind these three operations.
///
/// Pull never blocks waiting for a message: `Ok(None)` is the sole
/// "nothing to do" signal, distinct from an error, and retry/polling is the
/// caller's responsibility. Unknown queues and stale receipts are silent
/// no-ops for delete and empty results for pull, never errors.
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Push a message onto a queue, creating the queue if absent
    async fn push(
        &self,
        queue: &QueueName,
        body: Bytes,
        priority: i32,
    ) -> Result<(), QueueError>;

    /// Lease the highest-priority visible message from a queue
    async fn pull(&self, queue: &QueueName) -> Result<Option<PulledMessage>, QueueError>;

    /// Acknowledge a leased message by its receipt, removing it permanently
    async fn delete(&self, queue: &QueueName, receipt: &ReceiptId) -> Result<(), QueueError>;
}

/// Factory for creating queue clients with the configured backend
pub struct QueueClientFactory;

impl QueueClientFactory {
    /// Create a queue client from configuration.
    ///
    /// Configuration is validated before any backend is built; an unusable
    /// visibility timeout or endpoint fails here rather than at first use.
    pub fn create_client(config: RuntimeConfig) -> Result<Box<dyn QueueClient>, QueueError> {
        config.validate()?;

        let client: Box<dyn QueueClient> = match config.provider {
            ProviderConfig::InMemory => Box::new(InMemoryProvider::new(
                config.visibility_timeout,
                config.priority_order,
            )),
            ProviderConfig::UpstashRedis(redis_config) => Box::new(UpstashRedisProvider::new(
                redis_config,
                config.visibility_timeout,
                config.priority_order,
            )?),
        };

        Ok(client)
    }

    /// Create a client with the in-memory backend and default configuration
    pub fn create_test_client() -> Box<dyn QueueClient> {
        Box::new(InMemoryProvider::default())
    }
}
