//! # Prioq Runtime
//!
//! Lightweight SQS-style priority message queue. Producers push messages
//! tagged with a priority; consumers pull one message at a time under a
//! lease (visibility timeout) and must acknowledge it by receipt before the
//! lease expires, or it becomes redeliverable. Delivery is at-least-once.
//!
//! This library provides:
//! - Priority-then-FCFS ordering with a single configurable comparator
//! - Lease management with lazy expiry (no background sweep)
//! - Per-queue mutual exclusion; queues do not contend with each other
//! - A pluggable backend contract with in-memory and Upstash Redis
//!   implementations
//!
//! ## Module Organization
//!
//! - [`error`] - Error types for all queue operations
//! - [`message`] - Message structures, receipts, and lease state
//! - [`clock`] - Substitutable time source
//! - [`queue`] - Core per-queue ordering and lease algorithm
//! - [`registry`] - Lazily populated queue registry
//! - [`config`] - Runtime and provider configuration
//! - [`client`] - Client contract and factory
//! - [`providers`] - Backend implementations

// Module declarations
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod message;
pub mod providers;
pub mod queue;
pub mod registry;

// Re-export commonly used types at crate root for convenience
pub use client::{QueueClient, QueueClientFactory};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    PriorityOrder, ProviderConfig, RuntimeConfig, UpstashRedisConfig, VisibilityTimeout,
};
pub use error::{ConfigurationError, QueueError, ValidationError};
pub use message::{LeaseState, Message, PulledMessage, QueueName, ReceiptId, Timestamp};
pub use providers::{InMemoryProvider, UpstashRedisProvider};
pub use queue::PriorityVisibilityQueue;
pub use registry::{QueueHandle, QueueRegistry};
