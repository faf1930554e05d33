//! Shared helpers for integration tests.

// Each test binary compiles its own copy of this module and not every
// binary uses every helper.
#![allow(dead_code)]

use bytes::Bytes;
use prioq_runtime::{QueueClient, QueueClientFactory, QueueName};
use std::sync::Arc;

/// Build a default in-memory client through the public factory.
pub fn test_client() -> Arc<dyn QueueClient> {
    Arc::from(QueueClientFactory::create_test_client())
}

/// Parse a queue name, panicking on invalid test input.
pub fn queue(name: &str) -> QueueName {
    name.parse().expect("test queue name must be valid")
}

/// Shorthand for a UTF-8 payload.
pub fn body(text: &str) -> Bytes {
    Bytes::from(text.to_string())
}
