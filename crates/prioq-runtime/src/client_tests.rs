//! Tests for the client factory.

use super::*;
use crate::config::{UpstashRedisConfig, VisibilityTimeout};

/// Verify the default configuration builds an in-memory client.
#[test]
fn test_create_client_with_defaults() {
    let client = QueueClientFactory::create_client(RuntimeConfig::default());
    assert!(client.is_ok());
}

/// Verify a valid Upstash configuration builds a client.
#[test]
fn test_create_client_with_redis_config() {
    let config = RuntimeConfig {
        provider: ProviderConfig::UpstashRedis(UpstashRedisConfig {
            endpoint: "https://my-db.upstash.io".to_string(),
            token: "secret-token".to_string(),
        }),
        ..Default::default()
    };

    assert!(QueueClientFactory::create_client(config).is_ok());
}

/// Verify an unusable backend configuration fails at creation, not at
/// first use.
#[test]
fn test_create_client_rejects_bad_config() {
    let config = RuntimeConfig {
        provider: ProviderConfig::UpstashRedis(UpstashRedisConfig {
            endpoint: "https://my-db.upstash.io".to_string(),
            token: String::new(),
        }),
        ..Default::default()
    };

    let result = QueueClientFactory::create_client(config);
    assert!(matches!(
        result,
        Err(crate::error::QueueError::Configuration(_))
    ));
}

/// Verify a custom visibility timeout passes through the factory.
#[test]
fn test_create_client_with_custom_timeout() {
    let config = RuntimeConfig {
        visibility_timeout: VisibilityTimeout::from_secs(5).unwrap(),
        ..Default::default()
    };

    assert!(QueueClientFactory::create_client(config).is_ok());
}

/// Verify the test client supports the full operation contract.
#[tokio::test]
async fn test_test_client_round_trip() {
    let client = QueueClientFactory::create_test_client();
    let queue: QueueName = "smoke".parse().unwrap();

    client
        .push(&queue, Bytes::from_static(b"payload"), 1)
        .await
        .unwrap();

    let pulled = client.pull(&queue).await.unwrap().unwrap();
    assert_eq!(pulled.body, Bytes::from_static(b"payload"));

    client.delete(&queue, &pulled.receipt_id).await.unwrap();
    assert!(client.pull(&queue).await.unwrap().is_none());
}
