//! Runtime configuration types.

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use url::Url;

/// Direction of the priority comparator, fixed once, system-wide.
///
/// The same comparator drives both insert order and the pull scan, so the
/// two can never disagree. The default is `LowestFirst`: priority 1 is
/// served before priority 2. Every queue in the process follows the
/// configured direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PriorityOrder {
    /// Lower numeric priority is served first (1 before 2)
    #[default]
    LowestFirst,
    /// Higher numeric priority is served first (2 before 1)
    HighestFirst,
}

impl PriorityOrder {
    /// Map a message priority to its ordering rank; lower rank is served
    /// first regardless of direction.
    pub fn rank_of(&self, priority: i32) -> i64 {
        match self {
            Self::LowestFirst => i64::from(priority),
            Self::HighestFirst => -i64::from(priority),
        }
    }
}

/// Lease duration granted by a successful pull, in whole seconds.
///
/// A zero timeout would make every lease already expired at grant time, so
/// construction rejects it; the service must not start with an unusable
/// timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct VisibilityTimeout(u64);

impl VisibilityTimeout {
    /// Default lease duration when unset: 30 seconds
    pub const DEFAULT_SECS: u64 = 30;

    /// Create a visibility timeout from whole seconds
    pub fn from_secs(secs: u64) -> Result<Self, ConfigurationError> {
        if secs == 0 {
            return Err(ConfigurationError::Invalid {
                message: "visibility_timeout must be at least 1 second".to_string(),
            });
        }

        Ok(Self(secs))
    }

    /// Timeout in whole seconds
    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Timeout as a chrono duration for timestamp arithmetic
    pub fn as_duration(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.0 as i64)
    }
}

impl Default for VisibilityTimeout {
    fn default() -> Self {
        Self(Self::DEFAULT_SECS)
    }
}

impl TryFrom<u64> for VisibilityTimeout {
    type Error = ConfigurationError;

    fn try_from(secs: u64) -> Result<Self, Self::Error> {
        Self::from_secs(secs)
    }
}

impl From<VisibilityTimeout> for u64 {
    fn from(timeout: VisibilityTimeout) -> Self {
        timeout.as_secs()
    }
}

/// Configuration for queue client initialization
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub visibility_timeout: VisibilityTimeout,
    pub priority_order: PriorityOrder,
    pub provider: ProviderConfig,
}

impl RuntimeConfig {
    /// Validate the configuration, failing fast before any provider is built
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match &self.provider {
            ProviderConfig::InMemory => Ok(()),
            ProviderConfig::UpstashRedis(config) => config.validate(),
        }
    }
}

/// Provider-specific configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum ProviderConfig {
    /// Authoritative single-process queue, no external state
    #[default]
    InMemory,
    /// Remote sorted-set backend over the Upstash Redis REST API
    UpstashRedis(UpstashRedisConfig),
}

/// Upstash Redis REST backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstashRedisConfig {
    /// REST endpoint, e.g. `https://my-db.upstash.io`
    pub endpoint: String,
    /// Bearer token for the REST API
    pub token: String,
}

impl UpstashRedisConfig {
    /// Validate endpoint URL and token presence
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.endpoint.is_empty() {
            return Err(ConfigurationError::Missing {
                key: "upstash_redis.endpoint".to_string(),
            });
        }

        let url = Url::parse(&self.endpoint).map_err(|e| ConfigurationError::Invalid {
            message: format!("upstash_redis.endpoint is not a valid URL: {e}"),
        })?;

        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(ConfigurationError::Invalid {
                message: format!(
                    "upstash_redis.endpoint must be http(s), got '{}'",
                    url.scheme()
                ),
            });
        }

        if self.token.is_empty() {
            return Err(ConfigurationError::Missing {
                key: "upstash_redis.token".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
