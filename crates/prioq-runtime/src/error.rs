//! Error types for queue operations.

use thiserror::Error;

/// Comprehensive error type for all queue operations.
///
/// Not-found conditions (unknown queue, stale or expired receipt) are *not*
/// errors anywhere in this crate: they are expected outcomes of normal
/// concurrent use and degrade to empty results or silent no-ops.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Backend error ({provider}): {message}")]
    Backend { provider: String, message: String },
}

impl QueueError {
    /// Build a backend error for a named provider.
    pub fn backend(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Check if error is transient and the operation may be retried by the
    /// caller. The runtime itself never retries (retry policy, including
    /// idempotency of repeated pushes, is a backend-specific concern).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Validation(_) => false,
            Self::Configuration(_) => false,
            Self::Backend { .. } => true,
        }
    }
}

/// Configuration errors. These fail fast at construction time; a service
/// must not start with an unusable visibility timeout or backend endpoint.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },
}

/// Validation errors for domain identifiers.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    Required { field: String },

    #[error("Invalid format for {field}: {message}")]
    InvalidFormat { field: String, message: String },

    #[error("Value out of range for {field}: {message}")]
    OutOfRange { field: String, message: String },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
