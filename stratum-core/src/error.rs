//! Error types for Stratum cache operations.

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced to callers of the cache facade.
///
/// Durable-tier failures are deliberately NOT represented here: they are
/// recovered inside the facade (miss / no-op plus a diagnostic log line) so
/// the cache degrades to memory-only operation instead of failing calls.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    /// No registry entry exists for the key and no complete override was
    /// supplied. Fatal to the `set` call.
    #[error("No policy for key '{key}' and no complete override supplied")]
    MissingPolicy { key: String },
}

/// Durable-tier errors.
///
/// These never propagate out of `get`/`set`; the facade logs them and
/// treats reads as misses and writes as no-ops.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Read failed: {reason}")]
    ReadFailed { reason: String },

    #[error("Write failed: {reason}")]
    WriteFailed { reason: String },

    #[error("Serialization failed: {reason}")]
    Serialization { reason: String },

    #[error("Deserialization failed: {reason}")]
    Deserialization { reason: String },

    #[error("Operation '{operation}' timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },
}

/// Configuration errors, fatal at process start.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unrecognized priority value: {value}")]
    UnknownPriority { value: String },

    #[error("Unrecognized sensitivity value: {value}")]
    UnknownSensitivity { value: String },

    #[error("Freshness window for '{key}' must be positive")]
    InvalidFreshnessWindow { key: String },

    #[error("Cache capacity must be at least 1")]
    ZeroCapacity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_policy_names_key() {
        let err = CacheError::MissingPolicy {
            key: "emergencyContacts".to_string(),
        };
        assert!(err.to_string().contains("emergencyContacts"));
    }

    #[test]
    fn test_timeout_message_includes_operation() {
        let err = StorageError::Timeout {
            operation: "read",
            timeout: Duration::from_secs(2),
        };
        assert!(err.to_string().contains("read"));
    }
}
