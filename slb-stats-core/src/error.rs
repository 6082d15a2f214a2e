//! Error types for stats generation and cache coordination

use std::time::Duration;
use thiserror::Error;

/// Errors raised while producing or serving the stats payload.
///
/// Every variant is surfaced unchanged from the generator to the cache
/// coordinator and from there to the HTTP layer. None are recovered
/// internally.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StatsError {
    /// Query execution or connectivity failure in the backing store.
    #[error("Backing store error: {reason}")]
    BackingStore { reason: String },

    /// A row came back with a column that could not be decoded.
    #[error("Malformed row in column {column}: {reason}")]
    MalformedRow { column: String, reason: String },

    /// The operation did not finish within its bounded window.
    #[error("{operation} timed out after {after:?}")]
    Timeout { operation: String, after: Duration },

    /// The payload could not be encoded.
    #[error("Serialization failed: {reason}")]
    Serialization { reason: String },

    /// The spawned refresh task died before reporting a result.
    #[error("Refresh aborted: {reason}")]
    RefreshAborted { reason: String },

    #[error("Cache entry lock poisoned")]
    LockPoisoned,

    #[error("Invalid configuration for {field}: {reason}")]
    InvalidConfig { field: String, reason: String },
}

impl StatsError {
    /// Create a BackingStore error.
    pub fn backing_store(reason: impl Into<String>) -> Self {
        Self::BackingStore {
            reason: reason.into(),
        }
    }

    /// Create a MalformedRow error.
    pub fn malformed_row(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedRow {
            column: column.into(),
            reason: reason.into(),
        }
    }

    /// Create a Timeout error.
    pub fn timeout(operation: impl Into<String>, after: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            after,
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for failures that came from the bounded refresh window.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<serde_json::Error> for StatsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}

/// Result type for stats operations.
pub type StatsResult<T> = Result<T, StatsError>;
