//! Coordination error types.

use thiserror::Error;

/// Result type for coordination operations.
pub type CoordResult<T> = Result<T, CoordError>;

/// Errors the coordination service can report.
///
/// Lock contention is its own variant: callers map it to the
/// CONCURRENT_TRANSACTION response code, everything else to internal
/// failures. None of these are retried at this layer.
#[derive(Debug, Error)]
pub enum CoordError {
    /// Another transaction holds the entity-group lock.
    #[error("entity group '{root_key}' is locked by transaction {holder}")]
    ConcurrentTransaction {
        /// Entity-group key that was contended.
        root_key: String,
        /// Handle of the current lock holder.
        holder: i64,
    },

    /// The service did not answer in time.
    #[error("coordination timeout during {operation}")]
    Timeout {
        /// Operation that timed out.
        operation: &'static str,
    },

    /// The request referenced an unknown or expired transaction handle.
    #[error("unknown transaction handle {handle} for app '{app}'")]
    UnknownTransaction {
        /// Application id.
        app: String,
        /// The unrecognized handle.
        handle: i64,
    },

    /// The request was structurally invalid for the service.
    #[error("invalid coordination request: {message}")]
    Invalid {
        /// Description of the problem.
        message: String,
    },

    /// The service is unreachable.
    #[error("coordination service unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },
}

impl CoordError {
    /// Creates an invalid-request error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Returns true for the distinguished lock-contention condition.
    #[must_use]
    pub fn is_concurrent(&self) -> bool {
        matches!(self, CoordError::ConcurrentTransaction { .. })
    }
}
