//! Error types for the storage engine.

use thiserror::Error;
use trellisdb_codec::CodecError;
use trellisdb_coord::CoordError;
use trellisdb_tables::TableError;

/// Result type for engine operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in the storage engine.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Backend table failure.
    #[error("table store error: {0}")]
    Table(#[from] TableError),

    /// Stored bytes could not be decoded; the row is corrupt.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Coordination service failure (including lock contention).
    #[error("coordination error: {0}")]
    Coordination(#[from] CoordError),

    /// A child id was requested without a resolved entity-group root.
    #[error("cannot allocate a child id: no entity-group root key")]
    MissingRootKey,

    /// A key's path cannot be turned into a row key.
    #[error("unresolvable key: {detail}")]
    MissingRowKey {
        /// Which key and why.
        detail: String,
    },

    /// The journal entry a read was redirected to does not exist.
    #[error("journal entry missing for '{row_key}' version {version}")]
    JournalMissing {
        /// Row the lookup was for.
        row_key: String,
        /// Version the journal was consulted at.
        version: i64,
    },

    /// The writes landed durably but the commit acknowledgment failed.
    ///
    /// Surfaced to callers as an internal error; kept distinct so the
    /// dispatcher can log it as a known-durable failure.
    #[error("commit failed after durable writes: {source}")]
    CommitAfterWrite {
        /// The underlying coordination failure.
        #[source]
        source: CoordError,
    },

    /// Bulk id allocation did not converge within the configured rounds.
    #[error("id allocation exhausted after {rounds} block requests")]
    AllocationExhausted {
        /// Number of block requests made.
        rounds: u32,
    },

    /// Structurally invalid request.
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// Description of the problem.
        message: String,
    },
}

impl CoreError {
    /// Creates an unresolvable-key error.
    pub fn missing_row_key(detail: impl Into<String>) -> Self {
        Self::MissingRowKey {
            detail: detail.into(),
        }
    }

    /// Creates an invalid-request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// True when the error is the distinguished lock-contention condition.
    #[must_use]
    pub fn is_concurrent(&self) -> bool {
        matches!(self, CoreError::Coordination(e) if e.is_concurrent())
    }

    /// True when the error means the caller sent a malformed request.
    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            CoreError::MissingRootKey
                | CoreError::MissingRowKey { .. }
                | CoreError::InvalidRequest { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concurrent_classification() {
        let err = CoreError::Coordination(CoordError::ConcurrentTransaction {
            root_key: "a/Foo:1".into(),
            holder: 3,
        });
        assert!(err.is_concurrent());
        assert!(!err.is_bad_request());

        let err = CoreError::Coordination(CoordError::Timeout {
            operation: "acquire_lock",
        });
        assert!(!err.is_concurrent());
    }

    #[test]
    fn bad_request_classification() {
        assert!(CoreError::MissingRootKey.is_bad_request());
        assert!(CoreError::missing_row_key("no id").is_bad_request());
        assert!(!CoreError::AllocationExhausted { rounds: 4 }.is_bad_request());
    }
}
