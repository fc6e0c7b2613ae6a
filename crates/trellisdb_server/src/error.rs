//! Error types for the datastore service.

use thiserror::Error;
use trellisdb_coord::CoordError;
use trellisdb_core::CoreError;
use trellisdb_proto::ErrorCode;

/// Result type for service handlers.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors a handler can surface.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Structurally invalid request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The request named a method the service does not speak.
    #[error("unknown method '{0}'")]
    UnknownMethod(String),

    /// Storage engine failure.
    #[error(transparent)]
    Engine(#[from] CoreError),

    /// Coordination failure outside the engine (explicit transaction
    /// management, request-level lock acquisition).
    #[error("coordination error: {0}")]
    Coordination(#[from] CoordError),

    /// The commit acknowledgment failed; the transaction's writes are
    /// already durable.
    #[error("commit failed: {0}")]
    CommitFailed(#[source] CoordError),

    /// A rollback the caller asked for could not be honored, so the
    /// transaction's writes may still become visible.
    #[error("rollback failed: {0}")]
    RollbackFailed(#[source] CoordError),
}

impl ServerError {
    /// Maps the error onto the wire taxonomy.
    #[must_use]
    pub fn error_code(&self) -> ErrorCode {
        match self {
            ServerError::InvalidRequest(_) | ServerError::UnknownMethod(_) => ErrorCode::BadRequest,
            ServerError::Engine(e) if e.is_bad_request() => ErrorCode::BadRequest,
            ServerError::Engine(e) if e.is_concurrent() => ErrorCode::ConcurrentTransaction,
            ServerError::Coordination(e) if e.is_concurrent() => ErrorCode::ConcurrentTransaction,
            ServerError::RollbackFailed(_) => ErrorCode::PermissionDenied,
            _ => ErrorCode::InternalError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_mapping() {
        assert_eq!(
            ServerError::InvalidRequest("x".into()).error_code(),
            ErrorCode::BadRequest
        );
        assert_eq!(
            ServerError::UnknownMethod("Frobnicate".into()).error_code(),
            ErrorCode::BadRequest
        );
        assert_eq!(
            ServerError::Engine(CoreError::MissingRootKey).error_code(),
            ErrorCode::BadRequest
        );
        assert_eq!(
            ServerError::Coordination(CoordError::ConcurrentTransaction {
                root_key: "a1/Foo:1".into(),
                holder: 3,
            })
            .error_code(),
            ErrorCode::ConcurrentTransaction
        );
        assert_eq!(
            ServerError::RollbackFailed(CoordError::Timeout {
                operation: "notify_failed_transaction".into(),
            })
            .error_code(),
            ErrorCode::PermissionDenied
        );
        assert_eq!(
            ServerError::CommitFailed(CoordError::Timeout {
                operation: "release_lock".into(),
            })
            .error_code(),
            ErrorCode::InternalError
        );
    }
}
