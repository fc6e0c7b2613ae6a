//! Wire error taxonomy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error classes a response can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Structurally invalid or unsupported request.
    BadRequest,
    /// Another transaction holds the entity-group lock.
    ConcurrentTransaction,
    /// Backend or coordination failure.
    InternalError,
    /// A rollback the caller asked for could not be honored.
    PermissionDenied,
}

impl ErrorCode {
    /// Numeric code on the wire.
    #[must_use]
    pub fn wire_code(self) -> u8 {
        match self {
            ErrorCode::BadRequest => 1,
            ErrorCode::ConcurrentTransaction => 2,
            ErrorCode::InternalError => 3,
            ErrorCode::PermissionDenied => 4,
        }
    }

    /// Parses a numeric wire code.
    #[must_use]
    pub fn from_wire_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(ErrorCode::BadRequest),
            2 => Some(ErrorCode::ConcurrentTransaction),
            3 => Some(ErrorCode::InternalError),
            4 => Some(ErrorCode::PermissionDenied),
            _ => None,
        }
    }
}

/// An error carried in a response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code:?}: {detail}")]
pub struct RpcError {
    /// Error class.
    pub code: ErrorCode,
    /// Human-readable detail.
    pub detail: String,
}

impl RpcError {
    /// Creates an error.
    pub fn new(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_codes_round_trip() {
        for code in [
            ErrorCode::BadRequest,
            ErrorCode::ConcurrentTransaction,
            ErrorCode::InternalError,
            ErrorCode::PermissionDenied,
        ] {
            assert_eq!(ErrorCode::from_wire_code(code.wire_code()), Some(code));
        }
        assert_eq!(ErrorCode::from_wire_code(0), None);
        assert_eq!(ErrorCode::from_wire_code(9), None);
    }
}
