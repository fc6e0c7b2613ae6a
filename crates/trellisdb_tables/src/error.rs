//! Table-store error types.

use thiserror::Error;

/// Result type for table-store operations.
pub type TableResult<T> = Result<T, TableError>;

/// Errors a table backend may report.
#[derive(Debug, Error)]
pub enum TableError {
    /// The backend could not be reached or timed out.
    #[error("backend unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },

    /// The backend rejected the operation.
    #[error("backend rejected {operation} on '{table}': {message}")]
    Rejected {
        /// Operation name (`create_table`, `put_row`, ...).
        operation: &'static str,
        /// Table involved.
        table: String,
        /// Backend-reported detail.
        message: String,
    },

    /// A stored row violates the expected column layout.
    #[error("corrupt row '{row_key}' in '{table}': {message}")]
    CorruptRow {
        /// Table involved.
        table: String,
        /// Row involved.
        row_key: String,
        /// Description of the corruption.
        message: String,
    },
}

impl TableError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a rejected-operation error.
    pub fn rejected(
        operation: &'static str,
        table: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Rejected {
            operation,
            table: table.into(),
            message: message.into(),
        }
    }

    /// Creates a corrupt-row error.
    pub fn corrupt_row(
        table: impl Into<String>,
        row_key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::CorruptRow {
            table: table.into(),
            row_key: row_key.into(),
            message: message.into(),
        }
    }
}
