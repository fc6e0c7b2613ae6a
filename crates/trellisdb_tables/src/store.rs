//! Table-store trait definition.

use crate::error::TableResult;

/// One stored row: an opaque value plus the optional writer version.
///
/// Entity-table rows carry the version of the transaction that last wrote
/// them; journal rows are keyed by version and carry none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowData {
    /// Opaque stored value (encoded entity or tombstone).
    pub value: Vec<u8>,
    /// Version of the writing transaction, when the table tracks one.
    pub version: Option<i64>,
}

impl RowData {
    /// Creates an entity-table row carrying a writer version.
    #[must_use]
    pub fn head(value: Vec<u8>, version: i64) -> Self {
        Self {
            value,
            version: Some(version),
        }
    }

    /// Creates a journal row (version lives in the key).
    #[must_use]
    pub fn journal(value: Vec<u8>) -> Self {
        Self {
            value,
            version: None,
        }
    }
}

/// Outcome of a single-row read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowFetch {
    /// The row exists.
    Found(RowData),
    /// No such row (or no such table yet).
    Missing,
}

impl RowFetch {
    /// Returns the row data, if found.
    #[must_use]
    pub fn found(self) -> Option<RowData> {
        match self {
            RowFetch::Found(row) => Some(row),
            RowFetch::Missing => None,
        }
    }
}

/// A plain row-store backend.
///
/// # Invariants
///
/// - `scan_table` yields rows in ascending row-key order
/// - `put_row` creates the table on first write
/// - reads against a table that was never written behave as empty
/// - no call provides transactional guarantees; the engine layers its own
///   journaling protocol on top
pub trait TableStore: Send + Sync {
    /// Creates a table explicitly. Creating an existing table is a no-op.
    fn create_table(&self, name: &str) -> TableResult<()>;

    /// Scans every row of a table in key order. Missing table scans empty.
    fn scan_table(&self, name: &str) -> TableResult<Vec<(String, RowData)>>;

    /// Fetches one row.
    fn get_row(&self, table: &str, row_key: &str) -> TableResult<RowFetch>;

    /// Writes one row, creating the table if needed.
    fn put_row(&self, table: &str, row_key: &str, row: RowData) -> TableResult<()>;
}
