//! In-memory table store.

use crate::error::TableResult;
use crate::store::{RowData, RowFetch, TableStore};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// An in-memory table store.
///
/// Suitable for unit and integration tests and for ephemeral single-process
/// deployments. Tables are sorted maps, so scans come back in key order the
/// same way a real sorted row store would return them.
///
/// # Thread Safety
///
/// All tables sit behind one `RwLock`; the store can be shared freely.
///
/// # Example
///
/// ```rust
/// use trellisdb_tables::{MemoryTables, RowData, RowFetch, TableStore};
///
/// let tables = MemoryTables::new();
/// tables.put_row("t", "k", RowData::head(vec![1], 7)).unwrap();
/// let fetched = tables.get_row("t", "k").unwrap().found().unwrap();
/// assert_eq!(fetched.version, Some(7));
/// assert_eq!(tables.get_row("t", "absent").unwrap(), RowFetch::Missing);
/// ```
#[derive(Debug, Default)]
pub struct MemoryTables {
    tables: RwLock<BTreeMap<String, BTreeMap<String, RowData>>>,
}

impl MemoryTables {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tables that exist (created or written).
    #[must_use]
    pub fn table_count(&self) -> usize {
        self.tables.read().len()
    }

    /// Number of rows in one table; 0 when the table does not exist.
    #[must_use]
    pub fn row_count(&self, name: &str) -> usize {
        self.tables.read().get(name).map_or(0, BTreeMap::len)
    }
}

impl TableStore for MemoryTables {
    fn create_table(&self, name: &str) -> TableResult<()> {
        self.tables
            .write()
            .entry(name.to_string())
            .or_insert_with(BTreeMap::new);
        Ok(())
    }

    fn scan_table(&self, name: &str) -> TableResult<Vec<(String, RowData)>> {
        let tables = self.tables.read();
        Ok(tables.get(name).map_or_else(Vec::new, |table| {
            table.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
        }))
    }

    fn get_row(&self, table: &str, row_key: &str) -> TableResult<RowFetch> {
        let tables = self.tables.read();
        Ok(tables
            .get(table)
            .and_then(|t| t.get(row_key))
            .map_or(RowFetch::Missing, |row| RowFetch::Found(row.clone())))
    }

    fn put_row(&self, table: &str, row_key: &str, row: RowData) -> TableResult<()> {
        self.tables
            .write()
            .entry(table.to_string())
            .or_insert_with(BTreeMap::new)
            .insert(row_key.to_string(), row);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_creates_the_table() {
        let tables = MemoryTables::new();
        assert_eq!(tables.table_count(), 0);
        tables.put_row("t", "a", RowData::journal(vec![1])).unwrap();
        assert_eq!(tables.table_count(), 1);
        assert_eq!(tables.row_count("t"), 1);
    }

    #[test]
    fn missing_table_reads_as_empty() {
        let tables = MemoryTables::new();
        assert_eq!(tables.get_row("nope", "k").unwrap(), RowFetch::Missing);
        assert!(tables.scan_table("nope").unwrap().is_empty());
    }

    #[test]
    fn create_table_is_idempotent() {
        let tables = MemoryTables::new();
        tables.put_row("t", "a", RowData::journal(vec![1])).unwrap();
        tables.create_table("t").unwrap();
        assert_eq!(tables.row_count("t"), 1);
    }

    #[test]
    fn scans_come_back_in_key_order() {
        let tables = MemoryTables::new();
        for key in ["b", "a", "c"] {
            tables
                .put_row("t", key, RowData::head(key.as_bytes().to_vec(), 1))
                .unwrap();
        }
        let keys: Vec<_> = tables
            .scan_table("t")
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }

    #[test]
    fn overwrite_replaces_value_and_version() {
        let tables = MemoryTables::new();
        tables.put_row("t", "k", RowData::head(vec![1], 1)).unwrap();
        tables.put_row("t", "k", RowData::head(vec![2], 9)).unwrap();
        let row = tables.get_row("t", "k").unwrap().found().unwrap();
        assert_eq!(row.value, vec![2]);
        assert_eq!(row.version, Some(9));
    }
}
