//! Per-app kind catalogue.
//!
//! Kindless queries need the set of kinds an app has ever written. The
//! catalogue persists one row per app in a shared table and keeps an
//! in-process cache of (table, kind) pairs already registered, so the
//! common case — a kind seen before — costs nothing.

use crate::error::CoreResult;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::collections::HashSet;
use std::sync::Arc;
use trellisdb_codec::{from_cbor, to_cbor};
use trellisdb_tables::{RowData, RowFetch, TableStore};

/// Table holding one catalogue row per app.
pub const CATALOG_TABLE: &str = "trellis_catalog";

/// Registry of the (kind, namespace) pairs each app has written.
pub struct KindCatalog {
    tables: Arc<dyn TableStore>,
    /// `app___kind___namespace` names this process already registered.
    seen: Mutex<HashSet<String>>,
}

impl KindCatalog {
    /// Creates a catalogue over a table store.
    pub fn new(tables: Arc<dyn TableStore>) -> Self {
        Self {
            tables,
            seen: Mutex::new(HashSet::new()),
        }
    }

    fn load(&self, app: &str) -> CoreResult<BTreeSet<(String, String)>> {
        match self.tables.get_row(CATALOG_TABLE, app)? {
            RowFetch::Found(row) => Ok(from_cbor(&row.value)?),
            RowFetch::Missing => Ok(BTreeSet::new()),
        }
    }

    /// Registers a kind for an app, writing through on first sight.
    pub fn note_kind(&self, app: &str, kind: &str, namespace: &str) -> CoreResult<()> {
        let cache_key = trellisdb_keys::table_name(app, kind, namespace);
        if self.seen.lock().contains(&cache_key) {
            return Ok(());
        }

        let mut kinds = self.load(app)?;
        if kinds.insert((kind.to_string(), namespace.to_string())) {
            let encoded = to_cbor(&kinds)?;
            self.tables
                .put_row(CATALOG_TABLE, app, RowData::journal(encoded))?;
        }
        self.seen.lock().insert(cache_key);
        Ok(())
    }

    /// Every kind the app has written in `namespace`, deduplicated.
    pub fn kinds(&self, app: &str, namespace: &str) -> CoreResult<Vec<String>> {
        Ok(self
            .load(app)?
            .into_iter()
            .filter(|(_, ns)| ns == namespace)
            .map(|(kind, _)| kind)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellisdb_tables::MemoryTables;

    fn catalog() -> KindCatalog {
        KindCatalog::new(Arc::new(MemoryTables::new()))
    }

    #[test]
    fn kinds_accumulate_per_app_and_namespace() {
        let catalog = catalog();
        catalog.note_kind("a1", "Foo", "").unwrap();
        catalog.note_kind("a1", "Bar", "").unwrap();
        catalog.note_kind("a1", "Baz", "other").unwrap();
        catalog.note_kind("a2", "Qux", "").unwrap();

        assert_eq!(catalog.kinds("a1", "").unwrap(), vec!["Bar", "Foo"]);
        assert_eq!(catalog.kinds("a1", "other").unwrap(), vec!["Baz"]);
        assert_eq!(catalog.kinds("a2", "").unwrap(), vec!["Qux"]);
        assert!(catalog.kinds("a3", "").unwrap().is_empty());
    }

    #[test]
    fn repeated_notes_write_once() {
        let tables = Arc::new(MemoryTables::new());
        let catalog = KindCatalog::new(Arc::clone(&tables) as Arc<dyn TableStore>);
        catalog.note_kind("a1", "Foo", "").unwrap();
        catalog.note_kind("a1", "Foo", "").unwrap();
        assert_eq!(catalog.kinds("a1", "").unwrap(), vec!["Foo"]);
        assert_eq!(tables.row_count(CATALOG_TABLE), 1);
    }
}
