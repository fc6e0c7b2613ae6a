//! The entity-group storage engine.
//!
//! [`GroupStore`] implements the journaled write protocol and the
//! validity-checked read protocol over a [`TableStore`] backend and a
//! [`Coordinator`]. Every write lands twice, in the entity table's head row
//! and in an append-only journal row keyed by version; rollback never
//! touches either, it only marks the writing transaction invalid so reads
//! are redirected to the journal entry of the last valid version.

use std::sync::Arc;
use std::thread;

use tracing::{debug, warn};
use trellisdb_codec::{decode_entity, encode_entity, Entity, EntityKey};
use trellisdb_coord::{Coordinator, TxHandle};
use trellisdb_keys::{
    deleted_value, is_deleted, journal_key, journal_table_name, table_name, VERSION_NONEXISTENT,
};
use trellisdb_tables::{RowData, RowFetch, TableError, TableResult, TableStore};

use crate::catalog::KindCatalog;
use crate::config::EngineConfig;
use crate::error::{CoreError, CoreResult};
use crate::idalloc::IdAllocator;
use crate::query::QuerySpec;

/// How a bulk id reservation is sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocateMode {
    /// Reserve at least this many contiguous ids.
    Size(u64),
    /// Advance the sequence until it has moved past this value.
    Max(i64),
}

/// An inclusive range of reserved ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdRange {
    /// First reserved id.
    pub start: i64,
    /// Last reserved id.
    pub end: i64,
}

/// The storage engine: entity-group transactions over a plain table store.
///
/// The engine is safe to share across threads behind an `Arc`; its only
/// mutable state is the id allocator's block cache.
pub struct GroupStore {
    tables: Arc<dyn TableStore>,
    coord: Arc<dyn Coordinator>,
    ids: IdAllocator,
    catalog: KindCatalog,
    config: EngineConfig,
}

/// A write's transaction context: either the caller's explicit handle or a
/// single-entity transaction opened and settled by the engine itself.
struct WriteTxn {
    handle: TxHandle,
    implicit: bool,
}

impl GroupStore {
    /// Creates an engine with default configuration.
    #[must_use]
    pub fn new(tables: Arc<dyn TableStore>, coord: Arc<dyn Coordinator>) -> Self {
        Self::with_config(tables, coord, EngineConfig::new())
    }

    /// Creates an engine with explicit configuration.
    #[must_use]
    pub fn with_config(
        tables: Arc<dyn TableStore>,
        coord: Arc<dyn Coordinator>,
        config: EngineConfig,
    ) -> Self {
        Self {
            ids: IdAllocator::new(config.id_cache_max_entries),
            catalog: KindCatalog::new(tables.clone()),
            tables,
            coord,
            config,
        }
    }

    /// Writes a batch of entities, assigning ids to incomplete keys.
    ///
    /// With an explicit transaction the caller's lock is (re)acquired and
    /// kept; the handle commits later. Without one, each entity is written
    /// under its own single-entity transaction, committed before the next
    /// entity is processed, and a failure aborts only the entity in flight.
    ///
    /// Returns the finalized keys in input order.
    pub fn put_entities(
        &self,
        app: &str,
        entities: Vec<Entity>,
        txn: Option<TxHandle>,
    ) -> CoreResult<Vec<EntityKey>> {
        let mut keys_out = Vec::with_capacity(entities.len());
        for mut entity in entities {
            entity.key.app = app.to_string();
            self.ensure_identity(app, &mut entity)?;
            entity.assign_group();

            let row_key = entity
                .key
                .row_key()
                .ok_or_else(|| CoreError::missing_row_key(path_display(&entity.key)))?;
            let root_key = entity.key.root_key().ok_or(CoreError::MissingRootKey)?;
            let kind = entity
                .key
                .kind()
                .ok_or_else(|| CoreError::missing_row_key("empty key path"))?
                .to_string();

            self.catalog.note_kind(app, &kind, &entity.key.namespace)?;

            let write = self.begin_for(app, &root_key, txn)?;
            let payload = match encode_entity(&entity) {
                Ok(payload) => payload,
                Err(err) => {
                    self.abort_implicit(app, &write);
                    return Err(err.into());
                }
            };
            if let Err(err) =
                self.write_value(app, &entity.key.namespace, &kind, &row_key, payload, write.handle)
            {
                self.abort_implicit(app, &write);
                return Err(err);
            }
            self.commit_implicit(app, &write)?;
            keys_out.push(entity.key);
        }
        Ok(keys_out)
    }

    /// Reads entities by key, in input order.
    ///
    /// A key resolves to `None` when it was never written, was deleted, or
    /// its only write was rolled back.
    pub fn get_entities(&self, app: &str, keys: Vec<EntityKey>) -> CoreResult<Vec<Option<Entity>>> {
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            let row_key = key
                .row_key()
                .ok_or_else(|| CoreError::missing_row_key(path_display(&key)))?;
            let kind = key
                .kind()
                .ok_or_else(|| CoreError::missing_row_key("empty key path"))?;
            let entity_table = table_name(app, kind, &key.namespace);

            let (head, head_version) = match self.tables.get_row(&entity_table, &row_key)? {
                RowFetch::Found(row) => {
                    let version = row.version.unwrap_or(VERSION_NONEXISTENT);
                    (Some(row.value), version)
                }
                RowFetch::Missing => (None, VERSION_NONEXISTENT),
            };
            let value =
                self.resolve_row(app, &key.namespace, &row_key, head, head_version, false)?;
            out.push(match value {
                Some(bytes) => Some(decode_entity(&bytes)?),
                None => None,
            });
        }
        Ok(out)
    }

    /// Deletes entities by key, writing tombstones under the same journaled
    /// protocol as puts.
    ///
    /// Deleting a key that does not exist still writes a tombstone.
    pub fn delete_entities(
        &self,
        app: &str,
        keys: Vec<EntityKey>,
        txn: Option<TxHandle>,
    ) -> CoreResult<()> {
        for key in keys {
            let row_key = key
                .row_key()
                .ok_or_else(|| CoreError::missing_row_key(path_display(&key)))?;
            let root_key = key.root_key().ok_or(CoreError::MissingRootKey)?;
            let kind = key
                .kind()
                .ok_or_else(|| CoreError::missing_row_key("empty key path"))?;

            let write = self.begin_for(app, &root_key, txn)?;
            let payload = deleted_value(&row_key);
            if let Err(err) =
                self.write_value(app, &key.namespace, kind, &row_key, payload, write.handle)
            {
                self.abort_implicit(app, &write);
                return Err(err);
            }
            self.commit_implicit(app, &write)?;
        }
        Ok(())
    }

    /// Runs a query: full table scan, per-row validity resolution, then
    /// in-memory filtering and sorting.
    ///
    /// Unlike [`Self::get_entities`], a row redirected to a journal entry
    /// that does not exist fails the whole query rather than reading as
    /// absent; a scan that silently dropped rows would return wrong results
    /// with no signal.
    pub fn run_query(&self, app: &str, spec: &QuerySpec) -> CoreResult<Vec<Entity>> {
        let kinds = match &spec.kind {
            Some(kind) => vec![kind.clone()],
            None => self.catalog.kinds(app, &spec.namespace)?,
        };

        let mut results = Vec::new();
        for kind in kinds {
            let entity_table = table_name(app, &kind, &spec.namespace);
            for (row_key, row) in self.tables.scan_table(&entity_table)? {
                let head_version = row.version.unwrap_or(VERSION_NONEXISTENT);
                let value = self.resolve_row(
                    app,
                    &spec.namespace,
                    &row_key,
                    Some(row.value),
                    head_version,
                    true,
                )?;
                let Some(bytes) = value else { continue };
                let entity = decode_entity(&bytes)?;
                if spec.matches(&entity) {
                    results.push(entity);
                }
            }
        }
        spec.sort(&mut results);
        Ok(results)
    }

    /// Reserves a contiguous id range directly from the coordinator,
    /// bypassing the single-id block cache.
    ///
    /// `root_key` selects a per-group sequence; `None` uses the app-wide
    /// one. The number of block requests is bounded by
    /// [`EngineConfig::allocate_max_rounds`]; a reservation that has not
    /// converged by then fails instead of hammering the coordinator.
    pub fn allocate_id_range(
        &self,
        app: &str,
        root_key: Option<&str>,
        mode: AllocateMode,
    ) -> CoreResult<IdRange> {
        match mode {
            AllocateMode::Size(0) => Err(CoreError::invalid_request(
                "id allocation size must be positive",
            )),
            AllocateMode::Size(size) => {
                let size = i64::try_from(size)
                    .map_err(|_| CoreError::invalid_request("id allocation size out of range"))?;
                let first = self.coord.allocate_id_block(app, root_key)?;
                let start = first.start;
                let mut covered = first.end();
                let mut rounds: u32 = 1;
                while covered < start + size {
                    if rounds >= self.config.allocate_max_rounds {
                        return Err(CoreError::AllocationExhausted { rounds });
                    }
                    let block = self.coord.allocate_id_block(app, root_key)?;
                    covered = block.end();
                    rounds += 1;
                }
                Ok(IdRange {
                    start,
                    end: start + size - 1,
                })
            }
            AllocateMode::Max(ceiling) => {
                let mut rounds: u32 = 0;
                while rounds < self.config.allocate_max_rounds {
                    let block = self.coord.allocate_id_block(app, root_key)?;
                    rounds += 1;
                    if block.end() - 1 > ceiling {
                        return Ok(IdRange {
                            start: block.start,
                            end: block.end() - 1,
                        });
                    }
                }
                Err(CoreError::AllocationExhausted { rounds })
            }
        }
    }

    /// Assigns ids to every entity whose last path element has none.
    ///
    /// Puts do this on their own; callers that need the entity-group root
    /// before any write happens (transactional batches) use it to finalize
    /// keys up front.
    pub fn assign_keys(&self, app: &str, entities: &mut [Entity]) -> CoreResult<()> {
        for entity in entities.iter_mut() {
            entity.key.app = app.to_string();
            self.ensure_identity(app, entity)?;
        }
        Ok(())
    }

    /// Assigns an id to the entity's last path element if it has none.
    ///
    /// Root entities draw from the app-wide sequence, children from their
    /// entity group's sequence.
    fn ensure_identity(&self, app: &str, entity: &mut Entity) -> CoreResult<()> {
        let Some(last) = entity.key.path.last() else {
            return Err(CoreError::missing_row_key("empty key path"));
        };
        if last.id.is_assigned() {
            return Ok(());
        }
        let is_child = entity.key.path.len() > 1;
        let root_key = entity.key.root_key();
        let id = self
            .ids
            .allocate(self.coord.as_ref(), app, root_key.as_deref(), is_child)?;
        if let Some(last) = entity.key.path.last_mut() {
            last.id = trellisdb_keys::ElementId::Id(id);
        }
        Ok(())
    }

    /// Opens the transaction context for one write against one group.
    fn begin_for(
        &self,
        app: &str,
        root_key: &str,
        explicit: Option<TxHandle>,
    ) -> CoreResult<WriteTxn> {
        match explicit {
            Some(handle) => {
                // Reentrant for the holder; fails fast under contention and
                // rejects a second group on the same handle.
                self.coord.acquire_lock(app, handle, root_key)?;
                Ok(WriteTxn {
                    handle,
                    implicit: false,
                })
            }
            None => {
                let handle = self.coord.begin_transaction(app)?;
                if let Err(err) = self.coord.acquire_lock(app, handle, root_key) {
                    self.abort(app, handle);
                    return Err(err.into());
                }
                Ok(WriteTxn {
                    handle,
                    implicit: true,
                })
            }
        }
    }

    /// Rolls back an implicit transaction after a failed write. Explicit
    /// transactions are left to their owner.
    fn abort_implicit(&self, app: &str, txn: &WriteTxn) {
        if txn.implicit {
            self.abort(app, txn.handle);
        }
    }

    fn abort(&self, app: &str, handle: TxHandle) {
        if let Err(err) = self.coord.notify_failed_transaction(app, handle) {
            warn!(app, handle, error = %err, "rollback notification failed");
        }
    }

    /// Commits an implicit transaction. The row writes are already durable
    /// at this point, so a failure here is reported as such.
    fn commit_implicit(&self, app: &str, txn: &WriteTxn) -> CoreResult<()> {
        if !txn.implicit {
            return Ok(());
        }
        self.coord
            .release_lock(app, txn.handle)
            .map_err(|source| CoreError::CommitAfterWrite { source })
    }

    /// Journaled write of one value under an already-locked group.
    ///
    /// Registers the change-set entry first, then writes the journal row
    /// and the head row concurrently. When both writes fail the journal
    /// error wins, since the journal row is what rollback correctness
    /// depends on.
    fn write_value(
        &self,
        app: &str,
        namespace: &str,
        kind: &str,
        row_key: &str,
        payload: Vec<u8>,
        handle: TxHandle,
    ) -> CoreResult<()> {
        let entity_table = table_name(app, kind, namespace);
        let journal_table = journal_table_name(app, namespace);

        let head_version = match self.tables.get_row(&entity_table, row_key)? {
            RowFetch::Found(row) => row.version.unwrap_or(VERSION_NONEXISTENT),
            RowFetch::Missing => VERSION_NONEXISTENT,
        };
        let prev_version = self
            .coord
            .valid_transaction_id(app, head_version, row_key)?;
        self.coord.register_write(app, handle, prev_version, row_key)?;

        let journal_row_key = journal_key(row_key, handle);
        let journal_row = RowData::journal(payload.clone());
        let head_row = RowData::head(payload, handle);
        let tables = self.tables.as_ref();
        let (journal_res, head_res) = thread::scope(|s| {
            let journal = s.spawn(|| tables.put_row(&journal_table, &journal_row_key, journal_row));
            let head = s.spawn(|| tables.put_row(&entity_table, row_key, head_row));
            (journal.join(), head.join())
        });
        join_put(journal_res)?;
        join_put(head_res)
    }

    /// Resolves the value a reader should see for one row.
    ///
    /// `head` is the entity table's current value (`None` when the row is
    /// missing) and `head_version` its writer. Returns `None` for rows that
    /// are absent, deleted, or whose only write was rolled back with no
    /// prior version. With `strict_journal`, a redirect to a missing
    /// journal entry is an error instead of reading as absent.
    fn resolve_row(
        &self,
        app: &str,
        namespace: &str,
        row_key: &str,
        head: Option<Vec<u8>>,
        head_version: i64,
        strict_journal: bool,
    ) -> CoreResult<Option<Vec<u8>>> {
        let resolved = self.coord.valid_transaction_id(app, head_version, row_key)?;
        let value = if resolved == head_version {
            head
        } else if resolved == VERSION_NONEXISTENT {
            None
        } else {
            debug!(row_key, head_version, resolved, "head writer invalid, reading journal");
            let journal_table = journal_table_name(app, namespace);
            match self
                .tables
                .get_row(&journal_table, &journal_key(row_key, resolved))?
            {
                RowFetch::Found(row) => Some(row.value),
                RowFetch::Missing => {
                    if strict_journal {
                        return Err(CoreError::JournalMissing {
                            row_key: row_key.to_string(),
                            version: resolved,
                        });
                    }
                    None
                }
            }
        };
        Ok(value.filter(|bytes| !is_deleted(bytes)))
    }
}

fn join_put(outcome: thread::Result<TableResult<()>>) -> CoreResult<()> {
    match outcome {
        Ok(result) => result.map_err(CoreError::from),
        Err(_) => Err(TableError::unavailable("row writer panicked").into()),
    }
}

fn path_display(key: &EntityKey) -> String {
    let path = key
        .path
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("/");
    format!("{}/{path}", key.app)
}
