//! In-process coordinator.

use crate::client::{Coordinator, IdBlock, TxHandle};
use crate::error::{CoordError, CoordResult};
use crate::VERSION_NONEXISTENT;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Default number of ids handed out per block.
pub const DEFAULT_BLOCK_SIZE: i64 = 50;

#[derive(Debug, Default)]
struct CoordState {
    next_handle: i64,
    /// Handles that have been issued and not yet committed or rolled back.
    active: HashSet<(String, TxHandle)>,
    /// (app, root_key) -> holding handle.
    locks: HashMap<(String, String), TxHandle>,
    /// (app, handle) -> locked root_key. One entity group per transaction.
    holder_root: HashMap<(String, TxHandle), String>,
    /// (app, handle) -> change set registered for rollback resolution.
    registered: HashMap<(String, TxHandle), Vec<(String, i64)>>,
    /// Handles whose writes must never be trusted.
    blacklist: HashSet<(String, TxHandle)>,
    /// (app, row_key) -> version readers should fall back to.
    valid: HashMap<(String, String), i64>,
    /// Scope key -> highest id handed out.
    counters: HashMap<String, i64>,
}

/// A complete in-process implementation of the coordination contract.
///
/// Single-node stand-in for the external lock/sequence service: one mutex
/// over all lock, blacklist, and sequence state. Useful for tests and for
/// deployments that run a single proxy instance.
///
/// # Example
///
/// ```rust
/// use trellisdb_coord::{Coordinator, LocalCoordinator};
///
/// let coord = LocalCoordinator::new();
/// let txn = coord.begin_transaction("a1").unwrap();
/// coord.acquire_lock("a1", txn, "a1/Foo:1").unwrap();
/// assert!(coord
///     .acquire_lock("a1", txn + 1, "a1/Foo:1")
///     .is_err());
/// coord.release_lock("a1", txn).unwrap();
/// ```
#[derive(Debug)]
pub struct LocalCoordinator {
    state: Mutex<CoordState>,
    block_size: i64,
}

impl LocalCoordinator {
    /// Creates a coordinator with the default ID block size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_block_size(DEFAULT_BLOCK_SIZE)
    }

    /// Creates a coordinator handing out blocks of `block_size` ids.
    #[must_use]
    pub fn with_block_size(block_size: i64) -> Self {
        Self {
            state: Mutex::new(CoordState::default()),
            block_size: block_size.max(1),
        }
    }

    fn known(state: &CoordState, app: &str, handle: TxHandle) -> CoordResult<()> {
        let key = (app.to_string(), handle);
        if state.blacklist.contains(&key) {
            return Err(CoordError::invalid(format!(
                "transaction {handle} was rolled back"
            )));
        }
        if !state.active.contains(&key) {
            return Err(CoordError::UnknownTransaction {
                app: app.to_string(),
                handle,
            });
        }
        Ok(())
    }
}

impl Default for LocalCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl Coordinator for LocalCoordinator {
    fn begin_transaction(&self, app: &str) -> CoordResult<TxHandle> {
        let mut state = self.state.lock();
        state.next_handle += 1;
        let handle = state.next_handle;
        state.active.insert((app.to_string(), handle));
        Ok(handle)
    }

    fn acquire_lock(&self, app: &str, handle: TxHandle, root_key: &str) -> CoordResult<()> {
        let mut state = self.state.lock();
        Self::known(&state, app, handle)?;

        if let Some(held) = state.holder_root.get(&(app.to_string(), handle)) {
            if held == root_key {
                return Ok(());
            }
            return Err(CoordError::invalid(format!(
                "transaction {handle} already locked entity group '{held}'"
            )));
        }

        let lock_key = (app.to_string(), root_key.to_string());
        if let Some(&holder) = state.locks.get(&lock_key) {
            if holder != handle {
                debug!(app, root_key, holder, requester = handle, "lock contended");
                return Err(CoordError::ConcurrentTransaction {
                    root_key: root_key.to_string(),
                    holder,
                });
            }
            return Ok(());
        }

        state.locks.insert(lock_key, handle);
        state
            .holder_root
            .insert((app.to_string(), handle), root_key.to_string());
        Ok(())
    }

    fn register_write(
        &self,
        app: &str,
        handle: TxHandle,
        prev_version: i64,
        row_key: &str,
    ) -> CoordResult<()> {
        let mut state = self.state.lock();
        Self::known(&state, app, handle)?;
        state
            .registered
            .entry((app.to_string(), handle))
            .or_default()
            .push((row_key.to_string(), prev_version));
        Ok(())
    }

    fn valid_transaction_id(&self, app: &str, version: i64, row_key: &str) -> CoordResult<i64> {
        if version == VERSION_NONEXISTENT {
            return Ok(VERSION_NONEXISTENT);
        }
        let state = self.state.lock();
        if state.blacklist.contains(&(app.to_string(), version)) {
            let fallback = state
                .valid
                .get(&(app.to_string(), row_key.to_string()))
                .copied()
                .unwrap_or(VERSION_NONEXISTENT);
            return Ok(fallback);
        }
        Ok(version)
    }

    fn release_lock(&self, app: &str, handle: TxHandle) -> CoordResult<()> {
        let mut state = self.state.lock();
        Self::known(&state, app, handle)?;
        if let Some(root) = state.holder_root.remove(&(app.to_string(), handle)) {
            state.locks.remove(&(app.to_string(), root));
        }
        state.registered.remove(&(app.to_string(), handle));
        state.active.remove(&(app.to_string(), handle));
        Ok(())
    }

    fn notify_failed_transaction(&self, app: &str, handle: TxHandle) -> CoordResult<()> {
        let mut state = self.state.lock();
        let key = (app.to_string(), handle);
        if !state.active.contains(&key) {
            // Committed, already rolled back, or never issued. The change
            // set is gone in every case, so there is nothing to invalidate.
            return Ok(());
        }
        debug!(app, handle, "transaction rolled back");
        state.blacklist.insert(key.clone());
        if let Some(changes) = state.registered.remove(&key) {
            for (row_key, prev_version) in changes {
                state.valid.insert((app.to_string(), row_key), prev_version);
            }
        }
        if let Some(root) = state.holder_root.remove(&key) {
            state.locks.remove(&(app.to_string(), root));
        }
        state.active.remove(&key);
        Ok(())
    }

    fn allocate_id_block(&self, app: &str, root_key: Option<&str>) -> CoordResult<IdBlock> {
        let scope = match root_key {
            Some(root) => format!("{app}/{root}"),
            None => app.to_string(),
        };
        let mut state = self.state.lock();
        let counter = state.counters.entry(scope).or_insert(0);
        let start = *counter + 1;
        *counter += self.block_size;
        Ok(IdBlock {
            start,
            size: self.block_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_exclusivity() {
        let coord = LocalCoordinator::new();
        let a = coord.begin_transaction("app").unwrap();
        let b = coord.begin_transaction("app").unwrap();
        coord.acquire_lock("app", a, "app/Foo:1").unwrap();

        let err = coord.acquire_lock("app", b, "app/Foo:1").unwrap_err();
        assert!(err.is_concurrent());

        // Released locks can be taken by the other transaction.
        coord.release_lock("app", a).unwrap();
        coord.acquire_lock("app", b, "app/Foo:1").unwrap();
    }

    #[test]
    fn lock_is_reentrant_for_the_holder() {
        let coord = LocalCoordinator::new();
        let txn = coord.begin_transaction("app").unwrap();
        coord.acquire_lock("app", txn, "app/Foo:1").unwrap();
        coord.acquire_lock("app", txn, "app/Foo:1").unwrap();
    }

    #[test]
    fn one_entity_group_per_transaction() {
        let coord = LocalCoordinator::new();
        let txn = coord.begin_transaction("app").unwrap();
        coord.acquire_lock("app", txn, "app/Foo:1").unwrap();
        assert!(coord.acquire_lock("app", txn, "app/Foo:2").is_err());
    }

    #[test]
    fn committed_versions_stay_valid() {
        let coord = LocalCoordinator::new();
        let txn = coord.begin_transaction("app").unwrap();
        coord.acquire_lock("app", txn, "app/Foo:1").unwrap();
        coord.register_write("app", txn, 0, "app/Foo:1").unwrap();
        coord.release_lock("app", txn).unwrap();

        assert_eq!(
            coord.valid_transaction_id("app", txn, "app/Foo:1").unwrap(),
            txn
        );
    }

    #[test]
    fn rollback_after_commit_leaves_committed_versions_valid() {
        let coord = LocalCoordinator::new();
        let txn = coord.begin_transaction("app").unwrap();
        coord.acquire_lock("app", txn, "app/Foo:1").unwrap();
        coord.register_write("app", txn, 0, "app/Foo:1").unwrap();
        coord.release_lock("app", txn).unwrap();

        // A stray rollback for the committed handle must not blacklist it.
        coord.notify_failed_transaction("app", txn).unwrap();
        assert_eq!(
            coord.valid_transaction_id("app", txn, "app/Foo:1").unwrap(),
            txn
        );
    }

    #[test]
    fn rollback_is_idempotent() {
        let coord = LocalCoordinator::new();
        let txn = coord.begin_transaction("app").unwrap();
        coord.acquire_lock("app", txn, "app/Foo:1").unwrap();
        coord.notify_failed_transaction("app", txn).unwrap();
        coord.notify_failed_transaction("app", txn).unwrap();
        assert_eq!(
            coord.valid_transaction_id("app", txn, "app/Foo:1").unwrap(),
            VERSION_NONEXISTENT
        );
    }

    #[test]
    fn rolled_back_versions_resolve_to_the_registered_previous() {
        let coord = LocalCoordinator::new();
        let first = coord.begin_transaction("app").unwrap();
        coord.acquire_lock("app", first, "app/Foo:1").unwrap();
        coord.register_write("app", first, 0, "app/Foo:1").unwrap();
        coord.release_lock("app", first).unwrap();

        let second = coord.begin_transaction("app").unwrap();
        coord.acquire_lock("app", second, "app/Foo:1").unwrap();
        coord
            .register_write("app", second, first, "app/Foo:1")
            .unwrap();
        coord.notify_failed_transaction("app", second).unwrap();

        // The failed write's version now resolves to its predecessor.
        assert_eq!(
            coord
                .valid_transaction_id("app", second, "app/Foo:1")
                .unwrap(),
            first
        );
        // Rollback released the lock.
        let third = coord.begin_transaction("app").unwrap();
        coord.acquire_lock("app", third, "app/Foo:1").unwrap();
    }

    #[test]
    fn rollback_without_registered_writes_resolves_to_nonexistent() {
        let coord = LocalCoordinator::new();
        let txn = coord.begin_transaction("app").unwrap();
        coord.acquire_lock("app", txn, "app/Foo:1").unwrap();
        coord.notify_failed_transaction("app", txn).unwrap();
        assert_eq!(
            coord.valid_transaction_id("app", txn, "app/Foo:1").unwrap(),
            VERSION_NONEXISTENT
        );
    }

    #[test]
    fn nonexistent_version_resolves_to_itself() {
        let coord = LocalCoordinator::new();
        assert_eq!(
            coord
                .valid_transaction_id("app", VERSION_NONEXISTENT, "app/Foo:1")
                .unwrap(),
            VERSION_NONEXISTENT
        );
    }

    #[test]
    fn operations_on_unknown_handles_fail() {
        let coord = LocalCoordinator::new();
        assert!(coord.acquire_lock("app", 99, "app/Foo:1").is_err());
        assert!(coord.release_lock("app", 99).is_err());
        assert!(coord.register_write("app", 99, 0, "app/Foo:1").is_err());
    }

    #[test]
    fn id_blocks_are_disjoint_and_increasing() {
        let coord = LocalCoordinator::with_block_size(10);
        let a = coord.allocate_id_block("app", None).unwrap();
        let b = coord.allocate_id_block("app", None).unwrap();
        assert_eq!(a.start, 1);
        assert_eq!(a.end(), 11);
        assert_eq!(b.start, 11);

        // Per-group scopes run their own sequence.
        let scoped = coord.allocate_id_block("app", Some("app/Foo:1")).unwrap();
        assert_eq!(scoped.start, 1);
    }

    #[test]
    fn separate_apps_do_not_contend() {
        let coord = LocalCoordinator::new();
        let a = coord.begin_transaction("app1").unwrap();
        let b = coord.begin_transaction("app2").unwrap();
        coord.acquire_lock("app1", a, "app1/Foo:1").unwrap();
        coord.acquire_lock("app2", b, "app2/Foo:1").unwrap();
    }
}
