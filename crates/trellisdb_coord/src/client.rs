//! Coordinator trait definition.

use crate::error::CoordResult;

/// A transaction handle issued by the coordination service.
///
/// Handles double as MVCC versions: the head row of a key stores the handle
/// of the transaction that last wrote it.
pub type TxHandle = i64;

/// A reserved contiguous range of identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdBlock {
    /// First id in the block.
    pub start: i64,
    /// Number of ids in the block.
    pub size: i64,
}

impl IdBlock {
    /// One past the last id in the block.
    #[must_use]
    pub fn end(&self) -> i64 {
        self.start + self.size
    }
}

/// Typed operations against the external lock/sequence service.
///
/// Every method is one synchronous RPC scoped by application id; none
/// retries internally, and none blocks waiting for a lock.
pub trait Coordinator: Send + Sync {
    /// Issues a fresh transaction handle.
    fn begin_transaction(&self, app: &str) -> CoordResult<TxHandle>;

    /// Acquires the mutual-exclusion lock for an entity group on behalf of
    /// `handle`.
    ///
    /// Fails immediately with [`crate::CoordError::ConcurrentTransaction`]
    /// when another handle holds the lock. Re-acquiring a lock the handle
    /// already holds succeeds.
    fn acquire_lock(&self, app: &str, handle: TxHandle, root_key: &str) -> CoordResult<()>;

    /// Registers that `handle` intends to overwrite `row_key`, whose current
    /// authoritative version is `prev_version`.
    ///
    /// The registered pair is the change-set entry used to resolve reads if
    /// the transaction later fails. Failure here must abort the write.
    fn register_write(
        &self,
        app: &str,
        handle: TxHandle,
        prev_version: i64,
        row_key: &str,
    ) -> CoordResult<()>;

    /// Resolves the version a reader should treat as current for `row_key`.
    ///
    /// Returns `version` unchanged when that transaction committed, the
    /// registered previous version when it was rolled back, and
    /// [`crate::VERSION_NONEXISTENT`] when no valid write exists.
    fn valid_transaction_id(&self, app: &str, version: i64, row_key: &str) -> CoordResult<i64>;

    /// Commits: releases the handle's entity-group lock.
    fn release_lock(&self, app: &str, handle: TxHandle) -> CoordResult<()>;

    /// Rolls back: marks the handle invalid so future validity checks skip
    /// its writes, and releases its lock. A no-op for handles that already
    /// committed or rolled back.
    fn notify_failed_transaction(&self, app: &str, handle: TxHandle) -> CoordResult<()>;

    /// Reserves a fresh ID block for an app-wide (`root_key = None`) or
    /// per-group sequence.
    fn allocate_id_block(&self, app: &str, root_key: Option<&str>) -> CoordResult<IdBlock>;
}
