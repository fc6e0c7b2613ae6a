//! Process-local ID allocation over coordination-service blocks.

use crate::error::{CoreError, CoreResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use trellisdb_coord::Coordinator;

#[derive(Debug, Clone, Copy)]
struct CachedRange {
    /// Next id to hand out.
    next: i64,
    /// One past the last id owned.
    end: i64,
}

/// Process-local cache of reserved ID ranges.
///
/// Each (app) or (app, root) scope maps to an open range `[next, end)`
/// claimed from the coordination service one block at a time. Ids inside a
/// block are handed out without any network traffic; an exhausted scope
/// triggers a fresh block request.
///
/// The cache mutex guards only the in-memory map. It is released across the
/// block-request RPC and re-acquired to install the result, so two racing
/// requesters each consume their own block: ids stay unique, the loser's
/// cached remainder is simply replaced (bounded waste, no reuse).
///
/// When the map grows past the configured bound it is cleared whole —
/// coarse eviction keeps the structure trivially correct and the bound is
/// only reached under very many scopes.
#[derive(Debug)]
pub struct IdAllocator {
    cache: Mutex<HashMap<String, CachedRange>>,
    max_entries: usize,
}

impl IdAllocator {
    /// Creates an allocator whose cache holds at most `max_entries` scopes.
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
            max_entries: max_entries.max(1),
        }
    }

    /// Number of scopes currently cached.
    #[must_use]
    pub fn cached_scopes(&self) -> usize {
        self.cache.lock().len()
    }

    /// Allocates one id for an app-wide (`is_child == false`) or per-group
    /// sequence.
    ///
    /// A child allocation without a resolved root key is a caller error
    /// ([`CoreError::MissingRootKey`]), distinct from any coordination
    /// failure.
    pub fn allocate(
        &self,
        coord: &dyn Coordinator,
        app: &str,
        root_key: Option<&str>,
        is_child: bool,
    ) -> CoreResult<i64> {
        let block_root = if is_child {
            Some(root_key.ok_or(CoreError::MissingRootKey)?)
        } else {
            None
        };
        let scope = match block_root {
            Some(root) => format!("{app}/{root}"),
            None => app.to_string(),
        };

        {
            let mut cache = self.cache.lock();
            if let Some(range) = cache.get_mut(&scope) {
                if range.next < range.end {
                    let id = range.next;
                    range.next += 1;
                    return Ok(id);
                }
            }
        }

        // Lock dropped: the block request is a network call.
        let block = coord.allocate_id_block(app, block_root)?;

        let mut cache = self.cache.lock();
        if cache.len() >= self.max_entries {
            cache.clear();
        }
        cache.insert(
            scope,
            CachedRange {
                next: block.start + 1,
                end: block.end(),
            },
        );
        Ok(block.start)
    }
}
