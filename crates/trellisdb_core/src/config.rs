//! Engine configuration.

/// Tunables for the storage engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Entry count above which the ID allocator's cache is cleared whole.
    ///
    /// Coarse eviction, not LRU: one entry per (app, root) scope, so the
    /// bound is only reached with very many tenants or entity groups.
    pub id_cache_max_entries: usize,
    /// Upper bound on coordination block requests one AllocateIds call may
    /// make before giving up.
    pub allocate_max_rounds: u32,
}

impl EngineConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id_cache_max_entries: 1_000_000,
            allocate_max_rounds: 64,
        }
    }

    /// Sets the ID cache bound.
    #[must_use]
    pub fn with_id_cache_max_entries(mut self, max: usize) -> Self {
        self.id_cache_max_entries = max;
        self
    }

    /// Sets the bulk-allocation round bound.
    #[must_use]
    pub fn with_allocate_max_rounds(mut self, rounds: u32) -> Self {
        self.allocate_max_rounds = rounds.max(1);
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_round_trip() {
        let config = EngineConfig::new()
            .with_id_cache_max_entries(8)
            .with_allocate_max_rounds(3);
        assert_eq!(config.id_cache_max_entries, 8);
        assert_eq!(config.allocate_max_rounds, 3);
    }

    #[test]
    fn round_bound_is_at_least_one() {
        let config = EngineConfig::new().with_allocate_max_rounds(0);
        assert_eq!(config.allocate_max_rounds, 1);
    }
}
