//! Server configuration.

use trellisdb_core::EngineConfig;

/// Configuration for the datastore service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Maximum entities or keys per batch request.
    pub max_batch_size: usize,
    /// Engine tunables passed through to the storage engine.
    pub engine: EngineConfig,
}

impl ServerConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_batch_size: 500,
            engine: EngineConfig::new(),
        }
    }

    /// Sets the batch size limit.
    #[must_use]
    pub fn with_max_batch_size(mut self, max: usize) -> Self {
        self.max_batch_size = max.max(1);
        self
    }

    /// Sets the engine configuration.
    #[must_use]
    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}
