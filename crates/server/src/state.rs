//! Application state shared across handlers.

use stash_cache::CacheStore;
use stash_core::config::AppConfig;
use stash_kv::KvStore;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Chunked entry store.
    pub cache: Arc<CacheStore>,
    /// Key-value backend (kept alongside the store for health checks).
    pub kv: Arc<dyn KvStore>,
}

impl AppState {
    /// Create a new application state over the given backend.
    pub fn new(config: AppConfig, kv: Arc<dyn KvStore>) -> Self {
        let cache = Arc::new(CacheStore::new(kv.clone(), config.server.chunk_size as usize));
        Self {
            config: Arc::new(config),
            cache,
            kv,
        }
    }
}
