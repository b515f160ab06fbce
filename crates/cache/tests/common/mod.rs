//! Common test utilities.

use stash_cache::CacheStore;
use stash_kv::MemoryBackend;
use std::sync::Arc;

/// Build a store over a fresh memory backend with a small chunk size so
/// tests exercise multi-chunk entries with tiny inputs.
#[allow(dead_code)]
pub fn new_store(chunk_size: usize) -> (Arc<MemoryBackend>, CacheStore) {
    let kv = Arc::new(MemoryBackend::new());
    let store = CacheStore::new(kv.clone(), chunk_size);
    (kv, store)
}
