//! Key-value backend abstraction and backends for stash.
//!
//! This crate provides:
//! - The [`KvStore`] trait: get/set/delete against a volatile store that
//!   may evict any key at any time
//! - Backends: memcached (text protocol over TCP) and an in-process
//!   memory map for tests and development

pub mod backends;
pub mod error;
pub mod traits;

pub use backends::{memcached::MemcachedBackend, memory::MemoryBackend};
pub use error::{KvError, KvResult};
pub use traits::{KvStore, MAX_KEY_LEN, MAX_VALUE_SIZE, validate_key};

use stash_core::config::BackendConfig;
use std::sync::Arc;
use std::time::Duration;

/// Create a key-value store from configuration.
pub fn from_config(config: &BackendConfig) -> KvResult<Arc<dyn KvStore>> {
    config.validate().map_err(KvError::Config)?;

    match config {
        BackendConfig::Memcached {
            host,
            port,
            timeout_ms,
            pool_size,
        } => {
            let backend = MemcachedBackend::new(
                host,
                *port,
                Duration::from_millis(*timeout_ms),
                *pool_size,
            );
            Ok(Arc::new(backend))
        }
        BackendConfig::Memory => Ok(Arc::new(MemoryBackend::new())),
    }
}
