//! Key-value store trait definitions.

use crate::error::{KvError, KvResult};
use async_trait::async_trait;
use bytes::Bytes;

/// Maximum key length accepted by the backends (memcached's limit).
pub const MAX_KEY_LEN: usize = 250;

/// Maximum value size accepted by the backends (memcached's default
/// item ceiling).
pub const MAX_VALUE_SIZE: usize = 1024 * 1024;

/// Validate a key against the shared backend constraints.
///
/// Keys must be non-empty, at most [`MAX_KEY_LEN`] bytes, and free of
/// whitespace and control characters (which would break the memcached
/// text protocol framing).
pub fn validate_key(key: &str) -> KvResult<()> {
    if key.is_empty() {
        return Err(KvError::InvalidKey("empty key".to_string()));
    }
    if key.len() > MAX_KEY_LEN {
        return Err(KvError::InvalidKey(format!(
            "key too long: {} bytes (max: {})",
            key.len(),
            MAX_KEY_LEN
        )));
    }
    if key
        .bytes()
        .any(|b| b.is_ascii_whitespace() || b.is_ascii_control())
    {
        return Err(KvError::InvalidKey(format!(
            "key contains whitespace or control characters: {key:?}"
        )));
    }
    Ok(())
}

/// Volatile key-value store abstraction.
///
/// The store may evict any key at any time under its own memory policy;
/// a miss does not distinguish "never written" from "evicted". There are
/// no transactions across keys. Implementations apply their configured
/// timeout to every call and surface expiry as [`KvError::Timeout`].
#[async_trait]
pub trait KvStore: Send + Sync + 'static {
    /// Get a value. `Ok(None)` is a miss.
    async fn get(&self, key: &str) -> KvResult<Option<Bytes>>;

    /// Set a value, overwriting any previous one.
    async fn set(&self, key: &str, value: Bytes) -> KvResult<()>;

    /// Delete a key. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> KvResult<()>;

    /// Get the name of this backend.
    ///
    /// Returns a static string identifier for the backend type
    /// (e.g., "memcached", "memory"). Used for metrics and logging.
    fn backend_name(&self) -> &'static str;

    /// Verify backend connectivity.
    ///
    /// Called during server startup to ensure the backend is reachable
    /// before accepting requests. The default implementation returns
    /// Ok(()), suitable for in-process backends.
    async fn health_check(&self) -> KvResult<()> {
        Ok(())
    }
}
