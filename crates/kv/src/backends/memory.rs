//! Volatile in-process backend for tests and development.

use crate::error::KvResult;
use crate::traits::{KvStore, validate_key};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// In-memory key-value backend.
///
/// Shares the volatile contract of the real backend: contents are gone
/// when the process exits, and tests can delete arbitrary keys to stand
/// in for eviction.
#[derive(Default)]
pub struct MemoryBackend {
    map: Mutex<HashMap<String, Bytes>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored. Test helper.
    pub async fn len(&self) -> usize {
        self.map.lock().await.len()
    }

    /// Whether a key is currently present. Test helper.
    pub async fn contains(&self, key: &str) -> bool {
        self.map.lock().await.contains_key(key)
    }
}

#[async_trait]
impl KvStore for MemoryBackend {
    async fn get(&self, key: &str) -> KvResult<Option<Bytes>> {
        validate_key(key)?;
        Ok(self.map.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Bytes) -> KvResult<()> {
        validate_key(key)?;
        self.map.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> KvResult<()> {
        validate_key(key)?;
        self.map.lock().await.remove(key);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let backend = MemoryBackend::new();
        backend.set("k", Bytes::from_static(b"v")).await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), Some(Bytes::from_static(b"v")));

        backend.delete("k").await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_miss_is_none() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.get("never-written").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let backend = MemoryBackend::new();
        backend.set("k", Bytes::from_static(b"v")).await.unwrap();
        backend.delete("k").await.unwrap();
        backend.delete("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let backend = MemoryBackend::new();
        backend.set("k", Bytes::from_static(b"old")).await.unwrap();
        backend.set("k", Bytes::from_static(b"new")).await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), Some(Bytes::from_static(b"new")));
        assert_eq!(backend.len().await, 1);
    }

    #[tokio::test]
    async fn test_rejects_invalid_key() {
        let backend = MemoryBackend::new();
        assert!(backend.set("bad key", Bytes::new()).await.is_err());
    }
}
