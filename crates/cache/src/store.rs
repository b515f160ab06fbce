//! Cache entry store: write/read orchestration and consistency policy.

use crate::codec;
use crate::error::{CacheError, CacheResult};
use crate::gc;
use crate::keys;
use bytes::Bytes;
use stash_core::{ContentHash, FileId};
use stash_kv::KvStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio::sync::Mutex;

/// Upper bound on a chunk count read back from metadata. Anything above
/// this is treated as corrupt metadata rather than a real entry.
const MAX_CHUNK_COUNT: u64 = 10_000_000;

/// An entry's metadata record: two independent backend keys, resolved
/// together.
#[derive(Clone, Copy, Debug)]
pub struct EntryMeta {
    pub chunk_count: u64,
    pub checksum: ContentHash,
}

/// The result of a committed write.
#[derive(Clone, Debug)]
pub struct WriteReceipt {
    pub file_id: FileId,
    pub chunk_count: u64,
    pub checksum: ContentHash,
}

/// Orchestrates writes and reads of chunked entries against the backend.
///
/// This is the single place where the eviction-vs-bug judgment is made:
/// the codec and the garbage collector only mechanize. Writers are
/// serialized per `file_id` through an in-process lock map; the backend
/// itself offers no locking primitive, so writers in other processes
/// remain unserialized.
pub struct CacheStore {
    kv: Arc<dyn KvStore>,
    chunk_size: usize,
    write_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CacheStore {
    /// Create a store splitting entries into chunks of `chunk_size` bytes.
    pub fn new(kv: Arc<dyn KvStore>, chunk_size: usize) -> Self {
        Self {
            kv,
            chunk_size,
            write_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Get (or create) the per-id writer lock, pruning idle entries.
    async fn write_lock(&self, id: &FileId) -> Arc<Mutex<()>> {
        let mut locks = self.write_locks.lock().await;
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks
            .entry(id.as_str().to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Resolve an entry's metadata. A miss on either key means the entry
    /// does not exist; a value that does not parse means the metadata is
    /// corrupt and the entry is reported inconsistent.
    pub async fn metadata(&self, id: &FileId) -> CacheResult<Option<EntryMeta>> {
        let Some(count_raw) = self.kv.get(&keys::chunk_count_key(id)).await? else {
            return Ok(None);
        };
        let Some(checksum_raw) = self.kv.get(&keys::checksum_key(id)).await? else {
            return Ok(None);
        };

        let chunk_count = parse_chunk_count(id, &count_raw)?;
        let checksum = parse_checksum(id, &checksum_raw)?;
        Ok(Some(EntryMeta {
            chunk_count,
            checksum,
        }))
    }

    /// Write an entry, replacing any prior entry under the same id.
    ///
    /// The prior entry is erased in full before any new chunk is stored;
    /// skipping that step would leave a stale tail of old chunks whenever
    /// the new file is shorter, waiting to resurface. Metadata is
    /// committed only after every chunk is stored, so a failed write
    /// leaves the entry absent rather than half-visible; a failed commit
    /// is compensated by erasing everything just written.
    pub async fn write<R>(&self, id: &FileId, reader: R) -> CacheResult<WriteReceipt>
    where
        R: AsyncRead + Unpin,
    {
        let lock = self.write_lock(id).await;
        let _guard = lock.lock().await;

        match self.metadata(id).await {
            Ok(Some(meta)) => gc::erase(self.kv.as_ref(), id, meta.chunk_count).await,
            Ok(None) => {}
            Err(CacheError::Inconsistent { .. }) => {
                // Corrupt metadata gives no usable chunk count; clear the
                // metadata keys so the new generation starts clean. Any
                // orphaned chunks stay invisible and age out with the
                // backend's own eviction.
                tracing::warn!(file_id = %id, "clearing unreadable metadata before overwrite");
                gc::erase(self.kv.as_ref(), id, 0).await;
            }
            Err(e) => return Err(e),
        }

        let (chunk_count, checksum) =
            codec::split_and_store(self.kv.as_ref(), id, reader, self.chunk_size).await?;

        if let Err(e) = self.commit_metadata(id, chunk_count, &checksum).await {
            tracing::warn!(file_id = %id, error = %e, "metadata commit failed, erasing entry");
            gc::erase(self.kv.as_ref(), id, chunk_count).await;
            return Err(e);
        }

        tracing::debug!(file_id = %id, chunk_count, checksum = %checksum, "entry committed");
        Ok(WriteReceipt {
            file_id: id.clone(),
            chunk_count,
            checksum,
        })
    }

    /// Commit the metadata record. The entry only becomes visible to
    /// readers once both keys land.
    async fn commit_metadata(
        &self,
        id: &FileId,
        chunk_count: u64,
        checksum: &ContentHash,
    ) -> CacheResult<()> {
        self.kv
            .set(&keys::checksum_key(id), Bytes::from(checksum.to_hex()))
            .await?;
        self.kv
            .set(
                &keys::chunk_count_key(id),
                Bytes::from(chunk_count.to_string()),
            )
            .await?;
        Ok(())
    }

    /// Read an entry's bytes, verifying completeness and integrity.
    ///
    /// Outcomes:
    /// - all chunks found and the digest matches: the bytes;
    /// - fewer chunks found than recorded: partial eviction - the
    ///   remnants are erased so future reads fail fast, and the entry is
    ///   reported not found;
    /// - all chunks found but the digest disagrees: inconsistent - the
    ///   chunks cannot have been evicted, so something wrote bad data.
    pub async fn read(&self, id: &FileId) -> CacheResult<Bytes> {
        let meta = self
            .metadata(id)
            .await?
            .ok_or_else(|| CacheError::NotFound(id.clone()))?;

        let assembled = codec::fetch_and_join(self.kv.as_ref(), id, meta.chunk_count).await?;

        if assembled.chunks_found < meta.chunk_count {
            tracing::warn!(
                file_id = %id,
                chunks_found = assembled.chunks_found,
                chunk_count = meta.chunk_count,
                "partial eviction detected, erasing remnants"
            );
            gc::erase(self.kv.as_ref(), id, meta.chunk_count).await;
            return Err(CacheError::NotFound(id.clone()));
        }

        if assembled.digest != meta.checksum {
            tracing::error!(
                file_id = %id,
                stored = %meta.checksum,
                reassembled = %assembled.digest,
                "all chunks present but checksum disagrees with metadata"
            );
            return Err(CacheError::Inconsistent {
                file_id: id.clone(),
                detail: format!(
                    "checksum mismatch: stored {}, reassembled {}",
                    meta.checksum, assembled.digest
                ),
            });
        }

        Ok(assembled.bytes)
    }

    /// Erase an entry and everything belonging to it. Erasing an absent
    /// entry succeeds.
    pub async fn erase(&self, id: &FileId) -> CacheResult<()> {
        let lock = self.write_lock(id).await;
        let _guard = lock.lock().await;

        match self.metadata(id).await {
            Ok(Some(meta)) => gc::erase(self.kv.as_ref(), id, meta.chunk_count).await,
            // Clears a stray metadata key left by a torn commit, if any.
            Ok(None) | Err(CacheError::Inconsistent { .. }) => {
                gc::erase(self.kv.as_ref(), id, 0).await
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }
}

fn parse_chunk_count(id: &FileId, raw: &[u8]) -> CacheResult<u64> {
    let text = std::str::from_utf8(raw).map_err(|_| CacheError::Inconsistent {
        file_id: id.clone(),
        detail: "chunk count is not UTF-8".to_string(),
    })?;
    let count: u64 = text.trim().parse().map_err(|_| CacheError::Inconsistent {
        file_id: id.clone(),
        detail: format!("unparsable chunk count: {text:?}"),
    })?;
    if count > MAX_CHUNK_COUNT {
        return Err(CacheError::Inconsistent {
            file_id: id.clone(),
            detail: format!("absurd chunk count: {count}"),
        });
    }
    Ok(count)
}

fn parse_checksum(id: &FileId, raw: &[u8]) -> CacheResult<ContentHash> {
    let text = std::str::from_utf8(raw).map_err(|_| CacheError::Inconsistent {
        file_id: id.clone(),
        detail: "checksum is not UTF-8".to_string(),
    })?;
    ContentHash::from_hex(text.trim()).map_err(|e| CacheError::Inconsistent {
        file_id: id.clone(),
        detail: format!("unparsable checksum: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stash_kv::MemoryBackend;

    fn store() -> CacheStore {
        CacheStore::new(Arc::new(MemoryBackend::new()), 4)
    }

    #[tokio::test]
    async fn test_metadata_absent() {
        let store = store();
        let id = FileId::sanitize("nothing");
        assert!(store.metadata(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_metadata_requires_both_keys() {
        let kv = Arc::new(MemoryBackend::new());
        let store = CacheStore::new(kv.clone(), 4);
        let id = FileId::sanitize("torn");

        // Only the chunk count landed; the entry must present as absent.
        kv.set("torn_chunk_count", Bytes::from_static(b"2"))
            .await
            .unwrap();
        assert!(store.metadata(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_metadata_rejects_garbage_count() {
        let kv = Arc::new(MemoryBackend::new());
        let store = CacheStore::new(kv.clone(), 4);
        let id = FileId::sanitize("bad");

        kv.set("bad_chunk_count", Bytes::from_static(b"not-a-number"))
            .await
            .unwrap();
        kv.set(
            "bad_checksum",
            Bytes::from(ContentHash::compute(b"").to_hex()),
        )
        .await
        .unwrap();

        match store.metadata(&id).await {
            Err(CacheError::Inconsistent { .. }) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_metadata_rejects_absurd_count() {
        let kv = Arc::new(MemoryBackend::new());
        let store = CacheStore::new(kv.clone(), 4);
        let id = FileId::sanitize("huge");

        kv.set("huge_chunk_count", Bytes::from_static(b"99999999999"))
            .await
            .unwrap();
        kv.set(
            "huge_checksum",
            Bytes::from(ContentHash::compute(b"").to_hex()),
        )
        .await
        .unwrap();

        match store.metadata(&id).await {
            Err(CacheError::Inconsistent { .. }) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_write_lock_map_prunes_idle_entries() {
        let store = store();
        let a = FileId::sanitize("a");
        let b = FileId::sanitize("b");

        let lock_a = store.write_lock(&a).await;
        drop(lock_a);
        // Taking a lock for another id prunes the idle entry for "a".
        let _lock_b = store.write_lock(&b).await;

        let locks = store.write_locks.lock().await;
        assert!(!locks.contains_key("a"));
        assert!(locks.contains_key("b"));
    }
}
