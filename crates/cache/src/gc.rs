//! Garbage collection for one logical entry.

use crate::keys;
use stash_core::FileId;
use stash_kv::KvStore;

/// Erase every key belonging to an entry: chunk keys `0..chunk_count`
/// and both metadata keys.
///
/// Deletes are idempotent and best-effort. The backend gives no
/// confirmation that a delete's target existed, a key may already have
/// been evicted, and an individual failure is logged and skipped. This
/// is a cleanup aid, not a transaction; it never reports partial failure.
pub async fn erase(kv: &dyn KvStore, id: &FileId, chunk_count: u64) {
    for index in 0..chunk_count {
        let key = keys::chunk_key(id, index);
        if let Err(e) = kv.delete(&key).await {
            tracing::warn!(file_id = %id, %key, error = %e, "failed to delete chunk key");
        }
    }

    for key in [keys::chunk_count_key(id), keys::checksum_key(id)] {
        if let Err(e) = kv.delete(&key).await {
            tracing::warn!(file_id = %id, %key, error = %e, "failed to delete metadata key");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use stash_kv::MemoryBackend;

    async fn seed_entry(kv: &MemoryBackend, id: &FileId, chunks: u64) {
        for index in 0..chunks {
            kv.set(&keys::chunk_key(id, index), Bytes::from_static(b"x"))
                .await
                .unwrap();
        }
        kv.set(&keys::chunk_count_key(id), Bytes::from(chunks.to_string()))
            .await
            .unwrap();
        kv.set(&keys::checksum_key(id), Bytes::from_static(b"00"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_erase_removes_all_keys() {
        let kv = MemoryBackend::new();
        let id = FileId::sanitize("victim");
        seed_entry(&kv, &id, 3).await;
        assert_eq!(kv.len().await, 5);

        erase(&kv, &id, 3).await;
        assert_eq!(kv.len().await, 0);
    }

    #[tokio::test]
    async fn test_erase_twice_never_errors() {
        let kv = MemoryBackend::new();
        let id = FileId::sanitize("victim");
        seed_entry(&kv, &id, 2).await;

        erase(&kv, &id, 2).await;
        erase(&kv, &id, 2).await;
        assert_eq!(kv.len().await, 0);
    }

    #[tokio::test]
    async fn test_erase_tolerates_already_evicted_chunks() {
        let kv = MemoryBackend::new();
        let id = FileId::sanitize("victim");
        seed_entry(&kv, &id, 4).await;
        kv.delete(&keys::chunk_key(&id, 2)).await.unwrap();

        erase(&kv, &id, 4).await;
        assert_eq!(kv.len().await, 0);
    }
}
