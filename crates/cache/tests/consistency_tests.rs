//! Degraded-entry handling: partial eviction, corruption, cleanup.

mod common;

use bytes::Bytes;
use common::new_store;
use stash_cache::CacheError;
use stash_core::FileId;
use stash_kv::KvStore;

#[tokio::test]
async fn test_partial_eviction_reads_as_not_found() {
    let (kv, store) = new_store(4);
    let id = FileId::sanitize("evicted");

    // 5 chunks; the backend reclaims one of them on its own.
    store.write(&id, &b"AAAABBBBCCCCDDDDEEEE"[..]).await.unwrap();
    kv.delete("evicted_2").await.unwrap();

    match store.read(&id).await {
        Err(CacheError::NotFound(_)) => {}
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_partial_eviction_triggers_cleanup() {
    let (kv, store) = new_store(4);
    let id = FileId::sanitize("evicted");

    store.write(&id, &b"AAAABBBBCCCCDDDDEEEE"[..]).await.unwrap();
    kv.delete("evicted_2").await.unwrap();

    let _ = store.read(&id).await;

    // The read erased the remnants: metadata is gone so future reads
    // fail fast instead of re-attempting a doomed reconstruction.
    assert!(store.metadata(&id).await.unwrap().is_none());
    assert_eq!(kv.len().await, 0);
}

#[tokio::test]
async fn test_corrupted_chunk_reads_as_inconsistent() {
    let (kv, store) = new_store(4);
    let id = FileId::sanitize("mangled");

    store.write(&id, &b"AAAABBBBCCCC"[..]).await.unwrap();
    // Replace chunk 0's bytes while keeping the chunk count intact. All
    // chunks are still present, so this must NOT read as eviction.
    kv.set("mangled_0", Bytes::from_static(b"XXXX")).await.unwrap();

    match store.read(&id).await {
        Err(CacheError::Inconsistent { file_id, .. }) => assert_eq!(file_id, id),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_inconsistent_entry_is_not_erased() {
    let (kv, store) = new_store(4);
    let id = FileId::sanitize("mangled");

    store.write(&id, &b"AAAABBBBCCCC"[..]).await.unwrap();
    kv.set("mangled_0", Bytes::from_static(b"XXXX")).await.unwrap();

    let _ = store.read(&id).await;

    // Unlike partial eviction, an inconsistency is left in place for
    // investigation.
    assert!(store.metadata(&id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_erase_is_idempotent() {
    let (kv, store) = new_store(4);
    let id = FileId::sanitize("target");

    store.write(&id, &b"AAAABBBB"[..]).await.unwrap();

    store.erase(&id).await.unwrap();
    store.erase(&id).await.unwrap();

    assert_eq!(kv.len().await, 0);
    assert!(store.metadata(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_erase_never_written_id() {
    let (_kv, store) = new_store(4);
    let id = FileId::sanitize("never");
    store.erase(&id).await.unwrap();
}

#[tokio::test]
async fn test_torn_metadata_reads_as_not_found() {
    let (kv, store) = new_store(4);
    let id = FileId::sanitize("torn");

    store.write(&id, &b"AAAABBBB"[..]).await.unwrap();
    // Evict one metadata key; the entry must present as absent, not
    // half-resolved.
    kv.delete("torn_checksum").await.unwrap();

    match store.read(&id).await {
        Err(CacheError::NotFound(_)) => {}
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_overwrite_recovers_from_corrupt_metadata() {
    let (kv, store) = new_store(4);
    let id = FileId::sanitize("recover");

    store.write(&id, &b"AAAABBBB"[..]).await.unwrap();
    kv.set("recover_chunk_count", Bytes::from_static(b"garbage"))
        .await
        .unwrap();

    // A fresh write clears the corrupt metadata and commits cleanly.
    store.write(&id, &b"new bytes"[..]).await.unwrap();
    let bytes = store.read(&id).await.unwrap();
    assert_eq!(&bytes[..], b"new bytes");
}
