//! Chunk codec: split a byte source into stored chunks, and reassemble
//! stored chunks into a byte stream.
//!
//! The codec is mechanism only. It never judges whether a missing chunk
//! means eviction or a bug, and it never cleans up after a failed store;
//! both responsibilities belong to the entry store.

use crate::error::CacheResult;
use crate::keys;
use bytes::{Bytes, BytesMut};
use stash_core::{ContentHash, FileId};
use stash_kv::KvStore;
use tokio::io::{AsyncRead, AsyncReadExt};

/// The result of reassembling an entry's chunks.
pub struct Assembled {
    /// Concatenation of every chunk that was found, in index order.
    /// Incomplete if `chunks_found` is short; missing chunks are never
    /// padded.
    pub bytes: Bytes,
    /// Digest of `bytes`, fed in the same order used at write time.
    pub digest: ContentHash,
    /// Number of chunk indices that returned a value.
    pub chunks_found: u64,
}

/// Fill `buf` from the reader, stopping early only at end of stream.
/// Returns the number of bytes read into the window.
async fn read_window<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Split a byte source into chunks of at most `chunk_size` bytes and
/// store each under `{file_id}_{index}`, index starting at 0.
///
/// Each window is stored as soon as it is read, so a failure part-way
/// through leaves a prefix of valid chunks rather than none. A running
/// digest is updated with each window before the buffer is reused; the
/// digest is sealed only once the source is exhausted. A zero-length
/// source yields `(0, digest of the empty stream)`.
///
/// A failed `set` aborts the operation and propagates the backend error.
/// Chunks already stored are left in place for the caller to reclaim.
pub async fn split_and_store<R>(
    kv: &dyn KvStore,
    id: &FileId,
    mut reader: R,
    chunk_size: usize,
) -> CacheResult<(u64, ContentHash)>
where
    R: AsyncRead + Unpin,
{
    let mut hasher = ContentHash::hasher();
    let mut buf = vec![0u8; chunk_size];
    let mut index: u64 = 0;

    loop {
        let n = read_window(&mut reader, &mut buf).await?;
        if n == 0 {
            break;
        }
        kv.set(&keys::chunk_key(id, index), Bytes::copy_from_slice(&buf[..n]))
            .await?;
        hasher.update(&buf[..n]);
        index += 1;
    }

    Ok((index, hasher.finalize()))
}

/// Fetch chunks `0..chunk_count` in strict index order and concatenate
/// whatever is found.
///
/// A miss never aborts: the assembled bytes and `chunks_found` are
/// returned so the caller can distinguish a complete reconstruction from
/// partial eviction. A per-chunk backend error (including a timeout) is
/// folded into the miss count as well - at the key level it is
/// indistinguishable from eviction, and the verdict is the caller's.
pub async fn fetch_and_join(
    kv: &dyn KvStore,
    id: &FileId,
    chunk_count: u64,
) -> CacheResult<Assembled> {
    let mut hasher = ContentHash::hasher();
    let mut bytes = BytesMut::new();
    let mut chunks_found = 0;

    for index in 0..chunk_count {
        let key = keys::chunk_key(id, index);
        match kv.get(&key).await {
            Ok(Some(chunk)) => {
                hasher.update(&chunk);
                bytes.extend_from_slice(&chunk);
                chunks_found += 1;
            }
            Ok(None) => {
                tracing::debug!(file_id = %id, index, "chunk missing");
            }
            Err(e) => {
                tracing::warn!(file_id = %id, index, error = %e, "chunk fetch failed, counting as miss");
            }
        }
    }

    Ok(Assembled {
        bytes: bytes.freeze(),
        digest: hasher.finalize(),
        chunks_found,
    })
}
