//! Cache entry store error types.

use stash_core::FileId;
use stash_kv::KvError;
use thiserror::Error;

/// Cache operation errors.
///
/// `NotFound` covers both "metadata absent" and "partial eviction
/// detected" - the two collapse to the same caller-visible outcome.
/// `Inconsistent` is surfaced distinctly: a complete chunk set that
/// disagrees with its recorded checksum indicates a bug, not eviction,
/// and must reach operational alerting. Neither variant ever carries
/// partial data.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("backend error: {0}")]
    Backend(#[from] KvError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("entry not found: {0}")]
    NotFound(FileId),

    #[error("inconsistent entry {file_id}: {detail}")]
    Inconsistent { file_id: FileId, detail: String },
}

/// Result type for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;
