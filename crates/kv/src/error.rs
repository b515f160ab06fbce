//! Key-value backend error types.

use std::time::Duration;
use thiserror::Error;

/// Key-value backend operation errors.
#[derive(Debug, Error)]
pub enum KvError {
    #[error("backend unavailable: {0}")]
    Unavailable(#[from] std::io::Error),

    #[error("backend call timed out after {0:?}")]
    Timeout(Duration),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("value too large: {size} bytes (max: {max})")]
    ValueTooLarge { size: usize, max: usize },

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for key-value backend operations.
pub type KvResult<T> = std::result::Result<T, KvError>;
