//! Core domain types and shared logic for stash.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Content hashes and incremental hashing
//! - File identifiers derived from caller-supplied names
//! - Application configuration

pub mod config;
pub mod error;
pub mod file_id;
pub mod hash;

pub use error::{Error, Result};
pub use file_id::FileId;
pub use hash::{ContentHash, ContentHasher};

/// Default chunk size: 512 KiB. Tuned against memcached slab utilization.
pub const DEFAULT_CHUNK_SIZE: u64 = 512 * 1024;

/// Maximum chunk size: a little under memcached's 1 MiB item ceiling,
/// leaving room for key and protocol overhead within the slab.
pub const MAX_CHUNK_SIZE: u64 = 950_000;

/// Minimum chunk size: 1 KiB.
pub const MIN_CHUNK_SIZE: u64 = 1024;
