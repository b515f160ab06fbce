//! Chunked object store over a volatile key-value backend.
//!
//! Files are split into bounded-size chunks stored under independent
//! keys, with a two-key metadata record (chunk count + content checksum)
//! committed after the chunks. The backend may evict any key at any
//! time; the entry store detects partial eviction on read and tells it
//! apart from true corruption.
//!
//! Components:
//! - [`codec`]: split a byte source into stored chunks / reassemble them
//! - [`store::CacheStore`]: write/read orchestration and the consistency
//!   decision
//! - [`gc`]: best-effort erasure of everything belonging to one entry

pub mod codec;
pub mod error;
pub mod gc;
pub mod keys;
pub mod store;

pub use codec::{Assembled, fetch_and_join, split_and_store};
pub use error::{CacheError, CacheResult};
pub use store::{CacheStore, EntryMeta, WriteReceipt};
