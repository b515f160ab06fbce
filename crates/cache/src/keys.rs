//! Backend key derivation for one logical entry.
//!
//! Per entry, the backend holds:
//!
//! ```text
//! {file_id}_0 .. {file_id}_{chunk_count-1}   -> raw chunk bytes
//! {file_id}_chunk_count                      -> decimal integer, as text
//! {file_id}_checksum                         -> hex digest, as text
//! ```

use stash_core::FileId;

/// Key for the chunk at `index`.
pub fn chunk_key(id: &FileId, index: u64) -> String {
    format!("{id}_{index}")
}

/// Key for the entry's chunk count.
pub fn chunk_count_key(id: &FileId) -> String {
    format!("{id}_chunk_count")
}

/// Key for the entry's content checksum.
pub fn checksum_key(id: &FileId) -> String {
    format!("{id}_checksum")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let id = FileId::sanitize("report");
        assert_eq!(chunk_key(&id, 0), "report_0");
        assert_eq!(chunk_key(&id, 12), "report_12");
        assert_eq!(chunk_count_key(&id), "report_chunk_count");
        assert_eq!(checksum_key(&id), "report_checksum");
    }
}
