//! Content checksums for cached entries.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

const HEX: &[u8; 16] = b"0123456789abcdef";

/// A SHA-256 digest of an entry's content, 32 raw bytes.
///
/// Persisted in the backend as lowercase hex and compared against the
/// reassembled bytes on every read.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Digest a complete byte slice in one call.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Self::hasher();
        hasher.update(data);
        hasher.finalize()
    }

    /// Start an incremental digest.
    pub fn hasher() -> ContentHasher {
        ContentHasher(Sha256::new())
    }

    /// Parse from a 64-character hex string. Accepts either case.
    pub fn from_hex(s: &str) -> crate::Result<Self> {
        let raw = s.as_bytes();
        if raw.len() != 64 {
            return Err(crate::Error::InvalidHash(format!(
                "expected 64 hex chars, got {}",
                raw.len()
            )));
        }
        let mut bytes = [0u8; 32];
        for (i, pair) in raw.chunks_exact(2).enumerate() {
            let (hi, lo) = (hex_nibble(pair[0]), hex_nibble(pair[1]));
            match (hi, lo) {
                (Some(hi), Some(lo)) => bytes[i] = (hi << 4) | lo,
                _ => {
                    return Err(crate::Error::InvalidHash(format!(
                        "non-hex character at position {}",
                        i * 2
                    )));
                }
            }
        }
        Ok(Self(bytes))
    }

    /// Encode as a 64-character lowercase hex string.
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(64);
        for b in self.0 {
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0f) as usize] as char);
        }
        out
    }
}

fn hex_nibble(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({}..)", &self.to_hex()[..12])
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Incremental SHA-256 digest over a sequence of windows.
///
/// Order-dependent: feeding the same windows in a different order yields
/// a different hash, which is what makes the stored checksum sensitive to
/// chunk ordering.
pub struct ContentHasher(Sha256);

impl ContentHasher {
    /// Feed the next window of bytes.
    pub fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    /// Seal the digest.
    pub fn finalize(self) -> ContentHash {
        ContentHash(self.0.finalize().into())
    }
}
