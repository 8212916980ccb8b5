// dedupe-core — content-addressed chunk hashing primitives
// Copyright (C) 2026  dedupe contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

//! Hashing primitives: the content key used to address a chunk, the window
//! hash used to detect a chunk boundary, and the boundary test itself.

use base64::Engine;
use md5::{Digest as Md5Digest, Md5};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A content-derived chunk key: base64 of the SHA-256 digest of the chunk's bytes.
///
/// Two chunks with identical bytes always produce the same key, which is the
/// entire basis for deduplication: the index never stores the same bytes twice
/// under two different keys.
///
/// ```
/// use dedupe_core::hash::ChunkKey;
///
/// let key = ChunkKey::of(b"hello world");
/// assert_eq!(key, ChunkKey::of(b"hello world"));
/// assert_ne!(key, ChunkKey::of(b"hello there"));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChunkKey([u8; 32]);

impl ChunkKey {
    /// Compute the content key for a chunk's bytes.
    pub fn of(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let digest = hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        ChunkKey(bytes)
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Stable, platform-independent textual form: standard base64 (with padding).
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.0)
    }

    /// Parse a key back from its base64 textual form.
    pub fn from_base64(s: &str) -> Result<Self, InvalidChunkKey> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(s)
            .map_err(|_| InvalidChunkKey)?;
        if bytes.len() != 32 {
            return Err(InvalidChunkKey);
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        Ok(ChunkKey(out))
    }
}

/// A chunk key string did not decode to a 32-byte SHA-256 digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid chunk key: not a base64-encoded 32-byte digest")]
pub struct InvalidChunkKey;

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base64())
    }
}

impl fmt::Debug for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkKey({})", self.to_base64())
    }
}

/// The 16-byte MD5 digest of a sliding window, used only to test for a
/// content-defined boundary. Never used as a chunk key.
pub fn window_hash(window: &[u8]) -> [u8; 16] {
    let mut hasher = Md5::new();
    hasher.update(window);
    let digest = hasher.finalize();
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest);
    bytes
}

/// True iff the first `n` bytes of `digest` are all zero.
///
/// `n` is `boundary_check_bytes` from the index config; the chunker calls
/// this once per window to decide whether the window's end is a chunk
/// boundary.
pub fn is_boundary(digest: &[u8; 16], n: u8) -> bool {
    let n = n as usize;
    debug_assert!(n >= 1 && n <= digest.len());
    digest[..n].iter().all(|&b| b == 0)
}
