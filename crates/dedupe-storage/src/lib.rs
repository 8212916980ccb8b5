// dedupe-storage — chunk byte storage callback contract
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

//! The indexing library never reads or writes chunk bytes itself; it calls
//! back into a caller-supplied [`ChunkStore`]. This crate defines that
//! contract and ships two reference implementations: [`memory::MemoryChunkStore`]
//! for tests, and [`filesystem::FileChunkStore`] for a real, sharded
//! on-disk layout.
//!
//! Keys are the base64 content-hash strings the index assigns to chunks —
//! this crate is deliberately blind to how they are produced.

pub mod filesystem;
pub mod memory;

pub use filesystem::FileChunkStore;
pub use memory::MemoryChunkStore;

/// A durable store for chunk bytes, keyed by the index's base64 chunk keys.
///
/// Implementations must be idempotent: writing identical bytes under a key
/// already present must succeed. Deleting a key that is not present must
/// succeed (the caller may ask to delete a key it already cleaned up).
pub trait ChunkStore: Send {
    /// Durably persist `bytes` under `key`. Returns `false` to signal
    /// failure; the library will run its garbage-collect compensation path.
    fn write_chunk(&mut self, key: &str, bytes: &[u8]) -> bool;

    /// Retrieve the bytes previously written under `key`, or `None` if the
    /// key is not present or could not be read.
    fn read_chunk(&mut self, key: &str) -> Option<Vec<u8>>;

    /// Best-effort removal of `key`. Always returns `true` if the key ends
    /// up absent, including when it was already absent.
    fn delete_chunk(&mut self, key: &str) -> bool;

    /// Cheap existence check, used by reconciliation. The default
    /// implementation falls back to a full read; backends with a cheaper
    /// check (a stat call, a HEAD request) should override this.
    fn chunk_exists(&mut self, key: &str) -> bool {
        self.read_chunk(key).is_some()
    }
}
