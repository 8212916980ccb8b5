// dedupe-storage — sharded filesystem chunk store
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

//! Stores chunk bytes under a root directory, sharded two levels deep so a
//! large chunk population does not land every file in one directory:
//!
//! ```text
//! root/
//!   ab/
//!     cd/
//!       abcd1234...
//! ```
//!
//! Writes go through a temp file plus rename so a reader never observes a
//! partially written chunk.

use crate::ChunkStore;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A chunk store backed by the local filesystem.
#[derive(Debug, Clone)]
pub struct FileChunkStore {
    root: PathBuf,
}

impl FileChunkStore {
    /// Open (creating if needed) a chunk store rooted at `root`.
    pub fn new<P: AsRef<Path>>(root: P) -> io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(FileChunkStore { root })
    }

    /// Path a given chunk key would be stored at, creating its shard
    /// directories on demand.
    fn chunk_path(&self, key: &str) -> PathBuf {
        let safe = sanitize_for_path(key);
        let shard_a = safe.get(0..2).unwrap_or("__");
        let shard_b = safe.get(2..4).unwrap_or("__");
        self.root.join(shard_a).join(shard_b).join(safe)
    }
}

/// Base64 keys may contain `/` and `+`, which are unsafe or awkward as path
/// components on common filesystems. The substitution is deterministic and
/// only affects the on-disk filename, never the key the index records.
fn sanitize_for_path(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            '/' => '_',
            '+' => '-',
            other => other,
        })
        .collect()
}

impl ChunkStore for FileChunkStore {
    fn write_chunk(&mut self, key: &str, bytes: &[u8]) -> bool {
        let path = self.chunk_path(key);
        let Some(parent) = path.parent() else {
            return false;
        };
        if let Err(err) = fs::create_dir_all(parent) {
            tracing::warn!(key, error = %err, "failed to create chunk shard directory");
            return false;
        }

        let tmp_path = path.with_extension("tmp");
        if let Err(err) = fs::write(&tmp_path, bytes) {
            tracing::warn!(key, error = %err, "failed to write chunk temp file");
            return false;
        }
        if let Err(err) = fs::rename(&tmp_path, &path) {
            tracing::warn!(key, error = %err, "failed to finalize chunk write");
            let _ = fs::remove_file(&tmp_path);
            return false;
        }
        true
    }

    fn read_chunk(&mut self, key: &str) -> Option<Vec<u8>> {
        let path = self.chunk_path(key);
        match fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => {
                tracing::warn!(key, error = %err, "failed to read chunk");
                None
            }
        }
    }

    fn delete_chunk(&mut self, key: &str) -> bool {
        let path = self.chunk_path(key);
        match fs::remove_file(&path) {
            Ok(()) => true,
            Err(err) if err.kind() == io::ErrorKind::NotFound => true,
            Err(err) => {
                tracing::warn!(key, error = %err, "failed to delete chunk");
                false
            }
        }
    }

    fn chunk_exists(&mut self, key: &str) -> bool {
        self.chunk_path(key).is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let mut store = FileChunkStore::new(dir.path()).unwrap();
        assert!(store.write_chunk("abcd1234", b"hello"));
        assert_eq!(store.read_chunk("abcd1234"), Some(b"hello".to_vec()));
    }

    #[test]
    fn keys_with_slashes_and_pluses_round_trip() {
        let dir = tempdir().unwrap();
        let mut store = FileChunkStore::new(dir.path()).unwrap();
        let key = "ab/cd+ef==";
        assert!(store.write_chunk(key, b"payload"));
        assert_eq!(store.read_chunk(key), Some(b"payload".to_vec()));
    }

    #[test]
    fn delete_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut store = FileChunkStore::new(dir.path()).unwrap();
        assert!(store.delete_chunk("missing"));
        store.write_chunk("k1", b"hello");
        assert!(store.delete_chunk("k1"));
        assert!(store.delete_chunk("k1"));
    }

    #[test]
    fn exists_matches_presence() {
        let dir = tempdir().unwrap();
        let mut store = FileChunkStore::new(dir.path()).unwrap();
        assert!(!store.chunk_exists("k1"));
        store.write_chunk("k1", b"hello");
        assert!(store.chunk_exists("k1"));
    }

    #[test]
    fn overwriting_with_identical_bytes_succeeds() {
        let dir = tempdir().unwrap();
        let mut store = FileChunkStore::new(dir.path()).unwrap();
        assert!(store.write_chunk("k1", b"hello"));
        assert!(store.write_chunk("k1", b"hello"));
        assert_eq!(store.read_chunk("k1"), Some(b"hello".to_vec()));
    }
}
