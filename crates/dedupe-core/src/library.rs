// dedupe-core — library façade
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

//! Orchestrates store/retrieve/delete against an [`IndexStore`] or
//! [`PoolIndexStore`], serializing every operation that touches the index or
//! invokes a [`ChunkStore`] callback behind one instance-owned lock.
//!
//! Two index shapes are supported by one façade: construct with
//! [`Library::new_flat`] for a single namespace, or [`Library::new_pool`] for
//! the pool+container shape, where every object operation additionally names
//! the container it belongs to.

use crate::chunker::{chunk_buffer, chunk_stream, ChunkSpan};
use crate::error::{Error, Result};
use crate::hash::ChunkKey;
use crate::index::{IndexStats, IndexStore, ObjectMetadata, PoolIndexStore};
use crate::window::StreamWindowSource;
use dedupe_storage::ChunkStore;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Mutex;

enum Backend {
    Flat(Box<dyn IndexStore>),
    Pool(Box<dyn PoolIndexStore>),
}

/// The embedded deduplication library. Owns the index (flat or pool) and the
/// lock serializing access to it; chunk bytes live wherever the caller's
/// [`ChunkStore`] puts them.
pub struct Library {
    backend: Mutex<Backend>,
}

/// Outcome of [`Library::verify`]: which of an object's chunks are missing
/// from external storage. Diagnostic only — never mutates the index.
#[derive(Debug, Clone, Default)]
pub struct VerifyReport {
    pub object_name: String,
    pub chunks_checked: usize,
    pub missing: Vec<ChunkKey>,
}

impl VerifyReport {
    pub fn is_consistent(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Replace path separators and other characters hostile to a storage key
/// with `_`; reject names that are empty after trimming.
fn sanitize_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidArgument("object/container name must not be empty".to_string()));
    }
    let sanitized: String = trimmed
        .chars()
        .map(|c| if c.is_control() || c == '/' || c == '\\' { '_' } else { c })
        .collect();
    Ok(sanitized)
}

impl Library {
    /// Wrap a flat index store.
    pub fn new_flat(store: Box<dyn IndexStore>) -> Self {
        Library {
            backend: Mutex::new(Backend::Flat(store)),
        }
    }

    /// Wrap a pool index store.
    pub fn new_pool(store: Box<dyn PoolIndexStore>) -> Self {
        Library {
            backend: Mutex::new(Backend::Pool(store)),
        }
    }

    /// Run `f` with exclusive access to the object-level index for
    /// `container` (pool mode) or the single flat index (`container` must be
    /// `None`).
    fn with_object_store<R>(
        &self,
        container: Option<&str>,
        f: impl FnOnce(&mut dyn IndexStore) -> Result<R>,
    ) -> Result<R> {
        let mut guard = self.backend.lock().expect("chunk_lock poisoned");
        match (&mut *guard, container) {
            (Backend::Flat(store), None) => f(store.as_mut()),
            (Backend::Flat(_), Some(_)) => Err(Error::InvalidArgument(
                "this index is flat; it does not have containers".to_string(),
            )),
            (Backend::Pool(_), None) => Err(Error::InvalidArgument(
                "this index is pool-mode; every object operation names a container".to_string(),
            )),
            (Backend::Pool(pool), Some(name)) => {
                let mut opened = pool.open_container(name)?;
                f(opened.as_mut())
            }
        }
    }

    /// Run `f` with exclusive access to the pool registry. Fails for a flat
    /// index.
    fn with_pool<R>(&self, f: impl FnOnce(&mut dyn PoolIndexStore) -> Result<R>) -> Result<R> {
        let mut guard = self.backend.lock().expect("chunk_lock poisoned");
        match &mut *guard {
            Backend::Pool(pool) => f(pool.as_mut()),
            Backend::Flat(_) => Err(Error::InvalidArgument(
                "this index is flat; container operations are not available".to_string(),
            )),
        }
    }

    /// Store a new object. Fails with [`Error::Conflict`] if the name is
    /// already taken.
    pub fn store_object(
        &self,
        container: Option<&str>,
        name: &str,
        data: &[u8],
        sink: &mut dyn ChunkStore,
    ) -> Result<Vec<ChunkSpan>> {
        self.store_impl(container, name, data, sink, false)
    }

    /// Store an object, replacing any existing object of the same name
    /// first. Not atomic across the replace: a callback failure partway
    /// through the new write leaves the object absent rather than restoring
    /// the prior version (see DESIGN.md — this library makes no
    /// cross-object transactional guarantee).
    pub fn store_or_replace_object(
        &self,
        container: Option<&str>,
        name: &str,
        data: &[u8],
        sink: &mut dyn ChunkStore,
    ) -> Result<Vec<ChunkSpan>> {
        self.store_impl(container, name, data, sink, true)
    }

    fn store_impl(
        &self,
        container: Option<&str>,
        name: &str,
        data: &[u8],
        sink: &mut dyn ChunkStore,
        replace: bool,
    ) -> Result<Vec<ChunkSpan>> {
        let sanitized = sanitize_name(name)?;
        self.with_object_store(container, |store| {
            if store.object_exists(&sanitized)? && !replace {
                return Err(Error::Conflict(format!("object '{sanitized}' already exists")));
            }

            let config = store.get_config()?;
            let spans = chunk_buffer(data, &config);

            // Edges committed first, bytes written second: a surviving
            // object row always implies its chunks were at least attempted.
            store.add_object_chunks(&sanitized, data.len() as u64, &spans, replace)?;

            for span in &spans {
                let key_str = span.key.to_base64();
                let start = span.position as usize;
                let end = start + span.length as usize;
                if !sink.write_chunk(&key_str, &data[start..end]) {
                    tracing::warn!(object = %sanitized, chunk = %key_str, "write_chunk failed, compensating");
                    let zeroed = store.delete_object_chunks(&sanitized)?;
                    for key in zeroed {
                        if !sink.delete_chunk(&key.to_base64()) {
                            tracing::warn!(object = %sanitized, chunk = %key, "compensating delete_chunk failed");
                        }
                    }
                    return Err(Error::CallbackFailure(format!(
                        "write_chunk failed for key {key_str} while storing '{sanitized}'"
                    )));
                }
            }

            tracing::info!(object = %sanitized, chunks = spans.len(), "stored object");
            Ok(spans)
        })
    }

    /// Store an object from a sequential reader, chunking and writing
    /// incrementally so memory use stays bounded by roughly one
    /// `max_chunk_size` rather than the whole object.
    pub fn store_object_streaming<R: Read>(
        &self,
        container: Option<&str>,
        name: &str,
        reader: R,
        sink: &mut dyn ChunkStore,
        replace: bool,
    ) -> Result<Vec<ChunkSpan>> {
        let sanitized = sanitize_name(name)?;
        self.with_object_store(container, |store| {
            if store.object_exists(&sanitized)? {
                if !replace {
                    return Err(Error::Conflict(format!("object '{sanitized}' already exists")));
                }
                store.delete_object_chunks(&sanitized)?;
            }

            let config = store.get_config()?;
            let mut source = StreamWindowSource::new(reader);
            let mut committed: Vec<ChunkSpan> = Vec::new();
            let mut callback_failed = false;

            let outcome = chunk_stream(&mut source, &config, |span, bytes| {
                let key_str = span.key.to_base64();
                if !sink.write_chunk(&key_str, bytes) {
                    callback_failed = true;
                    return Ok(false);
                }
                store
                    .add_object_chunk(&sanitized, span)
                    .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
                committed.push(span);
                Ok(true)
            })
            .map_err(Error::Io)?;

            if callback_failed || outcome.aborted {
                let zeroed = store.delete_object_chunks(&sanitized)?;
                for key in zeroed {
                    let _ = sink.delete_chunk(&key.to_base64());
                }
                return Err(Error::CallbackFailure(format!(
                    "write_chunk failed while streaming object '{sanitized}'"
                )));
            }

            let total_len: u64 = committed.iter().map(|s| s.length as u64).sum();
            store.finalize_object(&sanitized, total_len)?;
            tracing::info!(object = %sanitized, chunks = committed.len(), "stored object (streaming)");
            Ok(committed)
        })
    }

    /// Full metadata for an object.
    pub fn retrieve_object_metadata(&self, container: Option<&str>, name: &str) -> Result<ObjectMetadata> {
        let sanitized = sanitize_name(name)?;
        self.with_object_store(container, |store| {
            store
                .get_object_metadata(&sanitized)?
                .ok_or_else(|| Error::NotFound(format!("object '{sanitized}'")))
        })
    }

    /// Read an object back in full, concatenating its chunks in ordinal
    /// order.
    pub fn retrieve_object(&self, container: Option<&str>, name: &str, sink: &mut dyn ChunkStore) -> Result<Vec<u8>> {
        let sanitized = sanitize_name(name)?;
        self.with_object_store(container, |store| {
            let meta = store
                .get_object_metadata(&sanitized)?
                .ok_or_else(|| Error::NotFound(format!("object '{sanitized}'")))?;

            let mut out = vec![0u8; meta.content_length as usize];
            let mut position = 0usize;
            for edge in &meta.chunks {
                let key_str = edge.key.to_base64();
                let bytes = sink
                    .read_chunk(&key_str)
                    .ok_or_else(|| Error::CallbackFailure(format!("read_chunk returned nothing for key {key_str}")))?;
                if bytes.len() != edge.length as usize {
                    return Err(Error::CallbackFailure(format!(
                        "read_chunk returned {} bytes for key {key_str}, expected {}",
                        bytes.len(),
                        edge.length
                    )));
                }
                out[position..position + bytes.len()].copy_from_slice(&bytes);
                position += bytes.len();
            }
            Ok(out)
        })
    }

    /// Remove an object and decrement the refcount of every chunk it
    /// referenced, deleting zeroed chunks from external storage. Idempotent.
    pub fn delete_object(&self, container: Option<&str>, name: &str, sink: &mut dyn ChunkStore) -> Result<()> {
        let sanitized = sanitize_name(name)?;
        self.with_object_store(container, |store| {
            let zeroed = store.delete_object_chunks(&sanitized)?;
            for key in zeroed {
                if !sink.delete_chunk(&key.to_base64()) {
                    tracing::warn!(object = %sanitized, chunk = %key, "delete_chunk failed; bytes orphaned");
                }
            }
            tracing::info!(object = %sanitized, "deleted object");
            Ok(())
        })
    }

    pub fn object_exists(&self, container: Option<&str>, name: &str) -> Result<bool> {
        let sanitized = sanitize_name(name)?;
        self.with_object_store(container, |store| store.object_exists(&sanitized))
    }

    pub fn chunk_exists(&self, container: Option<&str>, key: &ChunkKey) -> Result<bool> {
        self.with_object_store(container, |store| store.chunk_exists(key))
    }

    pub fn list_objects(&self, container: Option<&str>) -> Result<Vec<String>> {
        self.with_object_store(container, |store| store.list_objects())
    }

    pub fn index_stats(&self, container: Option<&str>) -> Result<IndexStats> {
        self.with_object_store(container, |store| store.index_stats())
    }

    /// Back up the top-level index: the single index in flat mode, or the
    /// container registry (not container contents) in pool mode. See
    /// [`Library::backup_container_index`] for backing up one container.
    pub fn backup_index(&self, dest: &Path) -> Result<()> {
        let guard = self.backend.lock().expect("chunk_lock poisoned");
        match &*guard {
            Backend::Flat(store) => store.backup(dest),
            Backend::Pool(pool) => pool.backup(dest),
        }
    }

    /// Create a new, empty container (pool mode only).
    pub fn add_container(&self, name: &str) -> Result<()> {
        let sanitized = sanitize_name(name)?;
        self.with_pool(|pool| pool.add_container(&sanitized))
    }

    /// Delete every object in a container, then the container itself
    /// (§4.8's repeat-list-delete-until-empty protocol — handles objects
    /// inserted concurrently with the delete by re-listing until the
    /// container is observed empty).
    pub fn delete_container(&self, name: &str, sink: &mut dyn ChunkStore) -> Result<()> {
        let sanitized = sanitize_name(name)?;
        loop {
            let objects = self.list_objects(Some(&sanitized))?;
            if objects.is_empty() {
                break;
            }
            for object_name in objects {
                self.delete_object(Some(&sanitized), &object_name, sink)?;
            }
        }
        self.with_pool(|pool| pool.remove_container(&sanitized))
    }

    pub fn container_exists(&self, name: &str) -> Result<bool> {
        self.with_pool(|pool| pool.container_exists(name))
    }

    pub fn list_containers(&self) -> Result<Vec<String>> {
        self.with_pool(|pool| pool.list_containers())
    }

    /// Import a container index from `source`, merging into an existing
    /// container of the same name (per `increment_refcount`) or registering
    /// a fresh clone if none exists yet. See
    /// [`crate::index::PoolIndexStore::import_container_index`].
    pub fn import_container_index(&self, name: &str, source: &Path, increment_refcount: bool) -> Result<()> {
        let sanitized = sanitize_name(name)?;
        self.with_pool(|pool| pool.import_container_index(&sanitized, source, increment_refcount))
    }

    /// Back up a container's index to `dest`, optionally also registering
    /// (or merging) the backup as a container named `new_name` in this pool.
    /// See [`crate::index::PoolIndexStore::backup_container_index`].
    pub fn backup_container_index(
        &self,
        name: &str,
        dest: &Path,
        new_name: Option<&str>,
        increment_refcount: bool,
    ) -> Result<()> {
        let sanitized_new_name = new_name.map(sanitize_name).transpose()?;
        self.with_pool(|pool| {
            pool.backup_container_index(name, dest, sanitized_new_name.as_deref(), increment_refcount)
        })
    }

    /// Walk an object's chunk list and confirm each key is still present in
    /// external storage. Diagnostic only: never mutates the index, and a
    /// missing chunk is reported in the result rather than returned as an
    /// error.
    pub fn verify(&self, container: Option<&str>, name: &str, sink: &mut dyn ChunkStore) -> Result<VerifyReport> {
        let sanitized = sanitize_name(name)?;
        let meta = self.retrieve_object_metadata(container, &sanitized)?;

        let mut report = VerifyReport {
            object_name: sanitized,
            chunks_checked: meta.chunks.len(),
            missing: Vec::new(),
        };
        for edge in &meta.chunks {
            if !sink.chunk_exists(&edge.key.to_base64()) {
                tracing::warn!(object = %report.object_name, chunk = %edge.key, "chunk missing from external storage");
                report.missing.push(edge.key);
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChunkerConfig;
    use crate::index::memory::{MemoryIndexStore, MemoryPoolIndexStore};
    use dedupe_storage::MemoryChunkStore;

    fn cfg() -> ChunkerConfig {
        ChunkerConfig::new(128, 1024, 64, 1, false).unwrap()
    }

    fn flat_library() -> Library {
        Library::new_flat(Box::new(MemoryIndexStore::new(cfg())))
    }

    #[test]
    fn round_trip_exact() {
        let lib = flat_library();
        let mut sink = MemoryChunkStore::new();
        let data = vec![7u8; 5000];

        lib.store_object(None, "o", &data, &mut sink).unwrap();
        let back = lib.retrieve_object(None, "o", &mut sink).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn duplicate_store_without_replace_conflicts() {
        let lib = flat_library();
        let mut sink = MemoryChunkStore::new();
        lib.store_object(None, "o", b"hello", &mut sink).unwrap();
        assert!(matches!(
            lib.store_object(None, "o", b"hello", &mut sink),
            Err(Error::Conflict(_))
        ));
    }

    #[test]
    fn dedup_ratio_doubles_on_identical_second_store() {
        let lib = flat_library();
        let mut sink = MemoryChunkStore::new();
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 250) as u8).collect();

        lib.store_object(None, "x", &data, &mut sink).unwrap();
        let stats_after_first = lib.index_stats(None).unwrap();

        lib.store_object(None, "y", &data, &mut sink).unwrap();
        let stats_after_second = lib.index_stats(None).unwrap();

        assert_eq!(stats_after_first.physical_bytes, stats_after_second.physical_bytes);
        assert_eq!(stats_after_second.logical_bytes, stats_after_first.logical_bytes * 2);
    }

    /// A write_chunk callback that fails on a chosen 1-based chunk ordinal.
    struct FailingSink {
        inner: MemoryChunkStore,
        fail_on_ordinal: usize,
        calls: usize,
    }

    impl ChunkStore for FailingSink {
        fn write_chunk(&mut self, key: &str, bytes: &[u8]) -> bool {
            self.calls += 1;
            if self.calls == self.fail_on_ordinal {
                return false;
            }
            self.inner.write_chunk(key, bytes)
        }

        fn read_chunk(&mut self, key: &str) -> Option<Vec<u8>> {
            self.inner.read_chunk(key)
        }

        fn delete_chunk(&mut self, key: &str) -> bool {
            self.inner.delete_chunk(key)
        }
    }

    #[test]
    fn callback_failure_compensates_fully() {
        let lib = flat_library();
        let stats_before = lib.index_stats(None).unwrap();

        let config = cfg();
        let data: Vec<u8> = (0..20_000u32).map(|i| ((i * 13) % 256) as u8).collect();
        let spans = chunk_buffer(&data, &config);
        assert!(spans.len() >= 3, "test needs at least 3 chunks to fail on the 3rd");

        let mut sink = FailingSink {
            inner: MemoryChunkStore::new(),
            fail_on_ordinal: 3,
            calls: 0,
        };

        let result = lib.store_object(None, "o", &data, &mut sink);
        assert!(matches!(result, Err(Error::CallbackFailure(_))));
        assert!(!lib.object_exists(None, "o").unwrap());

        let stats_after = lib.index_stats(None).unwrap();
        assert_eq!(stats_before, stats_after);
    }

    #[test]
    fn verify_reports_missing_chunks() {
        let lib = flat_library();
        let mut sink = MemoryChunkStore::new();
        lib.store_object(None, "o", b"hello world", &mut sink).unwrap();

        let report = lib.verify(None, "o", &mut sink).unwrap();
        assert!(report.is_consistent());

        // simulate external storage losing the chunk without the index
        // knowing about it.
        let meta = lib.retrieve_object_metadata(None, "o").unwrap();
        for edge in &meta.chunks {
            sink.delete_chunk(&edge.key.to_base64());
        }

        let report = lib.verify(None, "o", &mut sink).unwrap();
        assert!(!report.is_consistent());
        assert_eq!(report.missing.len(), meta.chunks.len());
    }

    #[test]
    fn pool_mode_containers_are_independent() {
        let lib = Library::new_pool(Box::new(MemoryPoolIndexStore::new(cfg())));
        lib.add_container("c1").unwrap();
        lib.add_container("c2").unwrap();

        let mut sink = MemoryChunkStore::new();
        let data = vec![9u8; 4096];
        lib.store_object(Some("c1"), "o", &data, &mut sink).unwrap();
        lib.store_object(Some("c2"), "o", &data, &mut sink).unwrap();

        assert_eq!(lib.list_containers().unwrap().len(), 2);

        lib.delete_container("c1", &mut sink).unwrap();
        assert!(!lib.container_exists("c1").unwrap());

        let back = lib.retrieve_object(Some("c2"), "o", &mut sink).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn flat_index_rejects_container_argument() {
        let lib = flat_library();
        assert!(matches!(
            lib.object_exists(Some("nope"), "o"),
            Err(Error::InvalidArgument(_))
        ));
    }
}
