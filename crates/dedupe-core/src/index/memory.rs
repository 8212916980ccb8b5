// dedupe-core — in-memory index store, for tests and scratch use
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

//! A non-persistent `IndexStore`/`PoolIndexStore` pair backed by `HashMap`s.
//! Not durable across process restarts; useful for unit tests and for
//! callers that only need deduplication within a single run.

use super::{IndexStats, IndexStore, ObjectChunkEdge, ObjectMetadata, PoolIndexStore};
use crate::chunker::ChunkSpan;
use crate::config::ChunkerConfig;
use crate::error::{Error, Result};
use crate::hash::ChunkKey;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct ChunkRow {
    length: u32,
    refcount: u64,
}

/// In-memory flat index.
pub struct MemoryIndexStore {
    config: ChunkerConfig,
    objects: HashMap<String, ObjectMetadata>,
    chunks: HashMap<ChunkKey, ChunkRow>,
}

impl MemoryIndexStore {
    pub fn new(config: ChunkerConfig) -> Self {
        MemoryIndexStore {
            config,
            objects: HashMap::new(),
            chunks: HashMap::new(),
        }
    }

    fn inc_ref(&mut self, key: ChunkKey, length: u32) {
        self.chunks
            .entry(key)
            .and_modify(|row| row.refcount += 1)
            .or_insert(ChunkRow { length, refcount: 1 });
    }

    /// Decrement refcounts for `edges`, removing chunk rows that hit zero.
    /// Returns the keys removed.
    fn release_edges(&mut self, edges: &[ObjectChunkEdge]) -> Vec<ChunkKey> {
        let mut zeroed = Vec::new();
        for edge in edges {
            if let Some(row) = self.chunks.get_mut(&edge.key) {
                row.refcount = row.refcount.saturating_sub(1);
                if row.refcount == 0 {
                    self.chunks.remove(&edge.key);
                    zeroed.push(edge.key);
                }
            }
        }
        zeroed
    }
}

impl IndexStore for MemoryIndexStore {
    fn get_config(&self) -> Result<ChunkerConfig> {
        Ok(self.config)
    }

    fn object_exists(&self, name: &str) -> Result<bool> {
        Ok(self.objects.contains_key(name))
    }

    fn chunk_exists(&self, key: &ChunkKey) -> Result<bool> {
        Ok(self.chunks.contains_key(key))
    }

    fn add_object_chunks(
        &mut self,
        name: &str,
        content_length: u64,
        chunks: &[ChunkSpan],
        replace: bool,
    ) -> Result<()> {
        if self.objects.contains_key(name) && !replace {
            return Err(Error::Conflict(format!("object '{name}' already exists")));
        }
        if let Some(prior) = self.objects.remove(name) {
            self.release_edges(&prior.chunks);
        }

        let edges: Vec<ObjectChunkEdge> = chunks.iter().map(|&c| c.into()).collect();
        for span in chunks {
            self.inc_ref(span.key, span.length);
        }
        self.objects.insert(
            name.to_string(),
            ObjectMetadata {
                name: name.to_string(),
                content_length,
                chunks: edges,
            },
        );
        Ok(())
    }

    fn add_object_chunk(&mut self, name: &str, chunk: ChunkSpan) -> Result<()> {
        self.inc_ref(chunk.key, chunk.length);
        let entry = self.objects.entry(name.to_string()).or_insert_with(|| ObjectMetadata {
            name: name.to_string(),
            content_length: 0,
            chunks: Vec::new(),
        });
        entry.chunks.push(chunk.into());
        Ok(())
    }

    fn finalize_object(&mut self, name: &str, content_length: u64) -> Result<()> {
        let entry = self
            .objects
            .get_mut(name)
            .ok_or_else(|| Error::NotFound(format!("object '{name}'")))?;
        entry.content_length = content_length;
        Ok(())
    }

    fn get_object_metadata(&self, name: &str) -> Result<Option<ObjectMetadata>> {
        Ok(self.objects.get(name).cloned())
    }

    fn delete_object_chunks(&mut self, name: &str) -> Result<Vec<ChunkKey>> {
        match self.objects.remove(name) {
            Some(meta) => Ok(self.release_edges(&meta.chunks)),
            None => Ok(Vec::new()),
        }
    }

    fn list_objects(&self) -> Result<Vec<String>> {
        Ok(self.objects.keys().cloned().collect())
    }

    fn index_stats(&self) -> Result<IndexStats> {
        let object_count = self.objects.len() as u64;
        let chunk_count = self.chunks.len() as u64;
        let logical_bytes = self
            .objects
            .values()
            .flat_map(|o| o.chunks.iter())
            .map(|e| e.length as u64)
            .sum();
        let physical_bytes = self.chunks.values().map(|c| c.length as u64).sum();
        Ok(IndexStats {
            object_count,
            chunk_count,
            logical_bytes,
            physical_bytes,
        })
    }

    fn backup(&self, _dest: &Path) -> Result<()> {
        Err(Error::InvalidArgument(
            "the in-memory index store has nothing durable to back up".to_string(),
        ))
    }
}

/// A cloneable handle to one container's store, shared so that
/// `PoolIndexStore::open_container` (which only borrows `&self`) can still
/// hand out something that implements `IndexStore`.
#[derive(Clone)]
struct MemoryContainerHandle(Arc<Mutex<MemoryIndexStore>>);

impl IndexStore for MemoryContainerHandle {
    fn get_config(&self) -> Result<ChunkerConfig> {
        self.0.lock().unwrap().get_config()
    }

    fn object_exists(&self, name: &str) -> Result<bool> {
        self.0.lock().unwrap().object_exists(name)
    }

    fn chunk_exists(&self, key: &ChunkKey) -> Result<bool> {
        self.0.lock().unwrap().chunk_exists(key)
    }

    fn add_object_chunks(
        &mut self,
        name: &str,
        content_length: u64,
        chunks: &[ChunkSpan],
        replace: bool,
    ) -> Result<()> {
        self.0
            .lock()
            .unwrap()
            .add_object_chunks(name, content_length, chunks, replace)
    }

    fn add_object_chunk(&mut self, name: &str, chunk: ChunkSpan) -> Result<()> {
        self.0.lock().unwrap().add_object_chunk(name, chunk)
    }

    fn finalize_object(&mut self, name: &str, content_length: u64) -> Result<()> {
        self.0.lock().unwrap().finalize_object(name, content_length)
    }

    fn get_object_metadata(&self, name: &str) -> Result<Option<ObjectMetadata>> {
        self.0.lock().unwrap().get_object_metadata(name)
    }

    fn delete_object_chunks(&mut self, name: &str) -> Result<Vec<ChunkKey>> {
        self.0.lock().unwrap().delete_object_chunks(name)
    }

    fn list_objects(&self) -> Result<Vec<String>> {
        self.0.lock().unwrap().list_objects()
    }

    fn index_stats(&self) -> Result<IndexStats> {
        self.0.lock().unwrap().index_stats()
    }

    fn backup(&self, dest: &Path) -> Result<()> {
        self.0.lock().unwrap().backup(dest)
    }
}

/// In-memory pool index: a set of named, independent [`MemoryIndexStore`]s.
pub struct MemoryPoolIndexStore {
    config: ChunkerConfig,
    containers: HashMap<String, Arc<Mutex<MemoryIndexStore>>>,
}

impl MemoryPoolIndexStore {
    pub fn new(config: ChunkerConfig) -> Self {
        MemoryPoolIndexStore {
            config,
            containers: HashMap::new(),
        }
    }
}

impl PoolIndexStore for MemoryPoolIndexStore {
    fn get_config(&self) -> Result<ChunkerConfig> {
        Ok(self.config)
    }

    fn add_container(&mut self, name: &str) -> Result<()> {
        if self.containers.contains_key(name) {
            return Err(Error::Conflict(format!("container '{name}' already exists")));
        }
        self.containers.insert(
            name.to_string(),
            Arc::new(Mutex::new(MemoryIndexStore::new(self.config))),
        );
        Ok(())
    }

    fn remove_container(&mut self, name: &str) -> Result<()> {
        self.containers
            .remove(name)
            .ok_or_else(|| Error::NotFound(format!("container '{name}'")))?;
        Ok(())
    }

    fn container_exists(&self, name: &str) -> Result<bool> {
        Ok(self.containers.contains_key(name))
    }

    fn list_containers(&self) -> Result<Vec<String>> {
        Ok(self.containers.keys().cloned().collect())
    }

    fn open_container(&self, name: &str) -> Result<Box<dyn IndexStore>> {
        let store = self
            .containers
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("container '{name}'")))?;
        Ok(Box::new(MemoryContainerHandle(Arc::clone(store))))
    }

    fn backup(&self, _dest: &Path) -> Result<()> {
        Err(Error::InvalidArgument(
            "the in-memory pool index store has nothing durable to back up".to_string(),
        ))
    }

    fn import_container_index(&mut self, _name: &str, _source: &Path, _increment_refcount: bool) -> Result<()> {
        Err(Error::InvalidArgument(
            "import is only meaningful for durable index stores".to_string(),
        ))
    }

    fn backup_container_index(
        &self,
        _name: &str,
        _dest: &Path,
        _new_name: Option<&str>,
        _increment_refcount: bool,
    ) -> Result<()> {
        Err(Error::InvalidArgument(
            "the in-memory pool index store has nothing durable to back up".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::ChunkKey;

    fn cfg() -> ChunkerConfig {
        ChunkerConfig::new(128, 1024, 64, 2, false).unwrap()
    }

    fn span(data: &[u8], position: u64, ordinal: u32) -> ChunkSpan {
        ChunkSpan {
            key: ChunkKey::of(data),
            position,
            length: data.len() as u32,
            ordinal,
        }
    }

    #[test]
    fn add_then_retrieve_object() {
        let mut store = MemoryIndexStore::new(cfg());
        let chunks = vec![span(b"aaaa", 0, 0), span(b"bbbb", 4, 1)];
        store.add_object_chunks("obj", 8, &chunks, false).unwrap();

        let meta = store.get_object_metadata("obj").unwrap().unwrap();
        assert_eq!(meta.content_length, 8);
        assert_eq!(meta.chunks.len(), 2);
    }

    #[test]
    fn duplicate_create_without_replace_conflicts() {
        let mut store = MemoryIndexStore::new(cfg());
        let chunks = vec![span(b"aaaa", 0, 0)];
        store.add_object_chunks("obj", 4, &chunks, false).unwrap();
        let result = store.add_object_chunks("obj", 4, &chunks, false);
        assert!(matches!(result, Err(Error::Conflict(_))));
    }

    #[test]
    fn shared_chunk_refcount_tracks_object_count() {
        let mut store = MemoryIndexStore::new(cfg());
        let shared = span(b"shared-bytes", 0, 0);
        store.add_object_chunks("a", 12, &[shared], false).unwrap();
        store.add_object_chunks("b", 12, &[shared], false).unwrap();

        assert!(store.chunk_exists(&shared.key).unwrap());

        let zeroed = store.delete_object_chunks("a").unwrap();
        assert!(zeroed.is_empty(), "chunk still referenced by 'b'");
        assert!(store.chunk_exists(&shared.key).unwrap());

        let zeroed = store.delete_object_chunks("b").unwrap();
        assert_eq!(zeroed, vec![shared.key]);
        assert!(!store.chunk_exists(&shared.key).unwrap());
    }

    #[test]
    fn delete_missing_object_is_idempotent() {
        let mut store = MemoryIndexStore::new(cfg());
        assert_eq!(store.delete_object_chunks("missing").unwrap(), Vec::new());
    }

    #[test]
    fn streaming_add_then_finalize() {
        let mut store = MemoryIndexStore::new(cfg());
        store.add_object_chunk("obj", span(b"part1", 0, 0)).unwrap();
        store.add_object_chunk("obj", span(b"part2", 5, 1)).unwrap();
        store.finalize_object("obj", 10).unwrap();

        let meta = store.get_object_metadata("obj").unwrap().unwrap();
        assert_eq!(meta.content_length, 10);
        assert_eq!(meta.chunks.len(), 2);
    }

    #[test]
    fn index_stats_reflect_dedup() {
        let mut store = MemoryIndexStore::new(cfg());
        let shared = span(b"shared-bytes", 0, 0);
        store.add_object_chunks("a", 12, &[shared], false).unwrap();
        store.add_object_chunks("b", 12, &[shared], false).unwrap();

        let stats = store.index_stats().unwrap();
        assert_eq!(stats.object_count, 2);
        assert_eq!(stats.chunk_count, 1);
        assert_eq!(stats.logical_bytes, 24);
        assert_eq!(stats.physical_bytes, 12);
        assert_eq!(stats.dedup_ratio(), 2.0);
    }

    #[test]
    fn pool_container_is_independent_of_flat_objects() {
        let mut pool = MemoryPoolIndexStore::new(cfg());
        pool.add_container("alpha").unwrap();
        pool.add_container("beta").unwrap();

        {
            let mut alpha = pool.open_container("alpha").unwrap();
            alpha
                .add_object_chunks("obj", 4, &[span(b"aaaa", 0, 0)], false)
                .unwrap();
        }

        assert!(pool.open_container("alpha").unwrap().object_exists("obj").unwrap());
        assert!(!pool.open_container("beta").unwrap().object_exists("obj").unwrap());
    }

    #[test]
    fn open_unknown_container_is_not_found() {
        let pool = MemoryPoolIndexStore::new(cfg());
        assert!(matches!(pool.open_container("nope"), Err(Error::NotFound(_))));
    }
}
