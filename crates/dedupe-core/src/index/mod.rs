// dedupe-core — index store abstraction
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

//! The index is the only piece of this library that is persisted and
//! authoritative. It records, per object, the ordered sequence of chunk
//! edges that reconstruct it, and, per chunk key, a reference count of how
//! many object edges currently point at it.
//!
//! Two shapes share one trait. A flat index has one `IndexStore` for the
//! whole set of objects. A pool index additionally tracks named containers,
//! each of which owns its own, independent `IndexStore`.

pub mod memory;
pub mod sqlite;

use crate::chunker::ChunkSpan;
use crate::config::ChunkerConfig;
use crate::error::Result;
use crate::hash::ChunkKey;
use std::path::Path;

/// One edge in an object's chunk sequence, as recorded in the index (not to
/// be confused with [`ChunkSpan`], which additionally carries the position
/// within the object that produced it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectChunkEdge {
    pub key: ChunkKey,
    pub ordinal: u32,
    pub length: u32,
}

impl From<ChunkSpan> for ObjectChunkEdge {
    fn from(span: ChunkSpan) -> Self {
        ObjectChunkEdge {
            key: span.key,
            ordinal: span.ordinal,
            length: span.length,
        }
    }
}

/// An object's full metadata: its name, total byte length, and ordered chunk
/// sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub name: String,
    pub content_length: u64,
    pub chunks: Vec<ObjectChunkEdge>,
}

/// Aggregate counts for an index: how many objects and distinct chunks it
/// holds, and the logical vs. physical byte totals those chunks represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexStats {
    pub object_count: u64,
    pub chunk_count: u64,
    /// Sum of chunk lengths across all object edges (bytes that would be
    /// written if nothing were deduplicated).
    pub logical_bytes: u64,
    /// Sum of chunk lengths across distinct chunk keys only.
    pub physical_bytes: u64,
}

impl IndexStats {
    /// Logical bytes divided by physical bytes; 1.0 when nothing has been
    /// deduplicated, growing as more content is shared.
    pub fn dedup_ratio(&self) -> f64 {
        if self.physical_bytes == 0 {
            1.0
        } else {
            self.logical_bytes as f64 / self.physical_bytes as f64
        }
    }
}

/// The persisted state machine for one index (a flat index, or a single
/// container's index in pool mode).
///
/// All mutating methods are called with the library's `chunk_lock` held, so
/// implementations need no internal synchronization of their own.
pub trait IndexStore: Send {
    /// The chunking configuration this index was created with. Fixed for the
    /// lifetime of the index.
    fn get_config(&self) -> Result<ChunkerConfig>;

    /// Whether an object with this name is recorded.
    fn object_exists(&self, name: &str) -> Result<bool>;

    /// Whether any object edge currently references this chunk key.
    fn chunk_exists(&self, key: &ChunkKey) -> Result<bool>;

    /// Atomically record a complete object: creates (or replaces, if
    /// `replace` is true and the object already exists) the object row and
    /// every chunk edge, creating or incrementing each referenced chunk's
    /// refcount. All-or-nothing: on error, no partial state is left behind.
    fn add_object_chunks(
        &mut self,
        name: &str,
        content_length: u64,
        chunks: &[ChunkSpan],
        replace: bool,
    ) -> Result<()>;

    /// Append a single chunk edge to an in-progress streamed write, creating
    /// the object row on the first call. The object's `content_length` is
    /// not final until [`IndexStore::finalize_object`] is called.
    fn add_object_chunk(&mut self, name: &str, chunk: ChunkSpan) -> Result<()>;

    /// Mark an in-progress streamed write complete by recording its final
    /// byte length.
    fn finalize_object(&mut self, name: &str, content_length: u64) -> Result<()>;

    /// Full metadata for an object, or `None` if it does not exist.
    fn get_object_metadata(&self, name: &str) -> Result<Option<ObjectMetadata>>;

    /// Remove an object's row and every chunk edge it owned, decrementing
    /// each referenced chunk's refcount (removing the chunk row entirely
    /// once its refcount reaches zero). Returns the keys of chunks whose
    /// refcount reached zero — the caller is responsible for deleting their
    /// bytes from external storage. Idempotent: deleting an object that does
    /// not exist returns an empty list rather than an error.
    fn delete_object_chunks(&mut self, name: &str) -> Result<Vec<ChunkKey>>;

    /// All object names currently recorded, in no particular order.
    fn list_objects(&self) -> Result<Vec<String>>;

    /// Aggregate counts over the whole index.
    fn index_stats(&self) -> Result<IndexStats>;

    /// Write a consistent copy of the index to `dest`.
    fn backup(&self, dest: &Path) -> Result<()>;
}

/// The top-level store in pool mode: tracks named containers, each backed by
/// its own [`IndexStore`].
pub trait PoolIndexStore: Send {
    fn get_config(&self) -> Result<ChunkerConfig>;

    /// Create a new, empty container with its own index.
    fn add_container(&mut self, name: &str) -> Result<()>;

    /// Permanently remove a container. Callers must have already emptied it
    /// of objects (see the library façade's container-delete protocol);
    /// this only removes the now-empty container's row.
    fn remove_container(&mut self, name: &str) -> Result<()>;

    /// Whether a container with this name exists.
    fn container_exists(&self, name: &str) -> Result<bool>;

    /// All container names.
    fn list_containers(&self) -> Result<Vec<String>>;

    /// Open a container's own index for read/write access.
    fn open_container(&self, name: &str) -> Result<Box<dyn IndexStore>>;

    /// Write a consistent copy of the pool index (container list only, not
    /// their contents) to `dest`.
    fn backup(&self, dest: &Path) -> Result<()>;

    /// Copy a complete container index (including its objects and chunks)
    /// from an external location into this pool under the given name. If a
    /// container of that name already exists, the source's objects are
    /// merged into it one at a time instead of a raw file copy (an object
    /// name collision between the two is an error — containers dedup
    /// independently by design, so automatic content merging across two
    /// objects of the same name is not attempted). `increment_refcount`
    /// controls how the merge treats chunk keys the target already holds:
    /// `true` bumps their refcount as a normal write would, `false` leaves
    /// them untouched (new keys are still inserted at refcount 1 either
    /// way).
    fn import_container_index(&mut self, name: &str, source: &Path, increment_refcount: bool) -> Result<()>;

    /// Write a consistent copy of a single container's index to `dest`. When
    /// `new_name` is given, the backup is additionally registered (or
    /// merged, under the same rules as
    /// [`PoolIndexStore::import_container_index`]) as a container under that
    /// name in this pool — a clone-with-a-new-name operation built on top of
    /// the backup just written. `increment_refcount` is passed through to
    /// that merge and ignored when `new_name` is `None`.
    fn backup_container_index(
        &self,
        name: &str,
        dest: &Path,
        new_name: Option<&str>,
        increment_refcount: bool,
    ) -> Result<()>;
}
