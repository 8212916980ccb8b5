// dedupe-core — content-defined chunking and dedup index
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

//! Embedded content-addressed deduplication.
//!
//! An object's bytes are split into content-defined chunks ([`chunker`]),
//! each chunk is addressed by the SHA-256 of its bytes ([`hash`]), and a
//! reference-counted index ([`index`]) records which chunks each object is
//! built from so that bytes shared between objects are stored once. The
//! [`library`] module ties these together into the façade applications use:
//! [`library::Library`].
//!
//! This crate owns the indexing decisions only. It never reads or writes
//! chunk bytes itself — callers supply a [`dedupe_storage::ChunkStore`] that
//! does, so the chunk bytes can live anywhere (local disk, object storage, a
//! database blob column).

pub mod chunker;
pub mod config;
pub mod error;
pub mod hash;
pub mod index;
pub mod library;
pub mod window;

pub use chunker::{chunk_buffer, chunk_stream, ChunkSpan, ChunkingOutcome};
pub use config::ChunkerConfig;
pub use dedupe_storage::ChunkStore;
pub use error::{Error, Result};
pub use hash::ChunkKey;
pub use index::{IndexStats, IndexStore, ObjectChunkEdge, ObjectMetadata, PoolIndexStore};
pub use library::{Library, VerifyReport};
pub use window::{BufferWindowSource, StreamWindowSource, WindowSource};
