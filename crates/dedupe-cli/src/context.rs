// dedupe-cli — shared CLI context: opening indexes and chunk stores
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

use anyhow::{Context, Result};
use dedupe_core::index::sqlite::{SqliteIndexStore, SqlitePoolIndexStore};
use dedupe_core::{ChunkerConfig, Library};
use dedupe_storage::FileChunkStore;
use std::path::{Path, PathBuf};

/// Global, shared CLI options every subcommand needs to reach the index and
/// the chunk bytes.
#[derive(clap::Args, Debug, Clone)]
pub struct Target {
    /// Directory holding chunk bytes (created if missing).
    #[arg(long, global = true, value_name = "DIR")]
    pub chunks: PathBuf,

    /// Path to the index file (a pool registry in `--pool` mode).
    #[arg(long, global = true, value_name = "PATH", default_value = "dedupe-index.sqlite3")]
    pub index: PathBuf,

    /// Use the pool+container index shape instead of a flat index.
    #[arg(long, global = true)]
    pub pool: bool,

    /// Container name (pool mode only; required by object-level commands).
    #[arg(long, global = true, value_name = "NAME")]
    pub container: Option<String>,
}

impl Target {
    pub fn open_chunk_store(&self) -> Result<FileChunkStore> {
        FileChunkStore::new(&self.chunks)
            .with_context(|| format!("opening chunk directory {}", self.chunks.display()))
    }

    pub fn open_library(&self) -> Result<Library> {
        if self.pool {
            let container_dir = self.pool_container_dir();
            let store = SqlitePoolIndexStore::open(&self.index, container_dir)
                .with_context(|| format!("opening pool index {}", self.index.display()))?;
            Ok(Library::new_pool(Box::new(store)))
        } else {
            let store = SqliteIndexStore::open(&self.index)
                .with_context(|| format!("opening index {}", self.index.display()))?;
            Ok(Library::new_flat(Box::new(store)))
        }
    }

    pub fn create_library(&self, config: ChunkerConfig) -> Result<Library> {
        if self.pool {
            let container_dir = self.pool_container_dir();
            let store = SqlitePoolIndexStore::create(&self.index, container_dir, config)
                .with_context(|| format!("creating pool index {}", self.index.display()))?;
            Ok(Library::new_pool(Box::new(store)))
        } else {
            let store = SqliteIndexStore::create(&self.index, config)
                .with_context(|| format!("creating index {}", self.index.display()))?;
            Ok(Library::new_flat(Box::new(store)))
        }
    }

    /// Container to operate object-level commands against. Pool mode
    /// requires `--container`; flat mode must not be given one.
    pub fn require_container(&self) -> Result<Option<&str>> {
        match (self.pool, &self.container) {
            (true, Some(name)) => Ok(Some(name.as_str())),
            (true, None) => anyhow::bail!("--pool mode requires --container <NAME> for this command"),
            (false, None) => Ok(None),
            (false, Some(_)) => anyhow::bail!("--container is only meaningful with --pool"),
        }
    }

    fn pool_container_dir(&self) -> PathBuf {
        let parent = self.index.parent().unwrap_or_else(|| Path::new("."));
        let stem = self.index.file_stem().and_then(|s| s.to_str()).unwrap_or("pool");
        parent.join(format!("{stem}-containers"))
    }
}
