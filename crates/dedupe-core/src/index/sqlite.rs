// dedupe-core — SQLite-backed durable index store
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

//! An embedded SQLite database, one per index (flat mode) or one per pool
//! plus one per container (pool mode), implementing the relational schema
//! the data model describes: `config`, `objects`, `object_map`, `chunks`,
//! and, for the pool index, `containers`.

use super::{IndexStats, IndexStore, ObjectChunkEdge, ObjectMetadata, PoolIndexStore};
use crate::chunker::ChunkSpan;
use crate::config::ChunkerConfig;
use crate::error::{Error, Result};
use crate::hash::ChunkKey;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS config (
    id INTEGER PRIMARY KEY CHECK (id = 0),
    min_chunk_size INTEGER NOT NULL,
    max_chunk_size INTEGER NOT NULL,
    shift_count INTEGER NOT NULL,
    boundary_check_bytes INTEGER NOT NULL,
    index_per_object INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS objects (
    name TEXT PRIMARY KEY,
    content_length INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS object_map (
    object_name TEXT NOT NULL REFERENCES objects(name) ON DELETE CASCADE,
    ordinal INTEGER NOT NULL,
    chunk_key TEXT NOT NULL,
    length INTEGER NOT NULL,
    PRIMARY KEY (object_name, ordinal)
);
CREATE TABLE IF NOT EXISTS chunks (
    key TEXT PRIMARY KEY,
    length INTEGER NOT NULL,
    refcount INTEGER NOT NULL
);
"#;

fn row_to_config(conn: &Connection) -> Result<ChunkerConfig> {
    conn.query_row(
        "SELECT min_chunk_size, max_chunk_size, shift_count, boundary_check_bytes, index_per_object \
         FROM config WHERE id = 0",
        [],
        |row| {
            Ok(ChunkerConfig {
                min_chunk_size: row.get(0)?,
                max_chunk_size: row.get(1)?,
                shift_count: row.get(2)?,
                boundary_check_bytes: row.get::<_, i64>(3)? as u8,
                index_per_object: row.get::<_, i64>(4)? != 0,
            })
        },
    )
    .map_err(|e| Error::IndexCorruption(format!("missing or malformed config row: {e}")))
}

fn write_config(conn: &Connection, config: &ChunkerConfig) -> Result<()> {
    conn.execute(
        "INSERT INTO config (id, min_chunk_size, max_chunk_size, shift_count, boundary_check_bytes, index_per_object) \
         VALUES (0, ?1, ?2, ?3, ?4, ?5)",
        params![
            config.min_chunk_size,
            config.max_chunk_size,
            config.shift_count,
            config.boundary_check_bytes as i64,
            config.index_per_object as i64,
        ],
    )?;
    Ok(())
}

/// Decrement refcounts for a set of chunk edges within an open transaction,
/// returning the keys whose refcount reached zero (and were removed).
fn release_edges(conn: &Connection, edges: &[(String, u32)]) -> Result<Vec<ChunkKey>> {
    let mut zeroed = Vec::new();
    for (key_str, _length) in edges {
        conn.execute(
            "UPDATE chunks SET refcount = refcount - 1 WHERE key = ?1",
            params![key_str],
        )?;
        let refcount: i64 = conn.query_row(
            "SELECT refcount FROM chunks WHERE key = ?1",
            params![key_str],
            |row| row.get(0),
        )?;
        if refcount <= 0 {
            conn.execute("DELETE FROM chunks WHERE key = ?1", params![key_str])?;
            if let Ok(key) = ChunkKey::from_base64(key_str) {
                zeroed.push(key);
            }
        }
    }
    Ok(zeroed)
}

fn delete_object_locked(conn: &Connection, name: &str) -> Result<Vec<ChunkKey>> {
    let mut stmt = conn.prepare(
        "SELECT chunk_key, length FROM object_map WHERE object_name = ?1 ORDER BY ordinal",
    )?;
    let edges: Vec<(String, u32)> = stmt
        .query_map(params![name], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u32))
        })?
        .collect::<std::result::Result<_, _>>()?;
    drop(stmt);

    if edges.is_empty() && !object_exists_locked(conn, name)? {
        return Ok(Vec::new());
    }

    conn.execute("DELETE FROM object_map WHERE object_name = ?1", params![name])?;
    conn.execute("DELETE FROM objects WHERE name = ?1", params![name])?;
    release_edges(conn, &edges)
}

fn object_exists_locked(conn: &Connection, name: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM objects WHERE name = ?1", params![name], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

/// Insert a complete object's row and chunk edges within an open
/// transaction. Does not check for a pre-existing object of the same name —
/// callers that care (a normal write vs. a container merge) check first.
/// When `bump_refcounts` is false, chunk keys the index already holds are
/// left untouched rather than incremented (used by container merges that
/// opt out of the refcount law for speed).
fn insert_chunks_locked(
    conn: &Connection,
    name: &str,
    content_length: u64,
    chunks: &[ChunkSpan],
    bump_refcounts: bool,
) -> Result<()> {
    conn.execute(
        "INSERT INTO objects (name, content_length) VALUES (?1, ?2)",
        params![name, content_length as i64],
    )?;
    for span in chunks {
        let key_str = span.key.to_base64();
        if bump_refcounts {
            conn.execute(
                "INSERT INTO chunks (key, length, refcount) VALUES (?1, ?2, 1) \
                 ON CONFLICT(key) DO UPDATE SET refcount = refcount + 1",
                params![key_str, span.length as i64],
            )?;
        } else {
            conn.execute(
                "INSERT INTO chunks (key, length, refcount) VALUES (?1, ?2, 1) \
                 ON CONFLICT(key) DO NOTHING",
                params![key_str, span.length as i64],
            )?;
        }
        conn.execute(
            "INSERT INTO object_map (object_name, ordinal, chunk_key, length) VALUES (?1, ?2, ?3, ?4)",
            params![name, span.ordinal as i64, key_str, span.length as i64],
        )?;
    }
    Ok(())
}

/// Reconstruct the `ChunkSpan`s a container's stored edges came from.
/// `ObjectChunkEdge` has no `position` field, so it is rebuilt as the
/// cumulative length of preceding edges in ordinal order; `get_object_metadata`
/// already returns edges sorted that way.
fn edges_to_spans(edges: &[ObjectChunkEdge]) -> Vec<ChunkSpan> {
    let mut position = 0u64;
    edges
        .iter()
        .map(|edge| {
            let span = ChunkSpan {
                key: edge.key,
                position,
                length: edge.length,
                ordinal: edge.ordinal,
            };
            position += edge.length as u64;
            span
        })
        .collect()
}

/// Merge every object in `source` into `target`, one object at a time. An
/// object name already present in `target` is a conflict: containers dedup
/// independently, so colliding object names across two merged containers are
/// not reconciled automatically.
fn merge_containers(target: &mut SqliteIndexStore, source: &SqliteIndexStore, bump_refcounts: bool) -> Result<()> {
    for name in source.list_objects()? {
        let meta = source
            .get_object_metadata(&name)?
            .ok_or_else(|| Error::IndexCorruption(format!("object '{name}' listed but has no metadata")))?;
        if target.object_exists(&name)? {
            return Err(Error::Conflict(format!(
                "cannot merge: object '{name}' already exists in the target container"
            )));
        }
        let spans = edges_to_spans(&meta.chunks);
        target.insert_merged_object(&name, meta.content_length, &spans, bump_refcounts)?;
    }
    Ok(())
}

/// A durable, SQLite-backed index for a flat index or a single container.
pub struct SqliteIndexStore {
    conn: Connection,
    config: ChunkerConfig,
}

impl SqliteIndexStore {
    /// Create a brand-new index at `path`. Fails if a file already exists
    /// there.
    pub fn create(path: &Path, config: ChunkerConfig) -> Result<Self> {
        if path.exists() {
            return Err(Error::InvalidArgument(format!(
                "index already exists at {}",
                path.display()
            )));
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        write_config(&conn, &config)?;
        Ok(SqliteIndexStore { conn, config })
    }

    /// Open an existing index at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let config = row_to_config(&conn)?;
        Ok(SqliteIndexStore { conn, config })
    }

    /// Insert one merged-in object. Only used by container merges
    /// ([`merge_containers`]); a name collision is always a conflict here,
    /// since merging never replaces.
    fn insert_merged_object(
        &mut self,
        name: &str,
        content_length: u64,
        chunks: &[ChunkSpan],
        bump_refcounts: bool,
    ) -> Result<()> {
        let tx = self.conn.transaction()?;
        if object_exists_locked(&tx, name)? {
            return Err(Error::Conflict(format!("object '{name}' already exists")));
        }
        insert_chunks_locked(&tx, name, content_length, chunks, bump_refcounts)?;
        tx.commit()?;
        Ok(())
    }
}

impl IndexStore for SqliteIndexStore {
    fn get_config(&self) -> Result<ChunkerConfig> {
        Ok(self.config)
    }

    fn object_exists(&self, name: &str) -> Result<bool> {
        object_exists_locked(&self.conn, name)
    }

    fn chunk_exists(&self, key: &ChunkKey) -> Result<bool> {
        let key_str = key.to_base64();
        let found: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM chunks WHERE key = ?1", params![key_str], |row| row.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    fn add_object_chunks(
        &mut self,
        name: &str,
        content_length: u64,
        chunks: &[ChunkSpan],
        replace: bool,
    ) -> Result<()> {
        let tx = self.conn.transaction()?;

        if object_exists_locked(&tx, name)? {
            if !replace {
                return Err(Error::Conflict(format!("object '{name}' already exists")));
            }
            delete_object_locked(&tx, name)?;
        }

        insert_chunks_locked(&tx, name, content_length, chunks, true)?;

        tx.commit()?;
        Ok(())
    }

    fn add_object_chunk(&mut self, name: &str, chunk: ChunkSpan) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT OR IGNORE INTO objects (name, content_length) VALUES (?1, 0)",
            params![name],
        )?;
        let key_str = chunk.key.to_base64();
        tx.execute(
            "INSERT INTO chunks (key, length, refcount) VALUES (?1, ?2, 1) \
             ON CONFLICT(key) DO UPDATE SET refcount = refcount + 1",
            params![key_str, chunk.length as i64],
        )?;
        tx.execute(
            "INSERT INTO object_map (object_name, ordinal, chunk_key, length) VALUES (?1, ?2, ?3, ?4)",
            params![name, chunk.ordinal as i64, key_str, chunk.length as i64],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn finalize_object(&mut self, name: &str, content_length: u64) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE objects SET content_length = ?2 WHERE name = ?1",
            params![name, content_length as i64],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("object '{name}'")));
        }
        Ok(())
    }

    fn get_object_metadata(&self, name: &str) -> Result<Option<ObjectMetadata>> {
        let content_length: Option<i64> = self
            .conn
            .query_row(
                "SELECT content_length FROM objects WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        let Some(content_length) = content_length else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            "SELECT chunk_key, ordinal, length FROM object_map WHERE object_name = ?1 ORDER BY ordinal",
        )?;
        let chunks: Vec<ObjectChunkEdge> = stmt
            .query_map(params![name], |row| {
                let key_str: String = row.get(0)?;
                let ordinal: i64 = row.get(1)?;
                let length: i64 = row.get(2)?;
                Ok((key_str, ordinal as u32, length as u32))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?
            .into_iter()
            .map(|(key_str, ordinal, length)| {
                let key = ChunkKey::from_base64(&key_str)
                    .map_err(|_| Error::IndexCorruption(format!("bad chunk key '{key_str}'")))?;
                Ok(ObjectChunkEdge { key, ordinal, length })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(ObjectMetadata {
            name: name.to_string(),
            content_length: content_length as u64,
            chunks,
        }))
    }

    fn delete_object_chunks(&mut self, name: &str) -> Result<Vec<ChunkKey>> {
        let tx = self.conn.transaction()?;
        let zeroed = delete_object_locked(&tx, name)?;
        tx.commit()?;
        Ok(zeroed)
    }

    fn list_objects(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT name FROM objects")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(names)
    }

    fn index_stats(&self) -> Result<IndexStats> {
        let object_count: i64 = self.conn.query_row("SELECT COUNT(*) FROM objects", [], |row| row.get(0))?;
        let chunk_count: i64 = self.conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        let logical_bytes: i64 =
            self.conn
                .query_row("SELECT COALESCE(SUM(length), 0) FROM object_map", [], |row| row.get(0))?;
        let physical_bytes: i64 =
            self.conn
                .query_row("SELECT COALESCE(SUM(length), 0) FROM chunks", [], |row| row.get(0))?;
        Ok(IndexStats {
            object_count: object_count as u64,
            chunk_count: chunk_count as u64,
            logical_bytes: logical_bytes as u64,
            physical_bytes: physical_bytes as u64,
        })
    }

    fn backup(&self, dest: &Path) -> Result<()> {
        let dest_str = dest
            .to_str()
            .ok_or_else(|| Error::InvalidArgument("backup destination path is not valid UTF-8".to_string()))?;
        self.conn.execute("VACUUM INTO ?1", params![dest_str])?;
        Ok(())
    }
}

const POOL_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS config (
    id INTEGER PRIMARY KEY CHECK (id = 0),
    min_chunk_size INTEGER NOT NULL,
    max_chunk_size INTEGER NOT NULL,
    shift_count INTEGER NOT NULL,
    boundary_check_bytes INTEGER NOT NULL,
    index_per_object INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS containers (
    name TEXT PRIMARY KEY,
    index_location TEXT NOT NULL
);
"#;

/// The pool-mode top-level index: tracks named containers and where each
/// container's own SQLite file lives on disk.
pub struct SqlitePoolIndexStore {
    conn: Connection,
    config: ChunkerConfig,
    /// Directory new container files are created in.
    container_dir: PathBuf,
}

impl SqlitePoolIndexStore {
    pub fn create(path: &Path, container_dir: PathBuf, config: ChunkerConfig) -> Result<Self> {
        if path.exists() {
            return Err(Error::InvalidArgument(format!(
                "pool index already exists at {}",
                path.display()
            )));
        }
        std::fs::create_dir_all(&container_dir)?;
        let conn = Connection::open(path)?;
        conn.execute_batch(POOL_SCHEMA)?;
        write_config(&conn, &config)?;
        Ok(SqlitePoolIndexStore {
            conn,
            config,
            container_dir,
        })
    }

    pub fn open(path: &Path, container_dir: PathBuf) -> Result<Self> {
        let conn = Connection::open(path)?;
        let config = row_to_config(&conn)?;
        Ok(SqlitePoolIndexStore {
            conn,
            config,
            container_dir,
        })
    }

    fn container_location(&self, name: &str) -> Result<PathBuf> {
        let location: Option<String> = self
            .conn
            .query_row(
                "SELECT index_location FROM containers WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        location
            .map(PathBuf::from)
            .ok_or_else(|| Error::NotFound(format!("container '{name}'")))
    }
}

impl PoolIndexStore for SqlitePoolIndexStore {
    fn get_config(&self) -> Result<ChunkerConfig> {
        Ok(self.config)
    }

    fn add_container(&mut self, name: &str) -> Result<()> {
        let exists: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM containers WHERE name = ?1", params![name], |row| row.get(0))
            .optional()?;
        if exists.is_some() {
            return Err(Error::Conflict(format!("container '{name}' already exists")));
        }

        let location = self.container_dir.join(format!("{name}.sqlite3"));
        SqliteIndexStore::create(&location, self.config)?;

        self.conn.execute(
            "INSERT INTO containers (name, index_location) VALUES (?1, ?2)",
            params![name, location.to_string_lossy()],
        )?;
        Ok(())
    }

    fn remove_container(&mut self, name: &str) -> Result<()> {
        let location = self.container_location(name)?;
        self.conn.execute("DELETE FROM containers WHERE name = ?1", params![name])?;
        let _ = std::fs::remove_file(location);
        Ok(())
    }

    fn container_exists(&self, name: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM containers WHERE name = ?1", params![name], |row| row.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    fn list_containers(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT name FROM containers")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(names)
    }

    fn open_container(&self, name: &str) -> Result<Box<dyn IndexStore>> {
        let location = self.container_location(name)?;
        Ok(Box::new(SqliteIndexStore::open(&location)?))
    }

    fn backup(&self, dest: &Path) -> Result<()> {
        let dest_str = dest
            .to_str()
            .ok_or_else(|| Error::InvalidArgument("backup destination path is not valid UTF-8".to_string()))?;
        self.conn.execute("VACUUM INTO ?1", params![dest_str])?;
        Ok(())
    }

    fn import_container_index(&mut self, name: &str, source: &Path, increment_refcount: bool) -> Result<()> {
        let imported = SqliteIndexStore::open(source)?;
        let imported_config = imported.get_config()?;
        if imported_config != self.config {
            return Err(Error::InvalidArgument(format!(
                "imported container '{name}' has a config that does not match this pool"
            )));
        }

        if self.container_exists(name)? {
            let location = self.container_location(name)?;
            let mut target = SqliteIndexStore::open(&location)?;
            return merge_containers(&mut target, &imported, increment_refcount);
        }

        drop(imported);
        let location = self.container_dir.join(format!("{name}.sqlite3"));
        std::fs::copy(source, &location)?;
        self.conn.execute(
            "INSERT INTO containers (name, index_location) VALUES (?1, ?2)",
            params![name, location.to_string_lossy()],
        )?;
        Ok(())
    }

    fn backup_container_index(
        &self,
        name: &str,
        dest: &Path,
        new_name: Option<&str>,
        increment_refcount: bool,
    ) -> Result<()> {
        let location = self.container_location(name)?;
        let store = SqliteIndexStore::open(&location)?;
        store.backup(dest)?;

        let Some(new_name) = new_name else {
            return Ok(());
        };

        if self.container_exists(new_name)? {
            let target_location = self.container_location(new_name)?;
            let mut target = SqliteIndexStore::open(&target_location)?;
            return merge_containers(&mut target, &store, increment_refcount);
        }

        let target_location = self.container_dir.join(format!("{new_name}.sqlite3"));
        std::fs::copy(dest, &target_location)?;
        self.conn.execute(
            "INSERT INTO containers (name, index_location) VALUES (?1, ?2)",
            params![new_name, target_location.to_string_lossy()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::ChunkKey;
    use tempfile::tempdir;

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
    fn create_then_open_round_trips_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.sqlite3");
        SqliteIndexStore::create(&path, cfg()).unwrap();

        let reopened = SqliteIndexStore::open(&path).unwrap();
        assert_eq!(reopened.get_config().unwrap(), cfg());
    }

    #[test]
    fn create_refuses_existing_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.sqlite3");
        SqliteIndexStore::create(&path, cfg()).unwrap();
        assert!(SqliteIndexStore::create(&path, cfg()).is_err());
    }

    #[test]
    fn add_object_then_read_metadata() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.sqlite3");
        let mut store = SqliteIndexStore::create(&path, cfg()).unwrap();

        let chunks = vec![span(b"aaaa", 0, 0), span(b"bbbb", 4, 1)];
        store.add_object_chunks("obj", 8, &chunks, false).unwrap();

        let meta = store.get_object_metadata("obj").unwrap().unwrap();
        assert_eq!(meta.content_length, 8);
        assert_eq!(meta.chunks.len(), 2);
        assert_eq!(meta.chunks[0].ordinal, 0);
        assert_eq!(meta.chunks[1].ordinal, 1);
    }

    #[test]
    fn refcount_law_holds_across_delete() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.sqlite3");
        let mut store = SqliteIndexStore::create(&path, cfg()).unwrap();

        let shared = span(b"shared-bytes", 0, 0);
        store.add_object_chunks("a", 12, &[shared], false).unwrap();
        store.add_object_chunks("b", 12, &[shared], false).unwrap();

        let zeroed = store.delete_object_chunks("a").unwrap();
        assert!(zeroed.is_empty());
        assert!(store.chunk_exists(&shared.key).unwrap());

        let zeroed = store.delete_object_chunks("b").unwrap();
        assert_eq!(zeroed, vec![shared.key]);
        assert!(!store.chunk_exists(&shared.key).unwrap());
    }

    #[test]
    fn conflict_without_replace() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.sqlite3");
        let mut store = SqliteIndexStore::create(&path, cfg()).unwrap();

        let chunks = vec![span(b"aaaa", 0, 0)];
        store.add_object_chunks("obj", 4, &chunks, false).unwrap();
        assert!(matches!(
            store.add_object_chunks("obj", 4, &chunks, false),
            Err(Error::Conflict(_))
        ));
    }

    #[test]
    fn replace_compensates_prior_refcounts_exactly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.sqlite3");
        let mut store = SqliteIndexStore::create(&path, cfg()).unwrap();

        let first = span(b"first-version", 0, 0);
        let second = span(b"second-version", 0, 0);
        store.add_object_chunks("obj", first.length as u64, &[first], false).unwrap();
        store
            .add_object_chunks("obj", second.length as u64, &[second], true)
            .unwrap();

        assert!(!store.chunk_exists(&first.key).unwrap());
        assert!(store.chunk_exists(&second.key).unwrap());
    }

    #[test]
    fn pool_container_round_trip() {
        let dir = tempdir().unwrap();
        let pool_path = dir.path().join("pool.sqlite3");
        let container_dir = dir.path().join("containers");
        let mut pool = SqlitePoolIndexStore::create(&pool_path, container_dir, cfg()).unwrap();

        pool.add_container("alpha").unwrap();
        assert!(pool.container_exists("alpha").unwrap());

        let mut alpha = pool.open_container("alpha").unwrap();
        alpha
            .add_object_chunks("obj", 4, &[span(b"aaaa", 0, 0)], false)
            .unwrap();
        assert!(alpha.object_exists("obj").unwrap());
    }

    #[test]
    fn import_into_new_name_is_a_fresh_copy() {
        let dir = tempdir().unwrap();
        let pool_path = dir.path().join("pool.sqlite3");
        let container_dir = dir.path().join("containers");
        let mut pool = SqlitePoolIndexStore::create(&pool_path, container_dir, cfg()).unwrap();

        let source_path = dir.path().join("external.sqlite3");
        let mut source = SqliteIndexStore::create(&source_path, cfg()).unwrap();
        source
            .add_object_chunks("obj", 4, &[span(b"aaaa", 0, 0)], false)
            .unwrap();

        pool.import_container_index("alpha", &source_path, true).unwrap();
        let alpha = pool.open_container("alpha").unwrap();
        assert!(alpha.object_exists("obj").unwrap());
    }

    #[test]
    fn import_into_existing_container_merges_objects() {
        let dir = tempdir().unwrap();
        let pool_path = dir.path().join("pool.sqlite3");
        let container_dir = dir.path().join("containers");
        let mut pool = SqlitePoolIndexStore::create(&pool_path, container_dir, cfg()).unwrap();
        pool.add_container("alpha").unwrap();
        {
            let mut alpha = pool.open_container("alpha").unwrap();
            alpha
                .add_object_chunks("shared-owner", 12, &[span(b"shared-bytes", 0, 0)], false)
                .unwrap();
        }

        let source_path = dir.path().join("external.sqlite3");
        let mut source = SqliteIndexStore::create(&source_path, cfg()).unwrap();
        source
            .add_object_chunks("from-source", 12, &[span(b"shared-bytes", 0, 0)], false)
            .unwrap();

        pool.import_container_index("alpha", &source_path, true).unwrap();

        let alpha = pool.open_container("alpha").unwrap();
        assert!(alpha.object_exists("shared-owner").unwrap());
        assert!(alpha.object_exists("from-source").unwrap());
        let meta = alpha.get_object_metadata("from-source").unwrap().unwrap();
        assert_eq!(meta.chunks[0].length, 12);
    }

    #[test]
    fn import_without_increment_refcount_leaves_existing_refcount_untouched() {
        let dir = tempdir().unwrap();
        let pool_path = dir.path().join("pool.sqlite3");
        let container_dir = dir.path().join("containers");
        let mut pool = SqlitePoolIndexStore::create(&pool_path, container_dir, cfg()).unwrap();
        pool.add_container("alpha").unwrap();
        let shared = span(b"shared-bytes", 0, 0);
        {
            let mut alpha = pool.open_container("alpha").unwrap();
            alpha.add_object_chunks("owner", 12, &[shared], false).unwrap();
        }

        let source_path = dir.path().join("external.sqlite3");
        let mut source = SqliteIndexStore::create(&source_path, cfg()).unwrap();
        source.add_object_chunks("other", 12, &[shared], false).unwrap();

        pool.import_container_index("alpha", &source_path, false).unwrap();

        // With increment_refcount = false, deleting the pre-existing owner
        // must not zero a refcount that the merged-in edge also depends on.
        let mut alpha = pool.open_container("alpha").unwrap();
        let zeroed = alpha.delete_object_chunks("owner").unwrap();
        assert!(zeroed.is_empty(), "merge-without-bump orphaned the shared chunk");
    }

    #[test]
    fn import_rejects_colliding_object_name() {
        let dir = tempdir().unwrap();
        let pool_path = dir.path().join("pool.sqlite3");
        let container_dir = dir.path().join("containers");
        let mut pool = SqlitePoolIndexStore::create(&pool_path, container_dir, cfg()).unwrap();
        pool.add_container("alpha").unwrap();
        {
            let mut alpha = pool.open_container("alpha").unwrap();
            alpha
                .add_object_chunks("obj", 4, &[span(b"aaaa", 0, 0)], false)
                .unwrap();
        }

        let source_path = dir.path().join("external.sqlite3");
        let mut source = SqliteIndexStore::create(&source_path, cfg()).unwrap();
        source
            .add_object_chunks("obj", 4, &[span(b"bbbb", 0, 0)], false)
            .unwrap();

        assert!(matches!(
            pool.import_container_index("alpha", &source_path, true),
            Err(Error::Conflict(_))
        ));
    }

    #[test]
    fn backup_container_index_with_new_name_clones_into_pool() {
        let dir = tempdir().unwrap();
        let pool_path = dir.path().join("pool.sqlite3");
        let container_dir = dir.path().join("containers");
        let mut pool = SqlitePoolIndexStore::create(&pool_path, container_dir, cfg()).unwrap();
        pool.add_container("alpha").unwrap();
        {
            let mut alpha = pool.open_container("alpha").unwrap();
            alpha
                .add_object_chunks("obj", 4, &[span(b"aaaa", 0, 0)], false)
                .unwrap();
        }

        let backup_path = dir.path().join("alpha-backup.sqlite3");
        pool.backup_container_index("alpha", &backup_path, Some("beta"), true)
            .unwrap();

        assert!(pool.container_exists("beta").unwrap());
        let beta = pool.open_container("beta").unwrap();
        assert!(beta.object_exists("obj").unwrap());
    }

    #[test]
    fn backup_container_index_without_new_name_only_writes_dest() {
        let dir = tempdir().unwrap();
        let pool_path = dir.path().join("pool.sqlite3");
        let container_dir = dir.path().join("containers");
        let mut pool = SqlitePoolIndexStore::create(&pool_path, container_dir, cfg()).unwrap();
        pool.add_container("alpha").unwrap();

        let backup_path = dir.path().join("alpha-backup.sqlite3");
        pool.backup_container_index("alpha", &backup_path, None, false).unwrap();

        assert!(backup_path.exists());
        assert_eq!(pool.list_containers().unwrap(), vec!["alpha".to_string()]);
    }

    #[test]
    fn backup_then_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.sqlite3");
        let mut store = SqliteIndexStore::create(&path, cfg()).unwrap();
        store
            .add_object_chunks("obj", 4, &[span(b"aaaa", 0, 0)], false)
            .unwrap();

        let backup_path = dir.path().join("backup.sqlite3");
        store.backup(&backup_path).unwrap();

        let restored = SqliteIndexStore::open(&backup_path).unwrap();
        assert!(restored.object_exists("obj").unwrap());
    }
}
