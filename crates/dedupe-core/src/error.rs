// dedupe-core — error types
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

//! Error kinds for the dedupe library façade and index store.

use thiserror::Error;

/// Errors produced by the index store and library façade.
#[derive(Error, Debug)]
pub enum Error {
    /// A caller-supplied argument (a config value, an object/container name)
    /// failed validation before any state was touched.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The requested object, container, or chunk does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation conflicts with existing state (e.g. storing an object
    /// under a name that already exists without requesting replacement).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A caller-supplied callback (`write_chunk`, `read_chunk`,
    /// `delete_chunk`) failed. The index has already been rolled back to a
    /// consistent state by the time this is returned to the caller.
    #[error("storage callback failed: {0}")]
    CallbackFailure(String),

    /// The persistent index is structurally unreadable. Fatal: the index
    /// cannot be opened until the underlying store is repaired or replaced.
    #[error("index corrupted: {0}")]
    IndexCorruption(String),

    /// The index is readable and internally consistent, but a reconciliation
    /// check against external storage found a discrepancy. Diagnostic only;
    /// does not block further operations.
    #[error("consistency warning: {0}")]
    ConsistencyWarning(String),

    /// An error surfaced by the underlying index persistence layer.
    #[error("index storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// An I/O error not otherwise classified above.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
