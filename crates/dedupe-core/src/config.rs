// dedupe-core — chunker/index configuration
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

//! Validated chunking configuration, fixed at `create_index` time and
//! persisted alongside the index.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Chunking parameters for an index. Immutable once an index is created —
/// `open_index` loads the persisted value and ignores any new config passed
/// in by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Minimum chunk size in bytes. Also the sliding-window size.
    pub min_chunk_size: u32,
    /// Maximum chunk size in bytes; a chunk is force-cut here if no content
    /// boundary is found first.
    pub max_chunk_size: u32,
    /// Number of bytes the window advances between boundary checks.
    pub shift_count: u32,
    /// Number of leading zero bytes of the window's MD5 digest required to
    /// call a boundary (1..=8).
    pub boundary_check_bytes: u8,
    /// When true, the index uses the pool+container shape (one pool index,
    /// one sub-index per container). When false, a single flat index.
    pub index_per_object: bool,
}

impl ChunkerConfig {
    /// Build and validate a configuration, per the invariants in the data
    /// model: both sizes are multiples of 64, `min_chunk_size >= 128`,
    /// `max_chunk_size >= 8 * min_chunk_size`, `boundary_check_bytes` in
    /// `1..=8`, and `shift_count <= min_chunk_size`.
    pub fn new(
        min_chunk_size: u32,
        max_chunk_size: u32,
        shift_count: u32,
        boundary_check_bytes: u8,
        index_per_object: bool,
    ) -> Result<Self> {
        if min_chunk_size % 64 != 0 {
            return Err(Error::InvalidArgument(format!(
                "min_chunk_size {min_chunk_size} is not a multiple of 64"
            )));
        }
        if min_chunk_size < 128 {
            return Err(Error::InvalidArgument(format!(
                "min_chunk_size {min_chunk_size} is below the minimum of 128"
            )));
        }
        if max_chunk_size % 64 != 0 {
            return Err(Error::InvalidArgument(format!(
                "max_chunk_size {max_chunk_size} is not a multiple of 64"
            )));
        }
        if max_chunk_size < 8 * min_chunk_size {
            return Err(Error::InvalidArgument(format!(
                "max_chunk_size {max_chunk_size} must be at least 8x min_chunk_size {min_chunk_size}"
            )));
        }
        if !(1..=8).contains(&boundary_check_bytes) {
            return Err(Error::InvalidArgument(format!(
                "boundary_check_bytes {boundary_check_bytes} must be between 1 and 8"
            )));
        }
        if shift_count > min_chunk_size {
            return Err(Error::InvalidArgument(format!(
                "shift_count {shift_count} must not exceed min_chunk_size {min_chunk_size}"
            )));
        }

        if boundary_check_bytes >= 5 {
            tracing::warn!(
                boundary_check_bytes,
                "boundary_check_bytes this high makes the expected chunk size \
                 (2^(8*boundary_check_bytes) bytes) astronomically larger than any \
                 reasonable max_chunk_size; boundaries will effectively never fire \
                 and every object will be force-cut at max_chunk_size"
            );
        }

        Ok(ChunkerConfig {
            min_chunk_size,
            max_chunk_size,
            shift_count,
            boundary_check_bytes,
            index_per_object,
        })
    }
}
