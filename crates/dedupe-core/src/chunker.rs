// dedupe-core — content-defined chunking state machine
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

//! Splits an object's bytes into content-defined chunks.
//!
//! Starting at the beginning of an unread span, the chunker slides a
//! `min_chunk_size`-byte window forward in `shift_count`-byte steps, hashing
//! each window with [`window_hash`](crate::hash::window_hash) and testing
//! [`is_boundary`](crate::hash::is_boundary). The first window whose digest
//! passes the boundary test ends the chunk there; failing that, the chunk is
//! force-cut once it reaches `max_chunk_size`. When a boundary and the cap
//! would fire at the same offset, the boundary is reported as the cause — the
//! two describe the same cut point, so there is nothing to arbitrate, but the
//! boundary test always runs first.

use crate::config::ChunkerConfig;
use crate::hash::{is_boundary, window_hash, ChunkKey};
use crate::window::WindowSource;
use std::io;

/// One emitted chunk's position within its object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpan {
    pub key: ChunkKey,
    pub position: u64,
    pub length: u32,
    pub ordinal: u32,
}

/// Result of chunking an object, possibly cut short by a callback abort.
#[derive(Debug, Default)]
pub struct ChunkingOutcome {
    pub chunks: Vec<ChunkSpan>,
    /// True if a `process_chunk` callback returned `false` before the whole
    /// object was consumed.
    pub aborted: bool,
}

/// Split `source`'s bytes into chunks, calling `process_chunk` once per
/// emitted chunk with its span and its bytes. Returning `false` from
/// `process_chunk` aborts chunking immediately; chunks already reported are
/// kept in the outcome and `aborted` is set.
pub fn chunk_stream<S, F>(
    source: &mut S,
    config: &ChunkerConfig,
    mut process_chunk: F,
) -> io::Result<ChunkingOutcome>
where
    S: WindowSource,
    F: FnMut(ChunkSpan, &[u8]) -> io::Result<bool>,
{
    let mut outcome = ChunkingOutcome::default();
    let mut chunk_start: u64 = 0;
    let mut ordinal: u32 = 0;
    let window_size = config.min_chunk_size as usize;
    let shift = config.shift_count.max(1) as u64;
    let max_len = config.max_chunk_size as u64;

    loop {
        let mut curr = chunk_start;
        let cut = loop {
            let candidate_len = curr - chunk_start + window_size as u64;

            match source.window(curr as usize, window_size)? {
                Some(window) => {
                    let digest = window_hash(window);
                    if is_boundary(&digest, config.boundary_check_bytes) {
                        break candidate_len.min(max_len);
                    }
                    if candidate_len >= max_len {
                        break max_len;
                    }
                    curr += shift;
                }
                None => {
                    // Fewer than a full window remain: the rest of the object,
                    // however short, becomes the final chunk.
                    break source.known_len() as u64 - chunk_start;
                }
            }
        };

        if cut == 0 {
            // Object fully consumed with no trailing bytes.
            break;
        }

        let end = chunk_start + cut;
        let bytes = source.slice(chunk_start as usize, end as usize);
        let key = ChunkKey::of(bytes);
        let span = ChunkSpan {
            key,
            position: chunk_start,
            length: cut as u32,
            ordinal,
        };

        let keep_going = process_chunk(span, bytes)?;
        outcome.chunks.push(span);

        if !keep_going {
            outcome.aborted = true;
            return Ok(outcome);
        }

        chunk_start = end;
        ordinal += 1;
        source.release_before(chunk_start as usize);

        if source.is_eof() && chunk_start >= source.known_len() as u64 {
            break;
        }
    }

    Ok(outcome)
}

/// Convenience wrapper over [`chunk_stream`] for an in-memory buffer, with no
/// callback — returns every chunk's span.
pub fn chunk_buffer(data: &[u8], config: &ChunkerConfig) -> Vec<ChunkSpan> {
    use crate::window::BufferWindowSource;

    if data.is_empty() {
        return Vec::new();
    }

    let mut source = BufferWindowSource::new(data);
    chunk_stream(&mut source, config, |_, _| Ok(true))
        .expect("buffer chunking is infallible")
        .chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(min: u32, max: u32, shift: u32, bcb: u8) -> ChunkerConfig {
        ChunkerConfig::new(min, max, shift, bcb, false).unwrap()
    }

    #[test]
    fn empty_object_yields_no_chunks() {
        let config = cfg(128, 1024, 64, 2);
        assert!(chunk_buffer(b"", &config).is_empty());
    }

    #[test]
    fn short_object_yields_one_chunk() {
        let config = cfg(128, 1024, 64, 2);
        let data = vec![7u8; 10];
        let chunks = chunk_buffer(&data, &config);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].position, 0);
        assert_eq!(chunks[0].length, 10);
        assert_eq!(chunks[0].ordinal, 0);
    }

    #[test]
    fn partitioning_is_contiguous_and_exhaustive() {
        let config = cfg(128, 1024, 64, 2);
        let data: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
        let chunks = chunk_buffer(&data, &config);

        let mut expected_pos = 0u64;
        for (i, span) in chunks.iter().enumerate() {
            assert_eq!(span.ordinal as usize, i);
            assert_eq!(span.position, expected_pos);
            assert!(span.length as u32 <= config.max_chunk_size);
            expected_pos += span.length as u64;
        }
        assert_eq!(expected_pos, data.len() as u64);
    }

    #[test]
    fn determinism_across_runs() {
        let config = cfg(128, 1024, 64, 2);
        let data: Vec<u8> = (0..8000u32).map(|i| ((i * 37) % 256) as u8).collect();
        let a = chunk_buffer(&data, &config);
        let b = chunk_buffer(&data, &config);
        assert_eq!(a, b);
    }

    #[test]
    fn no_chunk_exceeds_max_size() {
        // All-zero data means every window hashes to a boundary-testable
        // digest that never happens to satisfy is_boundary by chance here, so
        // this primarily exercises the max_chunk_size cap path.
        let config = cfg(128, 256, 64, 8);
        let data = vec![0xABu8; 3000];
        let chunks = chunk_buffer(&data, &config);
        for span in &chunks {
            assert!(span.length <= config.max_chunk_size);
        }
    }

    #[test]
    fn dedup_on_shared_byte_ranges() {
        let config = cfg(128, 1024, 128, 1);
        let mut data = vec![1u8; 1024];
        data.extend(vec![1u8; 1024]); // identical second half
        let chunks = chunk_buffer(&data, &config);
        // both halves are byte-identical and chunked the same way, so some
        // chunk key must repeat.
        let mut seen = std::collections::HashSet::new();
        let mut has_repeat = false;
        for c in &chunks {
            if !seen.insert(c.key) {
                has_repeat = true;
            }
        }
        assert!(has_repeat, "identical byte ranges should dedup to the same key");
    }

    #[test]
    fn process_chunk_abort_stops_early() {
        let config = cfg(128, 256, 64, 8);
        let data = vec![0x11u8; 3000];
        use crate::window::BufferWindowSource;
        let mut source = BufferWindowSource::new(&data);
        let mut seen = 0;
        let outcome = chunk_stream(&mut source, &config, |_, _| {
            seen += 1;
            Ok(seen < 2)
        })
        .unwrap();
        assert!(outcome.aborted);
        assert_eq!(outcome.chunks.len(), 2);
    }
}
