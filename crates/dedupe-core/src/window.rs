// dedupe-core — sliding-window source over object bytes
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

//! The chunker asks a [`WindowSource`] for a fixed-size window starting at a
//! given offset, then slides by `shift_count` bytes on each step. A source
//! reports when fewer than a full window of bytes remain before end of input.

use std::io::{self, Read};

/// Supplies fixed-size windows of bytes from an object, without requiring the
/// whole object to be resident if the underlying data arrives sequentially.
pub trait WindowSource {
    /// Return the `size`-byte window starting at `start`, or `Ok(None)` if
    /// fewer than `size` bytes remain from `start` to the end of the object
    /// (end of input reached while filling the window).
    fn window(&mut self, start: usize, size: usize) -> io::Result<Option<&[u8]>>;

    /// Number of bytes buffered and known so far. For a buffer-backed source
    /// this is the full object length; for a stream-backed source it grows
    /// as more input is read.
    fn known_len(&self) -> usize;

    /// True once the underlying input is exhausted and `known_len` will not
    /// grow further.
    fn is_eof(&self) -> bool;

    /// Borrow bytes `[start, end)`, which must already have been returned (in
    /// whole or in part) by a prior successful `window` call and not yet
    /// retired.
    fn slice(&self, start: usize, end: usize) -> &[u8];

    /// Release any buffered bytes before `start`; the chunker calls this once
    /// it has emitted a chunk ending there. A no-op for sources that keep the
    /// whole object resident anyway.
    fn release_before(&mut self, start: usize) {
        let _ = start;
    }
}

/// A window source over an in-memory byte slice. The whole object is already
/// resident, so every window is available immediately.
pub struct BufferWindowSource<'a> {
    data: &'a [u8],
}

impl<'a> BufferWindowSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        BufferWindowSource { data }
    }
}

impl<'a> WindowSource for BufferWindowSource<'a> {
    fn window(&mut self, start: usize, size: usize) -> io::Result<Option<&[u8]>> {
        let end = start + size;
        if end > self.data.len() {
            return Ok(None);
        }
        Ok(Some(&self.data[start..end]))
    }

    fn known_len(&self) -> usize {
        self.data.len()
    }

    fn is_eof(&self) -> bool {
        true
    }

    fn slice(&self, start: usize, end: usize) -> &[u8] {
        &self.data[start..end]
    }
}

/// A window source over a sequential `Read`. Bytes are pulled in as later
/// windows require them and retired once the chunker has moved past them, so
/// memory use stays bounded by roughly one `max_chunk_size` at a time rather
/// than the whole object.
pub struct StreamWindowSource<R> {
    reader: R,
    buf: Vec<u8>,
    /// Offset of `buf[0]` within the overall byte stream.
    buf_origin: usize,
    eof: bool,
}

const READ_STEP: usize = 8 * 1024;

impl<R: Read> StreamWindowSource<R> {
    pub fn new(reader: R) -> Self {
        StreamWindowSource {
            reader,
            buf: Vec::new(),
            buf_origin: 0,
            eof: false,
        }
    }

    fn fill_to(&mut self, absolute_end: usize) -> io::Result<()> {
        while !self.eof && self.buf_origin + self.buf.len() < absolute_end {
            let mut step = [0u8; READ_STEP];
            let n = self.reader.read(&mut step)?;
            if n == 0 {
                self.eof = true;
                break;
            }
            self.buf.extend_from_slice(&step[..n]);
        }
        Ok(())
    }

}

impl<R: Read> WindowSource for StreamWindowSource<R> {
    fn window(&mut self, start: usize, size: usize) -> io::Result<Option<&[u8]>> {
        debug_assert!(start >= self.buf_origin, "window start retired from buffer");
        let absolute_end = start + size;
        self.fill_to(absolute_end)?;
        let local_start = start - self.buf_origin;
        let local_end = local_start + size;
        if local_end > self.buf.len() {
            return Ok(None);
        }
        Ok(Some(&self.buf[local_start..local_end]))
    }

    fn known_len(&self) -> usize {
        self.buf_origin + self.buf.len()
    }

    fn is_eof(&self) -> bool {
        self.eof
    }

    fn slice(&self, start: usize, end: usize) -> &[u8] {
        &self.buf[start - self.buf_origin..end - self.buf_origin]
    }

    /// Drop buffered bytes before `start`; those bytes will never be asked
    /// for again once the chunker has emitted a chunk ending there.
    fn release_before(&mut self, start: usize) {
        if start <= self.buf_origin {
            return;
        }
        let drop_count = (start - self.buf_origin).min(self.buf.len());
        self.buf.drain(0..drop_count);
        self.buf_origin += drop_count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_source_yields_full_windows() {
        let data = b"0123456789";
        let mut src = BufferWindowSource::new(data);
        assert_eq!(src.window(0, 4).unwrap(), Some(&b"0123"[..]));
        assert_eq!(src.window(6, 4).unwrap(), Some(&b"6789"[..]));
    }

    #[test]
    fn buffer_source_signals_eof() {
        let data = b"short";
        let mut src = BufferWindowSource::new(data);
        assert_eq!(src.window(2, 10).unwrap(), None);
    }

    #[test]
    fn stream_source_matches_buffer_source() {
        let data: Vec<u8> = (0..500u32).map(|i| (i % 256) as u8).collect();
        let mut buf_src = BufferWindowSource::new(&data);
        let mut stream_src = StreamWindowSource::new(&data[..]);

        for start in (0..400).step_by(37) {
            let a = buf_src.window(start, 32).unwrap();
            let b = stream_src.window(start, 32).unwrap();
            assert_eq!(a, b);
            stream_src.release_before(start);
        }
    }

    #[test]
    fn stream_source_eof_matches_buffer_source() {
        let data = b"tiny";
        let mut stream_src = StreamWindowSource::new(&data[..]);
        assert_eq!(stream_src.window(0, 10).unwrap(), None);
        assert!(stream_src.is_eof());
    }
}
