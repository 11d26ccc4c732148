// Toccata
// Copyright (c) 2026 The Project Toccata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::cmp;
use std::io::SeekFrom;

use crate::errors::{end_of_stream_error, Result};

use super::{MediaSource, ReadBytes};

/// `MediaSourceStreamOptions` specifies the buffering behaviour of a `MediaSourceStream`.
pub struct MediaSourceStreamOptions {
    /// The maximum buffer size. Must be a power of 2. Must be > 32kB.
    pub buffer_len: usize,
}

impl Default for MediaSourceStreamOptions {
    fn default() -> Self {
        MediaSourceStreamOptions { buffer_len: 64 * 1024 }
    }
}

/// `MediaSourceStream` is the main reader used by demuxers. It adapts a [`MediaSource`] into a
/// buffered [`ReadBytes`] stream.
///
/// The stream retains a bounded margin of already-read bytes so that short backwards seeks, such
/// as re-aligning to the start of a probed marker or rewinding to the start of a KLV packet, do
/// not require the source itself to be seekable.
pub struct MediaSourceStream<'s> {
    /// The source the stream will read from.
    inner: Box<dyn MediaSource + 's>,
    /// The combined read-ahead/rewind buffer.
    buf: Box<[u8]>,
    /// The absolute stream position of `buf[0]`.
    base_pos: u64,
    /// The index of the next byte to read.
    read_pos: usize,
    /// The index one past the last valid byte in the buffer.
    end_pos: usize,
}

impl<'s> MediaSourceStream<'s> {
    /// The number of already-read bytes retained across buffer refills for backwards seeking.
    const SEEKBACK_LEN: usize = 4 * 1024;

    pub fn new(source: Box<dyn MediaSource + 's>, options: MediaSourceStreamOptions) -> Self {
        MediaSourceStream {
            inner: source,
            buf: vec![0u8; options.buffer_len].into_boxed_slice(),
            base_pos: 0,
            read_pos: 0,
            end_pos: 0,
        }
    }

    /// Returns if the underlying source is seekable.
    pub fn is_seekable(&self) -> bool {
        self.inner.is_seekable()
    }

    /// Returns the length of the underlying source in bytes, if available.
    pub fn byte_len(&self) -> Option<u64> {
        self.inner.byte_len()
    }

    /// Seek within the already-buffered data, backwards relative to the current position.
    ///
    /// Panics if `delta` bytes are not buffered behind the current position. Callers must not
    /// rewind further than they have read since the last discarding operation.
    pub fn seek_buffered_rev(&mut self, delta: usize) {
        assert!(delta <= self.read_pos, "rewind exceeds buffered data");
        self.read_pos -= delta;
    }

    /// Seek to an absolute position within the source.
    ///
    /// The read buffer is invalidated. Returns the new position.
    pub fn seek(&mut self, from: SeekFrom) -> Result<u64> {
        // Normalize to an absolute position since the position of the inner source runs ahead of
        // the logical position of this stream by the amount of unread buffered data.
        let from = match from {
            SeekFrom::Current(delta) => {
                let pos = self.pos();
                if delta.is_negative() {
                    SeekFrom::Start(pos.saturating_sub(delta.unsigned_abs()))
                }
                else {
                    SeekFrom::Start(pos + delta.unsigned_abs())
                }
            }
            from => from,
        };

        let pos = self.inner.seek(from)?;

        self.base_pos = pos;
        self.read_pos = 0;
        self.end_pos = 0;

        Ok(pos)
    }

    /// Consumes the stream and returns the underlying media source.
    pub fn into_inner(self) -> Box<dyn MediaSource + 's> {
        self.inner
    }

    /// Refill the buffer from the source, retaining a seek-back margin of already-read bytes.
    fn fetch(&mut self) -> Result<()> {
        if self.read_pos < self.end_pos {
            return Ok(());
        }

        if self.end_pos == self.buf.len() {
            // The buffer is full. Discard everything but the seek-back margin.
            let keep = cmp::min(self.end_pos, Self::SEEKBACK_LEN);
            let discard = self.end_pos - keep;

            self.buf.copy_within(discard..self.end_pos, 0);
            self.base_pos += discard as u64;
            self.read_pos -= discard;
            self.end_pos = keep;
        }

        loop {
            match self.inner.read(&mut self.buf[self.end_pos..]) {
                Ok(0) => return end_of_stream_error(),
                Ok(count) => {
                    self.end_pos += count;
                    return Ok(());
                }
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => (),
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Get a slice of the unread buffered bytes, fetching if the buffer is exhausted.
    fn fetch_buf(&mut self) -> Result<&[u8]> {
        self.fetch()?;
        Ok(&self.buf[self.read_pos..self.end_pos])
    }
}

impl ReadBytes for MediaSourceStream<'_> {
    #[inline(always)]
    fn read_byte(&mut self) -> Result<u8> {
        self.fetch()?;

        let byte = self.buf[self.read_pos];
        self.read_pos += 1;
        Ok(byte)
    }

    fn read_double_bytes(&mut self) -> Result<[u8; 2]> {
        let mut bytes = [0u8; 2];
        self.read_buf_exact(&mut bytes)?;
        Ok(bytes)
    }

    fn read_quad_bytes(&mut self) -> Result<[u8; 4]> {
        let mut bytes = [0u8; 4];
        self.read_buf_exact(&mut bytes)?;
        Ok(bytes)
    }

    fn read_buf(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let avail = self.fetch_buf()?;
        let len = cmp::min(avail.len(), buf.len());

        buf[..len].copy_from_slice(&avail[..len]);
        self.read_pos += len;

        Ok(len)
    }

    fn read_buf_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;

        while filled < buf.len() {
            filled += self.read_buf(&mut buf[filled..])?;
        }

        Ok(())
    }

    fn ignore_bytes(&mut self, mut count: u64) -> Result<()> {
        // Consume from the buffer first.
        let buffered = (self.end_pos - self.read_pos) as u64;
        let len = cmp::min(buffered, count);

        self.read_pos += len as usize;
        count -= len;

        if count == 0 {
            return Ok(());
        }

        if self.inner.is_seekable() {
            self.seek(SeekFrom::Current(count as i64))?;
        }
        else {
            while count > 0 {
                let avail = self.fetch_buf()?;
                let len = cmp::min(avail.len() as u64, count);

                self.read_pos += len as usize;
                count -= len;
            }
        }

        Ok(())
    }

    #[inline(always)]
    fn pos(&self) -> u64 {
        self.base_pos + self.read_pos as u64
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, SeekFrom};

    use super::{MediaSourceStream, MediaSourceStreamOptions, ReadBytes};

    fn make_stream(data: Vec<u8>) -> MediaSourceStream<'static> {
        MediaSourceStream::new(Box::new(Cursor::new(data)), Default::default())
    }

    #[test]
    fn verify_sequential_reads() {
        let mut mss = make_stream(vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]);

        assert_eq!(mss.read_byte().unwrap(), 0x01);
        assert_eq!(mss.read_be_u16().unwrap(), 0x0203);
        assert_eq!(mss.read_be_u32().unwrap(), 0x0405_0607);
        assert_eq!(mss.pos(), 7);
        assert!(mss.read_be_u16().is_err());
    }

    #[test]
    fn verify_rewind_and_seek() {
        let mut mss = make_stream((0u8..32).collect());

        let mut window = [0u8; 4];
        mss.read_buf_exact(&mut window).unwrap();
        assert_eq!(window, [0, 1, 2, 3]);

        mss.seek_buffered_rev(4);
        assert_eq!(mss.pos(), 0);
        assert_eq!(mss.read_byte().unwrap(), 0);

        mss.seek(SeekFrom::Start(16)).unwrap();
        assert_eq!(mss.pos(), 16);
        assert_eq!(mss.read_byte().unwrap(), 16);
    }

    #[test]
    fn verify_ignore_bytes() {
        let mut mss = make_stream((0u8..64).collect());

        mss.read_byte().unwrap();
        mss.ignore_bytes(30).unwrap();
        assert_eq!(mss.pos(), 31);
        assert_eq!(mss.read_byte().unwrap(), 31);
    }

    #[test]
    fn verify_small_buffer_refills() {
        let data: Vec<u8> = (0u32..100_000).map(|i| (i % 251) as u8).collect();
        let mut mss = MediaSourceStream::new(
            Box::new(Cursor::new(data.clone())),
            MediaSourceStreamOptions { buffer_len: 8 * 1024 },
        );

        for (i, &expected) in data.iter().enumerate() {
            assert_eq!(mss.read_byte().unwrap(), expected, "mismatch at byte {}", i);
        }
        assert!(mss.read_byte().is_err());
    }
}
