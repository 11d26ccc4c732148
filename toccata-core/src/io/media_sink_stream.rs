// Toccata
// Copyright (c) 2026 The Project Toccata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::io::SeekFrom;

use crate::errors::Result;

use super::{MediaSink, WriteBytes};

/// `MediaSinkStream` is the main writer used by muxers. It adapts a [`MediaSink`] into a buffered
/// [`WriteBytes`] stream.
///
/// The stream tracks the logical write position at all times without flushing. A seek flushes any
/// pending bytes first, so a muxer may freely seek backwards to patch a previously reserved
/// region and then seek forward again; bytes outside the patched region are preserved.
pub struct MediaSinkStream<'s> {
    /// The sink the stream will write to.
    inner: Box<dyn MediaSink + 's>,
    /// Bytes written but not yet submitted to the sink.
    pending: Vec<u8>,
    /// The logical write position, including pending bytes.
    pos: u64,
}

impl<'s> MediaSinkStream<'s> {
    /// The number of pending bytes that triggers a flush to the sink.
    const FLUSH_LEN: usize = 32 * 1024;

    pub fn new(sink: Box<dyn MediaSink + 's>) -> Self {
        MediaSinkStream { inner: sink, pending: Vec::with_capacity(Self::FLUSH_LEN), pos: 0 }
    }

    /// Returns if the underlying sink is seekable.
    pub fn is_seekable(&self) -> bool {
        self.inner.is_seekable()
    }

    /// Submit all pending bytes to the sink.
    pub fn flush(&mut self) -> Result<()> {
        if !self.pending.is_empty() {
            self.inner.write_all(&self.pending)?;
            self.pending.clear();
        }
        self.inner.flush()?;
        Ok(())
    }

    /// Seek to an absolute position within the sink. Pending bytes are flushed first.
    ///
    /// Returns the new position.
    pub fn seek(&mut self, from: SeekFrom) -> Result<u64> {
        // Normalize relative seeks against the logical position before flushing.
        let from = match from {
            SeekFrom::Current(delta) => {
                let pos = if delta.is_negative() {
                    self.pos.saturating_sub(delta.unsigned_abs())
                }
                else {
                    self.pos + delta.unsigned_abs()
                };
                SeekFrom::Start(pos)
            }
            from => from,
        };

        self.flush()?;

        self.pos = self.inner.seek(from)?;
        Ok(self.pos)
    }

    /// Consumes the stream and returns the underlying sink. Pending bytes are flushed.
    pub fn into_inner(mut self) -> Result<Box<dyn MediaSink + 's>> {
        self.flush()?;
        Ok(self.inner)
    }
}

impl WriteBytes for MediaSinkStream<'_> {
    #[inline(always)]
    fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.pending.push(byte);
        self.pos += 1;

        if self.pending.len() >= Self::FLUSH_LEN {
            self.inner.write_all(&self.pending)?;
            self.pending.clear();
        }
        Ok(())
    }

    fn write_buf(&mut self, buf: &[u8]) -> Result<()> {
        self.pending.extend_from_slice(buf);
        self.pos += buf.len() as u64;

        if self.pending.len() >= Self::FLUSH_LEN {
            self.inner.write_all(&self.pending)?;
            self.pending.clear();
        }
        Ok(())
    }

    #[inline(always)]
    fn pos(&self) -> u64 {
        self.pos
    }
}
