// Toccata
// Copyright (c) 2026 The Project Toccata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `io` module implements composable byte-level I/O for media streams.
//!
//! All readers operating on bytes of data implement the [`ReadBytes`] trait, all writers
//! implement the [`WriteBytes`] trait. A [`MediaSourceStream`] adapts any [`MediaSource`] (a
//! readable and seekable source such as a file) into a buffered `ReadBytes` stream, while a
//! [`MediaSinkStream`] adapts any [`MediaSink`] into a buffered `WriteBytes` stream that supports
//! seeking back to patch previously reserved regions.

use std::io;
use std::mem;

use crate::errors::Result;

mod buf_reader;
mod media_sink_stream;
mod media_source_stream;

pub use buf_reader::BufReader;
pub use media_sink_stream::MediaSinkStream;
pub use media_source_stream::{MediaSourceStream, MediaSourceStreamOptions};

pub use std::io::SeekFrom;

/// `MediaSource` is a composite trait of [`std::io::Read`] and [`std::io::Seek`]. A source *must*
/// implement this trait to be used by [`MediaSourceStream`].
///
/// Despite requiring the [`std::io::Seek`] trait, seeking is an optional capability that can be
/// queried at runtime.
pub trait MediaSource: io::Read + io::Seek + Send + Sync {
    /// Returns if the source is seekable. This may be an expensive operation.
    fn is_seekable(&self) -> bool;

    /// Returns the length in bytes, if available. This may be an expensive operation.
    fn byte_len(&self) -> Option<u64>;
}

impl MediaSource for std::fs::File {
    fn is_seekable(&self) -> bool {
        // If the file's metadata is available, and the file is a regular file (i.e., not a FIFO,
        // etc.), then the MediaSource will be seekable. Otherwise assume it is not. Note that
        // metadata() follows symlinks.
        match self.metadata() {
            Ok(metadata) => metadata.is_file(),
            _ => false,
        }
    }

    fn byte_len(&self) -> Option<u64> {
        match self.metadata() {
            Ok(metadata) => Some(metadata.len()),
            _ => None,
        }
    }
}

impl<T: AsRef<[u8]> + Send + Sync> MediaSource for io::Cursor<T> {
    fn is_seekable(&self) -> bool {
        true
    }

    fn byte_len(&self) -> Option<u64> {
        Some(self.get_ref().as_ref().len() as u64)
    }
}

/// `MediaSink` is a composite trait of [`std::io::Write`] and [`std::io::Seek`]. A sink *must*
/// implement this trait to be used by [`MediaSinkStream`].
///
/// A seek on a sink must preserve all previously written bytes outside the region that is
/// subsequently overwritten.
pub trait MediaSink: io::Write + io::Seek + Send + Sync {
    /// Returns if the sink is seekable. This may be an expensive operation.
    fn is_seekable(&self) -> bool;
}

impl MediaSink for std::fs::File {
    fn is_seekable(&self) -> bool {
        match self.metadata() {
            Ok(metadata) => metadata.is_file(),
            _ => false,
        }
    }
}

impl MediaSink for io::Cursor<Vec<u8>> {
    fn is_seekable(&self) -> bool {
        true
    }
}

impl<'a> MediaSink for io::Cursor<&'a mut Vec<u8>> {
    fn is_seekable(&self) -> bool {
        true
    }
}

/// `ReadBytes` provides methods to read bytes and interpret them as little- or big-endian
/// unsigned integers or floating-point values of standard widths.
pub trait ReadBytes {
    /// Reads a single byte from the stream and returns it or an error.
    fn read_byte(&mut self) -> Result<u8>;

    /// Reads two bytes from the stream and returns them in read-order or an error.
    fn read_double_bytes(&mut self) -> Result<[u8; 2]>;

    /// Reads four bytes from the stream and returns them in read-order or an error.
    fn read_quad_bytes(&mut self) -> Result<[u8; 4]>;

    /// Reads up-to the number of bytes required to fill buf or returns an error.
    fn read_buf(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Reads exactly the number of bytes required to fill the provided buffer or returns an
    /// error.
    fn read_buf_exact(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Reads a single unsigned byte from the stream and returns it or an error.
    #[inline(always)]
    fn read_u8(&mut self) -> Result<u8> {
        self.read_byte()
    }

    /// Reads two bytes from the stream and interprets them as an unsigned 16-bit little-endian
    /// integer or returns an error.
    #[inline(always)]
    fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_double_bytes()?))
    }

    /// Reads two bytes from the stream and interprets them as an unsigned 16-bit big-endian
    /// integer or returns an error.
    #[inline(always)]
    fn read_be_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_double_bytes()?))
    }

    /// Reads two bytes from the stream and interprets them as a signed 16-bit big-endian
    /// integer or returns an error.
    #[inline(always)]
    fn read_be_i16(&mut self) -> Result<i16> {
        Ok(i16::from_be_bytes(self.read_double_bytes()?))
    }

    /// Reads four bytes from the stream and interprets them as an unsigned 32-bit little-endian
    /// integer or returns an error.
    #[inline(always)]
    fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_quad_bytes()?))
    }

    /// Reads four bytes from the stream and interprets them as an unsigned 32-bit big-endian
    /// integer or returns an error.
    #[inline(always)]
    fn read_be_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_quad_bytes()?))
    }

    /// Reads four bytes from the stream and interprets them as a signed 32-bit big-endian
    /// integer or returns an error.
    #[inline(always)]
    fn read_be_i32(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.read_quad_bytes()?))
    }

    /// Reads eight bytes from the stream and interprets them as an unsigned 64-bit big-endian
    /// integer or returns an error.
    #[inline(always)]
    fn read_be_u64(&mut self) -> Result<u64> {
        let mut buf = [0u8; mem::size_of::<u64>()];
        self.read_buf_exact(&mut buf)?;
        Ok(u64::from_be_bytes(buf))
    }

    /// Reads eight bytes from the stream and interprets them as a signed 64-bit big-endian
    /// integer or returns an error.
    #[inline(always)]
    fn read_be_i64(&mut self) -> Result<i64> {
        let mut buf = [0u8; mem::size_of::<i64>()];
        self.read_buf_exact(&mut buf)?;
        Ok(i64::from_be_bytes(buf))
    }

    /// Reads eight bytes from the stream and interprets them as a 64-bit big-endian IEEE-754
    /// floating-point value.
    #[inline(always)]
    fn read_be_f64(&mut self) -> Result<f64> {
        let mut buf = [0u8; mem::size_of::<u64>()];
        self.read_buf_exact(&mut buf)?;
        Ok(f64::from_be_bytes(buf))
    }

    /// Reads exactly the number of bytes requested, and returns a boxed slice of the data or an
    /// error.
    fn read_boxed_slice_exact(&mut self, len: usize) -> Result<Box<[u8]>> {
        let mut buf = vec![0u8; len];
        self.read_buf_exact(&mut buf)?;
        Ok(buf.into_boxed_slice())
    }

    /// Ignores the specified number of bytes from the stream or returns an error.
    fn ignore_bytes(&mut self, count: u64) -> Result<()>;

    /// Gets the position of the stream.
    fn pos(&self) -> u64;
}

impl<R: ReadBytes> ReadBytes for &mut R {
    #[inline(always)]
    fn read_byte(&mut self) -> Result<u8> {
        (*self).read_byte()
    }

    #[inline(always)]
    fn read_double_bytes(&mut self) -> Result<[u8; 2]> {
        (*self).read_double_bytes()
    }

    #[inline(always)]
    fn read_quad_bytes(&mut self) -> Result<[u8; 4]> {
        (*self).read_quad_bytes()
    }

    #[inline(always)]
    fn read_buf(&mut self, buf: &mut [u8]) -> Result<usize> {
        (*self).read_buf(buf)
    }

    #[inline(always)]
    fn read_buf_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        (*self).read_buf_exact(buf)
    }

    #[inline(always)]
    fn ignore_bytes(&mut self, count: u64) -> Result<()> {
        (*self).ignore_bytes(count)
    }

    #[inline(always)]
    fn pos(&self) -> u64 {
        (**self).pos()
    }
}

/// `WriteBytes` provides methods to write bytes and little- or big-endian unsigned integers or
/// floating-point values of standard widths.
pub trait WriteBytes {
    /// Writes a single byte to the stream or returns an error.
    fn write_byte(&mut self, byte: u8) -> Result<()>;

    /// Writes the entire buffer to the stream or returns an error.
    fn write_buf(&mut self, buf: &[u8]) -> Result<()>;

    /// Writes a single unsigned byte to the stream or returns an error.
    #[inline(always)]
    fn write_u8(&mut self, val: u8) -> Result<()> {
        self.write_byte(val)
    }

    /// Writes an unsigned 16-bit little-endian integer to the stream or returns an error.
    #[inline(always)]
    fn write_u16(&mut self, val: u16) -> Result<()> {
        self.write_buf(&val.to_le_bytes())
    }

    /// Writes an unsigned 16-bit big-endian integer to the stream or returns an error.
    #[inline(always)]
    fn write_be_u16(&mut self, val: u16) -> Result<()> {
        self.write_buf(&val.to_be_bytes())
    }

    /// Writes a signed 16-bit big-endian integer to the stream or returns an error.
    #[inline(always)]
    fn write_be_i16(&mut self, val: i16) -> Result<()> {
        self.write_buf(&val.to_be_bytes())
    }

    /// Writes an unsigned 32-bit little-endian integer to the stream or returns an error.
    #[inline(always)]
    fn write_u32(&mut self, val: u32) -> Result<()> {
        self.write_buf(&val.to_le_bytes())
    }

    /// Writes a signed 32-bit little-endian integer to the stream or returns an error.
    #[inline(always)]
    fn write_i32(&mut self, val: i32) -> Result<()> {
        self.write_buf(&val.to_le_bytes())
    }

    /// Writes an unsigned 32-bit big-endian integer to the stream or returns an error.
    #[inline(always)]
    fn write_be_u32(&mut self, val: u32) -> Result<()> {
        self.write_buf(&val.to_be_bytes())
    }

    /// Writes an unsigned 64-bit big-endian integer to the stream or returns an error.
    #[inline(always)]
    fn write_be_u64(&mut self, val: u64) -> Result<()> {
        self.write_buf(&val.to_be_bytes())
    }

    /// Writes a 64-bit big-endian IEEE-754 floating-point value to the stream or returns an
    /// error.
    #[inline(always)]
    fn write_be_f64(&mut self, val: f64) -> Result<()> {
        self.write_buf(&val.to_bits().to_be_bytes())
    }

    /// Gets the position of the stream.
    fn pos(&self) -> u64;
}

impl<W: WriteBytes> WriteBytes for &mut W {
    #[inline(always)]
    fn write_byte(&mut self, byte: u8) -> Result<()> {
        (*self).write_byte(byte)
    }

    #[inline(always)]
    fn write_buf(&mut self, buf: &[u8]) -> Result<()> {
        (*self).write_buf(buf)
    }

    #[inline(always)]
    fn pos(&self) -> u64 {
        (**self).pos()
    }
}

/// A `FiniteStream` is a stream that has a known length in bytes.
pub trait FiniteStream {
    /// Returns the length of the the stream in bytes.
    fn byte_len(&self) -> u64;

    /// Returns the number of bytes that have been read.
    fn bytes_read(&self) -> u64;

    /// Returns the number of bytes available for reading.
    fn bytes_available(&self) -> u64;
}
