// Toccata
// Copyright (c) 2026 The Project Toccata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! EBML primitive writers (as in RFC8794).
//!
//! These primitives write element IDs, variable-length sizes, and typed element payloads. Master
//! elements are written in two passes: opening one writes an 8-byte "unknown size" placeholder,
//! closing one seeks back and patches the real size in.

use std::io::SeekFrom;

use toccata_core::errors::Result;
use toccata_core::io::{MediaSinkStream, WriteBytes};

#[cfg(test)]
use toccata_core::io::ReadBytes;

use crate::element_ids;

/// Sizes at or above this value are undefined in EBML and are written as "unknown".
const UNKNOWN_SIZE_THRESHOLD: u64 = (1 << 56) - 1;

/// Returns the number of bytes an EBML element ID occupies on the wire.
pub(crate) fn ebml_id_size(id: u32) -> usize {
    let log2 = 31 - (id + 1).leading_zeros() as usize;
    (log2 - 1) / 7 + 1
}

/// Writes a single EBML element ID, as-is, in big-endian byte order.
pub(crate) fn write_ebml_id(sink: &mut MediaSinkStream<'_>, id: u32) -> Result<()> {
    let mut i = ebml_id_size(id);
    while i > 0 {
        i -= 1;
        sink.write_byte((id >> (i * 8)) as u8)?;
    }
    Ok(())
}

/// Calculate how many bytes are needed to represent a given size in EBML.
pub(crate) fn ebml_size_bytes(size: u64) -> usize {
    let mut bytes = 1;
    while bytes < 8 && size.saturating_add(1) >> (bytes * 7) != 0 {
        bytes += 1;
    }
    bytes
}

/// Write an EBML size meaning "unknown size": an `bytes`-wide field with every payload bit set.
///
/// `bytes` is clamped to a maximum of 8.
pub(crate) fn write_ebml_size_unknown(sink: &mut MediaSinkStream<'_>, bytes: usize) -> Result<()> {
    let bytes = bytes.min(8);
    let value = (1u64 << (bytes * 7 + 1)) - 1;

    let mut i = bytes;
    while i > 0 {
        i -= 1;
        sink.write_byte((value >> (i * 8)) as u8)?;
    }
    Ok(())
}

/// Writes an EBML size using the shortest encoding that fits, or at least `min_bytes` bytes.
///
/// Sizes that are undefined in EBML are written as a 1-byte "unknown size".
pub(crate) fn write_ebml_size(
    sink: &mut MediaSinkStream<'_>,
    size: u64,
    min_bytes: usize,
) -> Result<()> {
    let bytes = min_bytes.max(ebml_size_bytes(size));

    if size >= UNKNOWN_SIZE_THRESHOLD {
        return write_ebml_size_unknown(sink, 1);
    }

    let value = size | (1u64 << (bytes * 7));

    let mut i = bytes;
    while i > 0 {
        i -= 1;
        sink.write_byte((value >> (i * 8)) as u8)?;
    }
    Ok(())
}

/// Writes an unsigned integer element using the shortest byte count that fits the value.
pub(crate) fn write_ebml_uint(sink: &mut MediaSinkStream<'_>, id: u32, val: u64) -> Result<()> {
    let mut bytes = 1;
    while bytes < 8 && val >> (bytes * 8) != 0 {
        bytes += 1;
    }

    write_ebml_id(sink, id)?;
    write_ebml_size(sink, bytes as u64, 0)?;

    let mut i = bytes;
    while i > 0 {
        i -= 1;
        sink.write_byte((val >> (i * 8)) as u8)?;
    }
    Ok(())
}

/// Writes a float element as a fixed 8-byte IEEE-754 big-endian value.
pub(crate) fn write_ebml_float(sink: &mut MediaSinkStream<'_>, id: u32, val: f64) -> Result<()> {
    write_ebml_id(sink, id)?;
    write_ebml_size(sink, 8, 0)?;
    sink.write_be_f64(val)
}

/// Writes a binary element.
pub(crate) fn write_ebml_binary(sink: &mut MediaSinkStream<'_>, id: u32, buf: &[u8]) -> Result<()> {
    write_ebml_id(sink, id)?;
    write_ebml_size(sink, buf.len() as u64, 0)?;
    sink.write_buf(buf)
}

/// Writes a string element. The string contents are copied without a terminator.
pub(crate) fn write_ebml_string(sink: &mut MediaSinkStream<'_>, id: u32, s: &str) -> Result<()> {
    write_ebml_binary(sink, id, s.as_bytes())
}

/// Writes a Void element of a given total size. Useful for reserving space in the file to be
/// written to later.
///
/// `size` must be at least 2 to fit the element ID and size field; smaller requests write
/// nothing.
pub(crate) fn write_ebml_void(sink: &mut MediaSinkStream<'_>, size: u64) -> Result<()> {
    if size < 2 {
        return Ok(());
    }

    let start = sink.pos();

    write_ebml_id(sink, element_ids::EBML_VOID)?;
    // The size stored in the void element must not count the bytes used by the ID and the size
    // field itself. A 1-byte size field is used below 10 bytes, an 8-byte field from there up.
    if size < 10 {
        write_ebml_size(sink, size - 2, 0)?;
    }
    else {
        write_ebml_size(sink, size - 9, 8)?;
    }

    // Fill the reservation so the cursor lands exactly past it.
    let written = sink.pos() - start;
    for _ in written..size {
        sink.write_byte(0)?;
    }
    Ok(())
}

/// Opens a master element: writes the element ID and an 8-byte unknown-size placeholder.
///
/// Returns the offset immediately after the placeholder, to be passed to [`end_ebml_master`].
pub(crate) fn start_ebml_master(sink: &mut MediaSinkStream<'_>, id: u32) -> Result<u64> {
    write_ebml_id(sink, id)?;
    write_ebml_size_unknown(sink, 8)?;
    Ok(sink.pos())
}

/// Closes a master element opened at `start`: patches the placeholder with the real size and
/// restores the cursor.
pub(crate) fn end_ebml_master(sink: &mut MediaSinkStream<'_>, start: u64) -> Result<()> {
    let pos = sink.pos();

    sink.seek(SeekFrom::Start(start - 8))?;
    write_ebml_size(sink, pos - start, 8)?;
    sink.seek(SeekFrom::Start(pos))?;
    Ok(())
}

/// Reads a single EBML element ID from the stream and returns its value or an error.
#[cfg(test)]
pub(crate) fn read_ebml_id<R: ReadBytes>(mut reader: R) -> Result<u32> {
    let byte = reader.read_byte()?;
    let remaining_octets = byte.leading_zeros();

    let mut id = u32::from(byte);
    for _ in 0..remaining_octets {
        let byte = reader.read_byte()?;
        id = (id << 8) | u32::from(byte);
    }
    Ok(id)
}

/// Reads a single unsigned variable-size integer from the stream and returns both its value and
/// length in octets, or an error.
#[cfg(test)]
pub(crate) fn read_vint<R: ReadBytes>(mut reader: R) -> Result<(u64, u32)> {
    let byte = reader.read_byte()?;
    if byte == 0xFF {
        // Special case: unknown size elements.
        return Ok((u64::MAX, 1));
    }

    let vint_width = byte.leading_zeros();
    let mut vint = u64::from(byte);
    // Clear the VINT_MARKER bit.
    vint ^= 1 << (7 - vint_width);

    // Read the remaining octets.
    for _ in 0..vint_width {
        let byte = reader.read_byte()?;
        vint = (vint << 8) | u64::from(byte);
    }

    Ok((vint, vint_width + 1))
}

/// Reads an element size. Returns [`None`] for the "unknown size" encoding.
#[cfg(test)]
pub(crate) fn read_ebml_size<R: ReadBytes>(reader: R) -> Result<Option<u64>> {
    let (size, len) = read_vint(reader)?;
    if size == u64::MAX && len == 1 {
        return Ok(None);
    }
    Ok(Some(size))
}
