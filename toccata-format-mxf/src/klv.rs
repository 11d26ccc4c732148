// Toccata
// Copyright (c) 2026 The Project Toccata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! KLV (key-length-value) packet framing as defined by SMPTE 336M.

use toccata_core::errors::{decode_error, Result};
use toccata_core::io::ReadBytes;

/// A 16-byte identifier. Used both for the universal labels that key KLV packets and for the
/// instance identifiers that link metadata sets to one another.
pub(crate) type Uid = [u8; 16];

/// One KLV packet header. The value body follows at the stream position the header was read at;
/// the caller either consumes exactly `length` bytes or skips them.
#[derive(Copy, Clone, Debug)]
pub(crate) struct KlvPacket {
    /// The 16-byte packet key.
    pub key: Uid,
    /// The offset of the start of the packet, i.e. of the key.
    pub offset: u64,
    /// The length of the value in bytes.
    pub length: u64,
}

/// Decodes a BER length: short form holds the length in the low 7 bits, long form holds the
/// count of big-endian length bytes that follow.
pub(crate) fn decode_ber_length<R: ReadBytes>(reader: &mut R) -> Result<u64> {
    let byte = reader.read_byte()?;

    if byte & 0x80 == 0 {
        return Ok(u64::from(byte));
    }

    // SMPTE 379M 5.3.4 guarantees the length field does not exceed 8 bytes.
    let num_bytes = byte & 0x7f;
    if num_bytes > 8 {
        return decode_error("mxf: ber length field exceeds 8 bytes");
    }

    let mut size = 0u64;
    for _ in 0..num_bytes {
        size = (size << 8) | u64::from(reader.read_byte()?);
    }
    Ok(size)
}

/// Reads a single KLV packet header, leaving the stream cursor at the start of the value.
pub(crate) fn read_klv<R: ReadBytes>(reader: &mut R) -> Result<KlvPacket> {
    let offset = reader.pos();

    let mut key = [0u8; 16];
    reader.read_buf_exact(&mut key)?;

    let length = decode_ber_length(reader)?;
    Ok(KlvPacket { key, offset, length })
}

#[cfg(test)]
mod tests {
    use toccata_core::io::{BufReader, ReadBytes};

    use super::{decode_ber_length, read_klv};

    #[test]
    fn verify_ber_short_form() {
        assert_eq!(decode_ber_length(&mut BufReader::new(&[0x00])).unwrap(), 0);
        assert_eq!(decode_ber_length(&mut BufReader::new(&[0x05])).unwrap(), 5);
        assert_eq!(decode_ber_length(&mut BufReader::new(&[0x7f])).unwrap(), 127);
    }

    #[test]
    fn verify_ber_long_form_round_trip() {
        // Each long-form width from 1 to 8 length bytes must invert exactly.
        for width in 1..=8u32 {
            let value = (1u64 << (8 * (width - 1))) | 0x2a;

            let mut encoded = vec![0x80 | width as u8];
            encoded.extend_from_slice(&value.to_be_bytes()[(8 - width as usize)..]);

            let decoded = decode_ber_length(&mut BufReader::new(&encoded)).unwrap();
            assert_eq!(decoded, value, "round trip failed for width {}", width);
        }
    }

    #[test]
    fn verify_ber_rejects_wide_lengths() {
        assert!(decode_ber_length(&mut BufReader::new(&[0x89, 0, 0, 0, 0, 0, 0, 0, 0, 1])).is_err());
        assert!(decode_ber_length(&mut BufReader::new(&[0xff])).is_err());
    }

    #[test]
    fn verify_klv_framing() {
        let mut data = Vec::new();
        data.extend_from_slice(&[0xAB; 16]);
        data.push(0x82);
        data.extend_from_slice(&300u16.to_be_bytes());
        data.extend(std::iter::repeat(0x11).take(300));

        let mut reader = BufReader::new(&data);
        let klv = read_klv(&mut reader).unwrap();

        assert_eq!(klv.key, [0xAB; 16]);
        assert_eq!(klv.offset, 0);
        assert_eq!(klv.length, 300);
        // The cursor rests at the start of the value.
        assert_eq!(reader.pos(), 19);
    }
}
