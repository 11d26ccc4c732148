// Toccata
// Copyright (c) 2026 The Project Toccata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Xiph triple-header handling.
//!
//! Vorbis and Theora carry three setup headers in their codec extra data, either Xiph-laced
//! (a leading packet count followed by 255-continued lace sizes) or as 16-bit big-endian
//! size-prefixed blocks. Matroska stores them Xiph-laced inside CodecPrivate.

use toccata_core::errors::{decode_error, Result};
use toccata_core::io::{MediaSinkStream, WriteBytes};

/// Writes a Xiph lace size: one 255-valued byte per full 255 bytes of `size`, terminated by the
/// remainder.
pub(crate) fn write_xiph_size(sink: &mut MediaSinkStream<'_>, size: usize) -> Result<()> {
    for _ in 0..size / 255 {
        sink.write_byte(255)?;
    }
    sink.write_byte((size % 255) as u8)
}

/// Splits codec extra data into the three Xiph setup headers.
///
/// Two layouts are recognized: three 16-bit big-endian size-prefixed headers where the first
/// header has the well-known size `first_header_size`, and the Xiph-laced layout where the
/// first byte is the packet count minus one (always 2) followed by laced sizes for the first
/// two headers.
pub(crate) fn split_xiph_headers(
    extradata: &[u8],
    first_header_size: usize,
) -> Result<[&[u8]; 3]> {
    if extradata.len() >= 6
        && usize::from(u16::from_be_bytes([extradata[0], extradata[1]])) == first_header_size
    {
        // Size-prefixed layout.
        let mut headers = [&extradata[..0]; 3];
        let mut pos = 0;

        for header in headers.iter_mut() {
            if pos + 2 > extradata.len() {
                return decode_error("mkv: xiph extradata corrupt");
            }

            let len = usize::from(u16::from_be_bytes([extradata[pos], extradata[pos + 1]]));
            pos += 2;

            if pos + len > extradata.len() {
                return decode_error("mkv: xiph extradata corrupt");
            }

            *header = &extradata[pos..pos + len];
            pos += len;
        }

        Ok(headers)
    }
    else if extradata.len() >= 3 && extradata[0] == 2 {
        // Xiph-laced layout. The sizes of the first two headers are laced, the third runs to
        // the end of the extra data.
        let mut lens = [0usize; 2];
        let mut pos = 1;

        for len in lens.iter_mut() {
            loop {
                if pos >= extradata.len() {
                    return decode_error("mkv: xiph extradata corrupt");
                }

                let byte = extradata[pos];
                pos += 1;
                *len += usize::from(byte);

                if byte != 255 {
                    break;
                }
            }
        }

        if pos + lens[0] + lens[1] > extradata.len() {
            return decode_error("mkv: xiph extradata corrupt");
        }

        let first = &extradata[pos..pos + lens[0]];
        let second = &extradata[pos + lens[0]..pos + lens[0] + lens[1]];
        let third = &extradata[pos + lens[0] + lens[1]..];

        Ok([first, second, third])
    }
    else {
        decode_error("mkv: xiph extradata corrupt")
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use toccata_core::io::MediaSinkStream;

    use super::{split_xiph_headers, write_xiph_size};

    fn laced_extradata(lens: [usize; 3]) -> Vec<u8> {
        let mut extra = vec![2u8];
        for len in &lens[..2] {
            let mut len = *len;
            while len >= 255 {
                extra.push(255);
                len -= 255;
            }
            extra.push(len as u8);
        }
        for (i, len) in lens.iter().enumerate() {
            extra.extend(std::iter::repeat((i + 1) as u8).take(*len));
        }
        extra
    }

    #[test]
    fn verify_split_laced() {
        let extra = laced_extradata([30, 17, 3900]);
        let headers = split_xiph_headers(&extra, 30).unwrap();

        assert_eq!(headers[0].len(), 30);
        assert_eq!(headers[1].len(), 17);
        assert_eq!(headers[2].len(), 3900);
        assert!(headers[0].iter().all(|&b| b == 1));
        assert!(headers[2].iter().all(|&b| b == 3));
    }

    #[test]
    fn verify_split_size_prefixed() {
        let mut extra = Vec::new();
        for (len, fill) in [(30u16, 1u8), (17, 2), (128, 3)] {
            extra.extend_from_slice(&len.to_be_bytes());
            extra.extend(std::iter::repeat(fill).take(usize::from(len)));
        }

        let headers = split_xiph_headers(&extra, 30).unwrap();
        assert_eq!(headers[0].len(), 30);
        assert_eq!(headers[1].len(), 17);
        assert_eq!(headers[2].len(), 128);
    }

    #[test]
    fn verify_split_rejects_corrupt() {
        assert!(split_xiph_headers(&[], 30).is_err());
        assert!(split_xiph_headers(&[2, 200, 200], 30).is_err());

        // Laced size runs past the end of the extra data.
        let mut extra = laced_extradata([30, 17, 100]);
        extra.truncate(60);
        assert!(split_xiph_headers(&extra, 30).is_err());
    }

    #[test]
    fn verify_lace_sizes() {
        let mut buf = Vec::new();
        let mut sink = MediaSinkStream::new(Box::new(Cursor::new(&mut buf)));
        write_xiph_size(&mut sink, 30).unwrap();
        write_xiph_size(&mut sink, 3900).unwrap();
        sink.into_inner().unwrap();

        assert_eq!(buf[0], 30);
        assert_eq!(buf[1..16], [255u8; 15]);
        assert_eq!(buf[16], 75);
        assert_eq!(buf.len(), 17);
    }
}
