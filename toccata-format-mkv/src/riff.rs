// Toccata
// Copyright (c) 2026 The Project Toccata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Writers for the RIFF structures Matroska embeds when a codec has no native codec ID: a
//! BITMAPINFOHEADER for VFW-wrapped video, and a WAVEFORMATEX for ACM-wrapped audio. Both
//! structures are little-endian.

use toccata_core::codecs::audio::AudioCodecParameters;
use toccata_core::codecs::video::VideoCodecParameters;
use toccata_core::errors::Result;
use toccata_core::io::{MediaSinkStream, WriteBytes};

/// Size of a BITMAPINFOHEADER without appended extra data.
const BITMAPINFOHEADER_SIZE: u32 = 40;

/// Writes a BITMAPINFOHEADER followed by the codec extra data.
pub(crate) fn write_bmp_header(
    sink: &mut MediaSinkStream<'_>,
    params: &VideoCodecParameters,
    fourcc: [u8; 4],
) -> Result<()> {
    let width = params.width.unwrap_or(0);
    let height = params.height.unwrap_or(0);
    let extra = params.extra_data.as_deref().unwrap_or(&[]);

    sink.write_u32(BITMAPINFOHEADER_SIZE + extra.len() as u32)?;
    sink.write_i32(width as i32)?;
    sink.write_i32(height as i32)?;
    sink.write_u16(1)?; // planes
    sink.write_u16(24)?; // bit count
    sink.write_buf(&fourcc)?; // compression
    sink.write_u32(width * height * 3)?; // image size
    sink.write_u32(0)?; // horizontal pixels per meter
    sink.write_u32(0)?; // vertical pixels per meter
    sink.write_u32(0)?; // colors used
    sink.write_u32(0)?; // important colors
    sink.write_buf(extra)
}

/// Writes a WAVEFORMATEX followed by the codec extra data.
pub(crate) fn write_wav_header(
    sink: &mut MediaSinkStream<'_>,
    params: &AudioCodecParameters,
    format_tag: u16,
) -> Result<()> {
    let channels = params.num_channels.unwrap_or(0);
    let sample_rate = params.sample_rate.unwrap_or(0);
    let bits_per_sample = params.bits_per_sample.unwrap_or(0);
    let extra = params.extra_data.as_deref().unwrap_or(&[]);

    // Block alignment and byte rate can only be derived for fixed-size sample formats.
    let block_align = (channels * bits_per_sample) / 8;
    let avg_bytes_per_sec = sample_rate * block_align;

    sink.write_u16(format_tag)?;
    sink.write_u16(channels as u16)?;
    sink.write_u32(sample_rate)?;
    sink.write_u32(avg_bytes_per_sec)?;
    sink.write_u16(block_align as u16)?;
    sink.write_u16(bits_per_sample as u16)?;
    sink.write_u16(extra.len() as u16)?;
    sink.write_buf(extra)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use toccata_core::codecs::audio::AudioCodecParameters;
    use toccata_core::codecs::video::VideoCodecParameters;
    use toccata_core::io::MediaSinkStream;

    use super::{write_bmp_header, write_wav_header};

    #[test]
    fn verify_bmp_header_layout() {
        let mut params = VideoCodecParameters::new();
        params.with_dimensions(640, 480);

        let mut buf = Vec::new();
        let mut sink = MediaSinkStream::new(Box::new(Cursor::new(&mut buf)));
        write_bmp_header(&mut sink, &params, *b"FMP4").unwrap();
        sink.into_inner().unwrap();

        assert_eq!(buf.len(), 40);
        assert_eq!(&buf[0..4], &40u32.to_le_bytes());
        assert_eq!(&buf[4..8], &640u32.to_le_bytes());
        assert_eq!(&buf[8..12], &480u32.to_le_bytes());
        assert_eq!(&buf[16..20], b"FMP4");
    }

    #[test]
    fn verify_wav_header_layout() {
        let mut params = AudioCodecParameters::new();
        params
            .with_sample_rate(44100)
            .with_num_channels(2)
            .with_bits_per_sample(16)
            .with_extra_data(vec![0xAB, 0xCD]);

        let mut buf = Vec::new();
        let mut sink = MediaSinkStream::new(Box::new(Cursor::new(&mut buf)));
        write_wav_header(&mut sink, &params, 0x0001).unwrap();
        sink.into_inner().unwrap();

        assert_eq!(buf.len(), 18 + 2);
        assert_eq!(&buf[0..2], &1u16.to_le_bytes());
        assert_eq!(&buf[2..4], &2u16.to_le_bytes());
        assert_eq!(&buf[4..8], &44100u32.to_le_bytes());
        // avg bytes/sec = rate * channels * bits / 8
        assert_eq!(&buf[8..12], &176_400u32.to_le_bytes());
        assert_eq!(&buf[12..14], &4u16.to_le_bytes());
        assert_eq!(&buf[14..16], &16u16.to_le_bytes());
        assert_eq!(&buf[16..18], &2u16.to_le_bytes());
        assert_eq!(&buf[18..], &[0xAB, 0xCD]);
    }
}
