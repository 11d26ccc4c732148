// Toccata
// Copyright (c) 2026 The Project Toccata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Codec identifier mappings for the Matroska muxer.
//!
//! Codecs with a native Matroska codec ID are written with it directly. Video codecs without one
//! fall back to the VFW FourCC wrapping, audio codecs to the ACM wrapping, using the legacy AVI
//! and WAVE tag tables.

use log::info;

use toccata_core::codecs::audio::{well_known::*, AudioCodecId};
use toccata_core::codecs::subtitle::well_known::*;
use toccata_core::codecs::video::{well_known::*, VideoCodecId};
use toccata_core::codecs::CodecId;
use toccata_core::errors::{decode_error, Result};
use toccata_core::io::{MediaSinkStream, WriteBytes};

use crate::ebml::{end_ebml_master, start_ebml_master};
use crate::element_ids;
use crate::xiph::{split_xiph_headers, write_xiph_size};

/// Codec ID string for VFW-wrapped video.
pub(crate) const CODEC_ID_VIDEO_VFW_FOURCC: &str = "V_MS/VFW/FOURCC";
/// Codec ID string for ACM-wrapped audio.
pub(crate) const CODEC_ID_AUDIO_ACM: &str = "A_MS/ACM";

/// Native Matroska codec ID strings.
const MKV_CODEC_TAGS: &[(CodecId, &str)] = &[
    // Audio codecs.
    (CodecId::Audio(CODEC_ID_MP1), "A_MPEG/L1"),
    (CodecId::Audio(CODEC_ID_MP2), "A_MPEG/L2"),
    (CodecId::Audio(CODEC_ID_MP3), "A_MPEG/L3"),
    (CodecId::Audio(CODEC_ID_AAC), "A_AAC"),
    (CodecId::Audio(CODEC_ID_AC3), "A_AC3"),
    (CodecId::Audio(CODEC_ID_DCA), "A_DTS"),
    (CodecId::Audio(CODEC_ID_VORBIS), "A_VORBIS"),
    (CodecId::Audio(CODEC_ID_FLAC), "A_FLAC"),
    (CodecId::Audio(CODEC_ID_OPUS), "A_OPUS"),
    (CodecId::Audio(CODEC_ID_PCM_S16LE), "A_PCM/INT/LIT"),
    (CodecId::Audio(CODEC_ID_PCM_S16BE), "A_PCM/INT/BIG"),
    (CodecId::Audio(CODEC_ID_PCM_F32LE), "A_PCM/FLOAT/IEEE"),
    // Video codecs.
    (CodecId::Video(CODEC_ID_MPEG1VIDEO), "V_MPEG1"),
    (CodecId::Video(CODEC_ID_MPEG2VIDEO), "V_MPEG2"),
    (CodecId::Video(CODEC_ID_H264), "V_MPEG4/ISO/AVC"),
    (CodecId::Video(CODEC_ID_HEVC), "V_MPEGH/ISO/HEVC"),
    (CodecId::Video(CODEC_ID_THEORA), "V_THEORA"),
    (CodecId::Video(CODEC_ID_VP8), "V_VP8"),
    (CodecId::Video(CODEC_ID_VP9), "V_VP9"),
    (CodecId::Video(CODEC_ID_AV1), "V_AV1"),
    // Subtitle codecs.
    (CodecId::Subtitle(CODEC_ID_TEXT_UTF8), "S_TEXT/UTF8"),
    (CodecId::Subtitle(CODEC_ID_SSA), "S_TEXT/SSA"),
    (CodecId::Subtitle(CODEC_ID_ASS), "S_TEXT/ASS"),
];

/// Legacy AVI FourCC tags for VFW-wrapped video codecs.
const BMP_TAGS: &[(VideoCodecId, [u8; 4])] = &[
    (CODEC_ID_MPEG4, *b"FMP4"),
    (CODEC_ID_MSMPEG4V3, *b"DIV3"),
    (CODEC_ID_MJPEG, *b"MJPG"),
    (CODEC_ID_DVVIDEO, *b"dvsd"),
    (CODEC_ID_HUFFYUV, *b"HFYU"),
];

/// Legacy WAVE format tags for ACM-wrapped audio codecs.
const WAV_TAGS: &[(AudioCodecId, u16)] = &[
    (CODEC_ID_PCM_S16LE, 0x0001),
    (CODEC_ID_PCM_U8, 0x0001),
    (CODEC_ID_ADPCM_MS, 0x0002),
    (CODEC_ID_PCM_F32LE, 0x0003),
    (CODEC_ID_MP2, 0x0050),
    (CODEC_ID_MP3, 0x0055),
    (CODEC_ID_AAC, 0x00ff),
    (CODEC_ID_WMAV2, 0x0161),
    (CODEC_ID_AC3, 0x2000),
    (CODEC_ID_DCA, 0x2001),
];

/// Get the native Matroska codec ID string for a codec, if there is one.
pub(crate) fn mkv_codec_id(codec: CodecId) -> Option<&'static str> {
    MKV_CODEC_TAGS.iter().find(|(id, _)| *id == codec).map(|(_, s)| *s)
}

/// Get the AVI FourCC tag for a video codec, if there is one.
pub(crate) fn bmp_tag(codec: VideoCodecId) -> Option<[u8; 4]> {
    BMP_TAGS.iter().find(|(id, _)| *id == codec).map(|(_, tag)| *tag)
}

/// Get the WAVE format tag for an audio codec, if there is one.
pub(crate) fn wav_tag(codec: AudioCodecId) -> Option<u16> {
    WAV_TAGS.iter().find(|(id, _)| *id == codec).map(|(_, tag)| *tag)
}

/// AAC sample rates by the 4-bit sampling frequency index of the AudioSpecificConfig.
const AAC_SAMPLE_RATES: [u32; 12] =
    [96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000];

/// Probe an AAC AudioSpecificConfig for the sample rate and, when an SBR extension is signalled,
/// the output sample rate.
pub(crate) fn aac_sample_rates(extradata: &[u8]) -> Result<(u32, Option<u32>)> {
    if extradata.len() < 2 {
        return decode_error("mkv: no aac extradata, unable to determine sample rate");
    }

    // The sampling frequency index sits at bits [3, 7) of the config.
    let sri = ((u32::from(extradata[0]) << 1) & 0xe) | (u32::from(extradata[1]) >> 7);
    if sri > 11 {
        return decode_error("mkv: aac sample rate index out of bounds");
    }
    let sample_rate = AAC_SAMPLE_RATES[sri as usize];

    // With an SBR extension the output sample rate index follows at bits [35, 39).
    let output_sample_rate = if extradata.len() == 5 {
        let sri = (u32::from(extradata[4]) >> 3) & 0xf;
        if sri > 11 {
            return decode_error("mkv: aac output sample rate index out of bounds");
        }
        Some(AAC_SAMPLE_RATES[sri as usize])
    }
    else {
        None
    };

    Ok((sample_rate, output_sample_rate))
}

/// First header sizes used to recognize size-prefixed Xiph extra data.
const VORBIS_FIRST_HEADER_SIZE: usize = 30;
const THEORA_FIRST_HEADER_SIZE: usize = 42;

/// Size of a bare FLAC STREAMINFO block.
const FLAC_STREAMINFO_SIZE: usize = 34;

/// Writes a CodecPrivate element holding the three Xiph setup headers, laced.
pub(crate) fn write_xiph_codec_private(
    sink: &mut MediaSinkStream<'_>,
    codec: CodecId,
    extradata: &[u8],
) -> Result<()> {
    let first_header_size = if codec == CodecId::Audio(CODEC_ID_VORBIS) {
        VORBIS_FIRST_HEADER_SIZE
    }
    else {
        THEORA_FIRST_HEADER_SIZE
    };

    let headers = split_xiph_headers(extradata, first_header_size)?;

    let codec_private = start_ebml_master(sink, element_ids::CODEC_PRIVATE)?;
    // Number of packets minus one.
    sink.write_byte(2)?;
    for header in &headers[..2] {
        write_xiph_size(sink, header.len())?;
    }
    for header in &headers {
        sink.write_buf(header)?;
    }
    end_ebml_master(sink, codec_private)
}

/// Writes a CodecPrivate element holding FLAC stream metadata.
///
/// Extra data larger than a bare STREAMINFO block is assumed to already be in Matroska's layout
/// and is passed through unmodified.
pub(crate) fn write_flac_codec_private(
    sink: &mut MediaSinkStream<'_>,
    extradata: &[u8],
) -> Result<()> {
    if extradata.len() < FLAC_STREAMINFO_SIZE {
        return decode_error("mkv: invalid flac extradata");
    }

    let codec_private = start_ebml_master(sink, element_ids::CODEC_PRIVATE)?;
    if extradata.len() == FLAC_STREAMINFO_SIZE {
        // Only the STREAMINFO packet is present.
        sink.write_byte(0)?;
        write_xiph_size(sink, extradata.len())?;
        info!("flac extradata holds only the streaminfo packet");
    }
    sink.write_buf(extradata)?;
    end_ebml_master(sink, codec_private)
}

#[cfg(test)]
mod tests {
    use toccata_core::codecs::audio::well_known::{CODEC_ID_MP2, CODEC_ID_OPUS};
    use toccata_core::codecs::CodecId;

    use super::{aac_sample_rates, mkv_codec_id, wav_tag};

    #[test]
    fn verify_codec_tag_lookup() {
        assert_eq!(mkv_codec_id(CodecId::Audio(CODEC_ID_MP2)), Some("A_MPEG/L2"));
        assert_eq!(wav_tag(CODEC_ID_MP2), Some(0x0050));
        assert_eq!(wav_tag(CODEC_ID_OPUS), None);
    }

    #[test]
    fn verify_aac_sample_rate_probe() {
        // Object type 2 (LC), sample rate index 4 (44100 Hz), 2 channels.
        let asc = [0x12, 0x10];
        assert_eq!(aac_sample_rates(&asc).unwrap(), (44100, None));

        // HE-AAC signalling: base index 8 (16000 Hz), extension index 5 (32000 Hz) at
        // bits [35, 39).
        let asc = [0x14, 0x00, 0x56, 0xe5, 0x28];
        assert_eq!(aac_sample_rates(&asc).unwrap(), (16000, Some(32000)));

        // Out of range index.
        let asc = [0x1e, 0x90];
        assert!(aac_sample_rates(&asc).is_err());
    }
}
