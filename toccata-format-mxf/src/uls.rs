// Toccata
// Copyright (c) 2026 The Project Toccata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Well-known SMPTE universal labels.
//!
//! Structural metadata set keys share a common 14-byte leader and differ in bytes 14 and 15.
//! Registered data values are published in SMPTE RP224.

use toccata_core::codecs::audio::well_known::{CODEC_ID_PCM_S16BE, CODEC_ID_PCM_S16LE};
use toccata_core::codecs::video::well_known::{CODEC_ID_DVVIDEO, CODEC_ID_MPEG2VIDEO};
use toccata_core::codecs::CodecId;

use crate::klv::Uid;

// Structural metadata set keys.
pub(crate) const PREFACE: Uid =
    [0x06, 0x0e, 0x2b, 0x34, 0x02, 0x53, 0x01, 0x01, 0x0d, 0x01, 0x01, 0x01, 0x01, 0x01, 0x2f, 0x00];
pub(crate) const CONTENT_STORAGE: Uid =
    [0x06, 0x0e, 0x2b, 0x34, 0x02, 0x53, 0x01, 0x01, 0x0d, 0x01, 0x01, 0x01, 0x01, 0x01, 0x18, 0x00];
pub(crate) const SOURCE_PACKAGE: Uid =
    [0x06, 0x0e, 0x2b, 0x34, 0x02, 0x53, 0x01, 0x01, 0x0d, 0x01, 0x01, 0x01, 0x01, 0x01, 0x37, 0x00];
pub(crate) const MATERIAL_PACKAGE: Uid =
    [0x06, 0x0e, 0x2b, 0x34, 0x02, 0x53, 0x01, 0x01, 0x0d, 0x01, 0x01, 0x01, 0x01, 0x01, 0x36, 0x00];
pub(crate) const SEQUENCE: Uid =
    [0x06, 0x0e, 0x2b, 0x34, 0x02, 0x53, 0x01, 0x01, 0x0d, 0x01, 0x01, 0x01, 0x01, 0x01, 0x0f, 0x00];
pub(crate) const SOURCE_CLIP: Uid =
    [0x06, 0x0e, 0x2b, 0x34, 0x02, 0x53, 0x01, 0x01, 0x0d, 0x01, 0x01, 0x01, 0x01, 0x01, 0x11, 0x00];
pub(crate) const TIMECODE_COMPONENT: Uid =
    [0x06, 0x0e, 0x2b, 0x34, 0x02, 0x53, 0x01, 0x01, 0x0d, 0x01, 0x01, 0x01, 0x01, 0x01, 0x14, 0x00];
pub(crate) const MULTIPLE_DESCRIPTOR: Uid =
    [0x06, 0x0e, 0x2b, 0x34, 0x02, 0x53, 0x01, 0x01, 0x0d, 0x01, 0x01, 0x01, 0x01, 0x01, 0x44, 0x00];
pub(crate) const GENERIC_SOUND_DESCRIPTOR: Uid =
    [0x06, 0x0e, 0x2b, 0x34, 0x02, 0x53, 0x01, 0x01, 0x0d, 0x01, 0x01, 0x01, 0x01, 0x01, 0x42, 0x00];
pub(crate) const CDCI_DESCRIPTOR: Uid =
    [0x06, 0x0e, 0x2b, 0x34, 0x02, 0x53, 0x01, 0x01, 0x0d, 0x01, 0x01, 0x01, 0x01, 0x01, 0x28, 0x00];
pub(crate) const MPEG_VIDEO_DESCRIPTOR: Uid =
    [0x06, 0x0e, 0x2b, 0x34, 0x02, 0x53, 0x01, 0x01, 0x0d, 0x01, 0x01, 0x01, 0x01, 0x01, 0x51, 0x00];
pub(crate) const WAVE_DESCRIPTOR: Uid =
    [0x06, 0x0e, 0x2b, 0x34, 0x02, 0x53, 0x01, 0x01, 0x0d, 0x01, 0x01, 0x01, 0x01, 0x01, 0x48, 0x00];
pub(crate) const STATIC_TRACK: Uid =
    [0x06, 0x0e, 0x2b, 0x34, 0x02, 0x53, 0x01, 0x01, 0x0d, 0x01, 0x01, 0x01, 0x01, 0x01, 0x3a, 0x00];
pub(crate) const TRACK: Uid =
    [0x06, 0x0e, 0x2b, 0x34, 0x02, 0x53, 0x01, 0x01, 0x0d, 0x01, 0x01, 0x01, 0x01, 0x01, 0x3b, 0x00];

// Partial keys, matched by prefix.
pub(crate) const HEADER_PARTITION_PACK: [u8; 14] =
    [0x06, 0x0e, 0x2b, 0x34, 0x02, 0x05, 0x01, 0x01, 0x0d, 0x01, 0x02, 0x01, 0x01, 0x02];
pub(crate) const ESSENCE_ELEMENT: [u8; 12] =
    [0x06, 0x0e, 0x2b, 0x34, 0x01, 0x02, 0x01, 0x01, 0x0d, 0x01, 0x03, 0x01];

// Data definition labels for essence tracks (SMPTE RP224).
pub(crate) const PICTURE_ESSENCE_TRACK: Uid =
    [0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x01, 0x01, 0x03, 0x02, 0x02, 0x01, 0x00, 0x00, 0x00];
pub(crate) const SOUND_ESSENCE_TRACK: Uid =
    [0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x01, 0x01, 0x03, 0x02, 0x02, 0x02, 0x00, 0x00, 0x00];

/// Essence codec universal labels, mapping a descriptor's PictureEssenceCoding or
/// SoundEssenceCompression label to a codec ID.
const CODEC_ULS: &[(Uid, CodecId)] = &[
    // PictureEssenceCoding
    ([0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x03, 0x04, 0x01, 0x02, 0x02, 0x01, 0x02, 0x02, 0x00], CodecId::Video(CODEC_ID_MPEG2VIDEO)), // I-Frame
    ([0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x03, 0x04, 0x01, 0x02, 0x02, 0x01, 0x04, 0x03, 0x00], CodecId::Video(CODEC_ID_MPEG2VIDEO)), // Long GoP
    ([0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x03, 0x04, 0x01, 0x02, 0x02, 0x01, 0x02, 0x03, 0x00], CodecId::Video(CODEC_ID_MPEG2VIDEO)), // Long GoP
    ([0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x01, 0x04, 0x01, 0x02, 0x02, 0x01, 0x02, 0x01, 0x05], CodecId::Video(CODEC_ID_MPEG2VIDEO)), // D-10 30Mbps PAL
    ([0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x01, 0x04, 0x01, 0x02, 0x02, 0x01, 0x02, 0x01, 0x01], CodecId::Video(CODEC_ID_MPEG2VIDEO)), // D-10 50Mbps PAL
    ([0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x01, 0x04, 0x01, 0x02, 0x02, 0x02, 0x02, 0x04, 0x00], CodecId::Video(CODEC_ID_DVVIDEO)), // DVCPRO50 PAL
    ([0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x01, 0x04, 0x01, 0x02, 0x02, 0x02, 0x02, 0x02, 0x00], CodecId::Video(CODEC_ID_DVVIDEO)), // DVCPRO25 PAL
    ([0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x01, 0x04, 0x01, 0x02, 0x02, 0x02, 0x01, 0x02, 0x00], CodecId::Video(CODEC_ID_DVVIDEO)), // DV25 IEC PAL
    // SoundEssenceCompression
    ([0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x01, 0x04, 0x02, 0x02, 0x01, 0x7f, 0x00, 0x00, 0x00], CodecId::Audio(CODEC_ID_PCM_S16LE)),
    ([0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x07, 0x04, 0x02, 0x02, 0x01, 0x7e, 0x00, 0x00, 0x00], CodecId::Audio(CODEC_ID_PCM_S16BE)), // From Omneon MXF file
];

/// Look up the codec ID for an essence codec label.
pub(crate) fn codec_id_for_ul(ul: &Uid) -> Option<CodecId> {
    CODEC_ULS.iter().find(|(key, _)| key == ul).map(|(_, id)| *id)
}
