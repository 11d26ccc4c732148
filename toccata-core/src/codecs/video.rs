// Toccata
// Copyright (c) 2026 The Project Toccata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Video codec specific support.

use std::fmt;

/// A `VideoCodecId` is a unique identifier used to identify a specific video codec.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VideoCodecId(u32);

/// Null video codec ID.
pub const CODEC_ID_NULL_VIDEO: VideoCodecId = VideoCodecId(0x0);

impl Default for VideoCodecId {
    fn default() -> Self {
        CODEC_ID_NULL_VIDEO
    }
}

impl fmt::Display for VideoCodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Codec parameters for video codecs.
#[derive(Clone, Debug, Default)]
pub struct VideoCodecParameters {
    /// The codec ID.
    pub codec: VideoCodecId,
    /// Video width in pixels.
    pub width: Option<u32>,
    /// Video height in pixels.
    pub height: Option<u32>,
    /// Sample (pixel) aspect ratio as a numerator and denominator pair.
    pub sample_aspect_ratio: Option<(u32, u32)>,
    /// Extra data (defined by the codec).
    pub extra_data: Option<Box<[u8]>>,
}

impl VideoCodecParameters {
    pub fn new() -> VideoCodecParameters {
        Default::default()
    }

    /// Provide the `VideoCodecId`.
    pub fn for_codec(&mut self, codec: VideoCodecId) -> &mut Self {
        self.codec = codec;
        self
    }

    /// Provide the video frame dimensions in pixels.
    pub fn with_dimensions(&mut self, width: u32, height: u32) -> &mut Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Provide the sample aspect ratio.
    pub fn with_sample_aspect_ratio(&mut self, num: u32, den: u32) -> &mut Self {
        self.sample_aspect_ratio = Some((num, den));
        self
    }

    /// Provide codec extra data.
    pub fn with_extra_data(&mut self, data: impl Into<Box<[u8]>>) -> &mut Self {
        self.extra_data = Some(data.into());
        self
    }
}

/// Codec IDs for well-known video codecs.
pub mod well_known {
    use super::VideoCodecId;

    // MPEG codecs

    /// MPEG-1 Video
    pub const CODEC_ID_MPEG1VIDEO: VideoCodecId = VideoCodecId(0x100);
    /// MPEG-2 Video
    pub const CODEC_ID_MPEG2VIDEO: VideoCodecId = VideoCodecId(0x101);
    /// MPEG-4 Part 2 Visual
    pub const CODEC_ID_MPEG4: VideoCodecId = VideoCodecId(0x102);
    /// Advanced Video Coding (H.264)
    pub const CODEC_ID_H264: VideoCodecId = VideoCodecId(0x103);
    /// High Efficiency Video Coding (H.265)
    pub const CODEC_ID_HEVC: VideoCodecId = VideoCodecId(0x104);

    // Xiph / open codecs

    /// Theora
    pub const CODEC_ID_THEORA: VideoCodecId = VideoCodecId(0x200);
    /// VP8
    pub const CODEC_ID_VP8: VideoCodecId = VideoCodecId(0x201);
    /// VP9
    pub const CODEC_ID_VP9: VideoCodecId = VideoCodecId(0x202);
    /// AOMedia Video 1 (AV1)
    pub const CODEC_ID_AV1: VideoCodecId = VideoCodecId(0x203);

    // Legacy / intermediate codecs

    /// Motion JPEG
    pub const CODEC_ID_MJPEG: VideoCodecId = VideoCodecId(0x300);
    /// DV Video
    pub const CODEC_ID_DVVIDEO: VideoCodecId = VideoCodecId(0x301);
    /// Microsoft MPEG-4 Version 3
    pub const CODEC_ID_MSMPEG4V3: VideoCodecId = VideoCodecId(0x302);
    /// Huffyuv lossless
    pub const CODEC_ID_HUFFYUV: VideoCodecId = VideoCodecId(0x303);
}
