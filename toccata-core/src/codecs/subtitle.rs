// Toccata
// Copyright (c) 2026 The Project Toccata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subtitle codec specific support.

use std::fmt;

/// A `SubtitleCodecId` is a unique identifier used to identify a specific subtitle codec.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubtitleCodecId(u32);

/// Null subtitle codec ID.
pub const CODEC_ID_NULL_SUBTITLE: SubtitleCodecId = SubtitleCodecId(0x0);

impl Default for SubtitleCodecId {
    fn default() -> Self {
        CODEC_ID_NULL_SUBTITLE
    }
}

impl fmt::Display for SubtitleCodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Codec parameters for subtitle codecs.
#[derive(Clone, Debug, Default)]
pub struct SubtitleCodecParameters {
    /// The codec ID.
    pub codec: SubtitleCodecId,
    /// Extra data (defined by the codec).
    pub extra_data: Option<Box<[u8]>>,
}

impl SubtitleCodecParameters {
    pub fn new() -> SubtitleCodecParameters {
        Default::default()
    }

    /// Provide the `SubtitleCodecId`.
    pub fn for_codec(&mut self, codec: SubtitleCodecId) -> &mut Self {
        self.codec = codec;
        self
    }

    /// Provide codec extra data.
    pub fn with_extra_data(&mut self, data: impl Into<Box<[u8]>>) -> &mut Self {
        self.extra_data = Some(data.into());
        self
    }
}

/// Codec IDs for well-known subtitle codecs.
pub mod well_known {
    use super::SubtitleCodecId;

    /// UTF-8 plain text
    pub const CODEC_ID_TEXT_UTF8: SubtitleCodecId = SubtitleCodecId(0x100);
    /// SubStation Alpha
    pub const CODEC_ID_SSA: SubtitleCodecId = SubtitleCodecId(0x101);
    /// Advanced SubStation Alpha
    pub const CODEC_ID_ASS: SubtitleCodecId = SubtitleCodecId(0x102);
}
