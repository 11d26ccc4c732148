// Toccata
// Copyright (c) 2026 The Project Toccata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `formats` module provides the traits and support structures necessary to implement media
//! demuxers and muxers.

use std::fmt;

use crate::codecs::audio::AudioCodecId;
use crate::codecs::video::VideoCodecId;
use crate::codecs::CodecParameters;
use crate::errors::Result;
use crate::io::{MediaSinkStream, MediaSourceStream};
use crate::packet::Packet;
use crate::units::{Duration, Time, TimeBase, TimeStamp};

use bitflags::bitflags;

pub mod prelude {
    //! The `formats` module prelude for format reader and writer implementers.

    pub use crate::packet::Packet;
    pub use crate::units::{Duration, TimeBase, TimeStamp};

    pub use super::{
        FormatInfo, FormatOptions, FormatReader, FormatWriter, SeekMode, SeekTo, SeekedTo, Track,
        TrackFlags, TrackType, WriterFormatData, WriterOptions,
    };
}

pub mod probe;

/// A `FormatId` is a unique identifier used to identify a specific container format.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FormatId(u32);

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Null container format.
pub const FORMAT_ID_NULL: FormatId = FormatId(0x0);

/// IDs for well-known container formats.
pub mod well_known {
    use super::FormatId;

    /// Waveform Audio File Format
    pub const FORMAT_ID_WAVE: FormatId = FormatId(0x100);
    /// Audio Video Interleave
    pub const FORMAT_ID_AVI: FormatId = FormatId(0x101);
    /// Ogg
    pub const FORMAT_ID_OGG: FormatId = FormatId(0x102);
    /// ISO Base Media File Format
    pub const FORMAT_ID_ISOMP4: FormatId = FormatId(0x103);
    /// Matroska/WebM
    pub const FORMAT_ID_MKV: FormatId = FormatId(0x104);
    /// Material Exchange Format
    pub const FORMAT_ID_MXF: FormatId = FormatId(0x105);
}

/// Basic information about a container format.
#[derive(Copy, Clone)]
pub struct FormatInfo {
    /// The `FormatId` identifier.
    pub format: FormatId,
    /// A short ASCII-only string identifying the format.
    pub short_name: &'static str,
    /// A longer, more descriptive, string identifying the format.
    pub long_name: &'static str,
}

/// `FormatOptions` is a common set of options that all demuxers use.
#[derive(Copy, Clone, Debug)]
pub struct FormatOptions {
    /// If a `FormatReader` requires a seek index, but the container does not provide one, build
    /// the seek index during instantiation instead of building it progressively. Default:
    /// `false`.
    pub prebuild_seek_index: bool,
    /// If a seek index needs to be built, this value determines how often in seconds of decoded
    /// content an entry is added to the index. Default: `20`.
    pub seek_index_fill_rate: u16,
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatOptions { prebuild_seek_index: false, seek_index_fill_rate: 20 }
    }
}

/// `WriterOptions` is a common set of options that all muxers use.
#[derive(Clone, Debug, Default)]
pub struct WriterOptions {
    /// Produce bit-exact output: no timestamps, identifiers, or other non-deterministic values
    /// are derived from the content or environment. Default: `false`.
    pub bit_exact: bool,
    /// An optional title for the media being written.
    pub title: Option<String>,
    /// An optional name of the application performing the muxing.
    pub muxing_app: Option<String>,
    /// An optional name of the application that produced the content.
    pub writing_app: Option<String>,
}

/// `SeekTo` specifies a position to seek to.
pub enum SeekTo {
    /// Seek to a `Time` in regular time units.
    Time {
        /// The `Time` to seek to.
        time: Time,
        /// If `Some`, specifies which track's timestamp should be returned after the seek. If
        /// `None`, then the default track's timestamp is returned.
        track_id: Option<u32>,
    },
    /// Seek to a track's timestamp in that track's timebase units.
    TimeStamp {
        /// The timestamp to seek to.
        ts: TimeStamp,
        /// Specifies which track `ts` is relative to.
        track_id: u32,
    },
}

/// `SeekedTo` is the result of a seek.
#[derive(Copy, Clone, Debug)]
pub struct SeekedTo {
    /// The track the seek was relative to.
    pub track_id: u32,
    /// The timestamp required for the requested seek.
    pub required_ts: TimeStamp,
    /// The timestamp that was seeked to.
    pub actual_ts: TimeStamp,
}

/// `SeekMode` selects the precision of a seek.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SeekMode {
    /// Coarse seek mode is a best-effort attempt to seek to the requested position.
    Coarse,
    /// Accurate (aka sample-accurate) seek mode will always seek to a position before the
    /// requested position.
    Accurate,
}

bitflags! {
    /// Flags indicating certain attributes about a track.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
    pub struct TrackFlags: u32 {
        /// The track is the default track for its track type.
        const DEFAULT = 1 << 0;
        /// The track should be played even if user or player settings normally wouldn't call
        /// for it.
        const FORCED  = 1 << 1;
    }
}

/// The track type.
#[non_exhaustive]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TrackType {
    /// An audio track.
    Audio,
    /// A video track.
    Video,
    /// A subtitle track.
    Subtitle,
}

/// A `Track` is an independently coded media bitstream. A media format may contain multiple
/// tracks in one container. Each of those tracks are represented by one `Track`.
#[derive(Clone, Debug)]
pub struct Track {
    /// A unique identifier for the track.
    ///
    /// For most formats this is usually the zero-based index of the track, however, some more
    /// complex formats set this differently.
    pub id: u32,
    /// The codec parameters for the track.
    ///
    /// If `None`, the format was unable to determine the codec parameters and the track will be
    /// unplayable.
    pub codec_params: Option<CodecParameters>,
    /// The language of the track. May be unknown or not set.
    pub language: Option<String>,
    /// The timebase of the track.
    ///
    /// The timebase is the length of time in seconds of a single tick of a timestamp or
    /// duration. It can be used to convert any timestamp or duration related to the track into
    /// seconds.
    pub time_base: Option<TimeBase>,
    /// The duration of the track in timebase units.
    pub duration: Option<Duration>,
    /// The timestamp of the first frame in timebase units.
    pub start_ts: TimeStamp,
    /// Flags indicating track attributes.
    pub flags: TrackFlags,
}

impl Track {
    /// Instantiate a new track with a given ID.
    pub fn new(id: u32) -> Self {
        Track {
            id,
            codec_params: None,
            language: None,
            time_base: None,
            duration: None,
            start_ts: 0,
            flags: TrackFlags::empty(),
        }
    }

    /// Provide the codec parameters.
    pub fn with_codec_params(&mut self, codec_params: CodecParameters) -> &mut Self {
        self.codec_params = Some(codec_params);
        self
    }

    /// Provide the track language.
    pub fn with_language(&mut self, language: &str) -> &mut Self {
        self.language = Some(language.to_string());
        self
    }

    /// Provide the `TimeBase`.
    pub fn with_time_base(&mut self, time_base: TimeBase) -> &mut Self {
        self.time_base = Some(time_base);
        self
    }

    /// Provide the duration in timebase units.
    pub fn with_duration(&mut self, duration: Duration) -> &mut Self {
        self.duration = Some(duration);
        self
    }

    /// Provide the timestamp of the first frame.
    pub fn with_start_ts(&mut self, start_ts: TimeStamp) -> &mut Self {
        self.start_ts = start_ts;
        self
    }

    /// Append provided track flags.
    pub fn with_flags(&mut self, flags: TrackFlags) -> &mut Self {
        self.flags |= flags;
        self
    }

    /// Get the type of the track, if the codec parameters are known.
    pub fn track_type(&self) -> Option<TrackType> {
        match self.codec_params {
            Some(CodecParameters::Audio(_)) => Some(TrackType::Audio),
            Some(CodecParameters::Video(_)) => Some(TrackType::Video),
            Some(CodecParameters::Subtitle(_)) => Some(TrackType::Subtitle),
            _ => None,
        }
    }
}

/// A `FormatReader` is a container demuxer. It provides methods to probe a media container for
/// information and access the tracks encapsulated in the container.
///
/// While demuxing, packets are read one-by-one and may be discarded or decoded at the choice of
/// the caller. The contents of a packet is undefined: it may be a frame of video, a millisecond
/// of audio, or a subtitle, but a packet will never contain data from two different bitstreams.
pub trait FormatReader: Send + Sync {
    /// Get basic information about the container format.
    fn format_info(&self) -> &FormatInfo;

    /// Gets a list of tracks in the container.
    fn tracks(&self) -> &[Track];

    /// Get the first track of a certain track type.
    fn first_track(&self, track_type: TrackType) -> Option<&Track> {
        self.tracks().iter().find(|track| track.track_type() == Some(track_type))
    }

    /// Seek, as precisely as possible depending on the mode, to the `Time` or track timestamp
    /// requested. Returns the requested and actual timestamps seeked to.
    fn seek(&mut self, mode: SeekMode, to: SeekTo) -> Result<SeekedTo>;

    /// Read the next packet from the container.
    ///
    /// If `Ok(None)` is returned, the media has ended and no more packets will be produced.
    fn next_packet(&mut self) -> Result<Option<Packet>>;

    /// Consumes the `FormatReader` and returns the underlying media source stream.
    fn into_inner<'s>(self: Box<Self>) -> MediaSourceStream<'s>
    where
        Self: 's;
}

/// A `FormatWriter` is a container muxer. It consumes packets and writes an interleaved,
/// self-describing container to the underlying sink.
///
/// Packets must be provided in monotonically non-decreasing timestamp order. The container is
/// only valid after [`FormatWriter::end`] returns successfully: deferred indices and sizes are
/// written at that point.
pub trait FormatWriter: Send + Sync {
    /// Get basic information about the container format.
    fn format_info(&self) -> &FormatInfo;

    /// Gets the list of tracks being written.
    fn tracks(&self) -> &[Track];

    /// Write a single packet to the container.
    fn write(&mut self, packet: &Packet) -> Result<()>;

    /// Finalize the container. No packets may be written afterwards.
    fn end(&mut self) -> Result<()>;

    /// Consumes the `FormatWriter` and returns the underlying media sink stream.
    fn into_inner<'s>(self: Box<Self>) -> MediaSinkStream<'s>
    where
        Self: 's;
}

/// Muxer-specific registration data.
///
/// A muxer cannot be probed for: it is selected by name, file extension, or MIME type. Each
/// registrable muxer describes itself with one or more of these entries.
#[derive(Copy, Clone)]
pub struct WriterFormatData {
    /// A description of the container format written by the muxer.
    pub info: FormatInfo,
    /// A list of case-insensitive file extensions that are generally used by the format.
    pub extensions: &'static [&'static str],
    /// A list of case-insensitive MIME types that are generally used by the format.
    pub mime_types: &'static [&'static str],
    /// The default audio codec for the format.
    pub default_audio_codec: Option<AudioCodecId>,
    /// The default video codec for the format, if the format accepts video.
    pub default_video_codec: Option<VideoCodecId>,
}

/// To support registration, a `FormatWriter` must implement the `RegisterableWriter` trait.
pub trait RegisterableWriter: FormatWriter {
    /// Returns the registration data of the muxer.
    fn writer_data() -> &'static [WriterFormatData]
    where
        Self: Sized;
}
