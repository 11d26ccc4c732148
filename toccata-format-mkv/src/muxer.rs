// Toccata
// Copyright (c) 2026 The Project Toccata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::io::SeekFrom;
use std::mem;

use toccata_core::checksum::Md5;
use toccata_core::codecs::audio::well_known::{
    CODEC_ID_AAC, CODEC_ID_FLAC, CODEC_ID_MP2, CODEC_ID_VORBIS,
};
use toccata_core::codecs::video::well_known::{CODEC_ID_MPEG4, CODEC_ID_THEORA};
use toccata_core::codecs::{CodecId, CodecParameters};
use toccata_core::errors::{limit_error, unsupported_error, Result};
use toccata_core::formats::well_known::FORMAT_ID_MKV;
use toccata_core::formats::{
    FormatInfo, FormatWriter, RegisterableWriter, Track, TrackType, WriterFormatData,
    WriterOptions,
};
use toccata_core::io::{MediaSinkStream, WriteBytes};
use toccata_core::packet::Packet;
use toccata_core::units::TimeBase;

use log::{debug, warn};

use crate::codecs::{
    aac_sample_rates, bmp_tag, mkv_codec_id, wav_tag, write_flac_codec_private,
    write_xiph_codec_private, CODEC_ID_AUDIO_ACM, CODEC_ID_VIDEO_VFW_FOURCC,
};
use crate::ebml::{
    end_ebml_master, start_ebml_master, write_ebml_binary, write_ebml_float, write_ebml_string,
    write_ebml_uint, write_ebml_void,
};
use crate::element_ids;
use crate::index::{Cues, SeekHead};

const MKV_FORMAT_INFO: FormatInfo =
    FormatInfo { format: FORMAT_ID_MKV, short_name: "matroska", long_name: "Matroska" };

const MKA_FORMAT_INFO: FormatInfo =
    FormatInfo { format: FORMAT_ID_MKV, short_name: "matroska_audio", long_name: "Matroska Audio" };

/// Start a new cluster once the current one spans this many bytes.
const CLUSTER_MAX_SIZE: u64 = 5 * 1024 * 1024;
/// Start a new cluster once a packet is this many milliseconds past the cluster timecode. Also
/// keeps the 16-bit block timecode offsets from overflowing.
const CLUSTER_MAX_DURATION: u64 = 5000;

/// Matroska timecode scale in nanoseconds per tick; packet timestamps are in milliseconds.
const TIMECODE_SCALE: u64 = 1_000_000;

/// The main seek head indexes level-1 elements only, of which no more than this many are
/// written.
const MAIN_SEEK_HEAD_ENTRIES: usize = 10;

/// Reserved size for the SegmentUID element: a 2-byte ID, a 1-byte size, and 16 bytes of data.
const SEGMENT_UID_RESERVED: u64 = 19;
/// Reserved size for the Duration element: a 2-byte ID, a 1-byte size, and an 8-byte float.
const DURATION_RESERVED: u64 = 11;

/// Block timecodes are 16-bit, so at most 126 tracks fit the 1-byte track number encoding.
const MAX_TRACKS: usize = 126;

/// The identifier written as MuxingApp/WritingApp when the caller does not provide one.
const IDENT: &str = concat!("toccata-format-mkv ", env!("CARGO_PKG_VERSION"));

/// `MkvWriterOptions` controls the behaviour of an `MkvWriter`.
#[derive(Clone, Debug, Default)]
pub struct MkvWriterOptions {
    /// Common writer options.
    pub writer: WriterOptions,
    /// Restrict the container to audio and subtitle tracks (the `matroska_audio` flavour,
    /// usually carrying the `.mka` extension).
    pub audio_only: bool,
}

/// Matroska (MKV/MKA) muxer.
///
/// `MkvWriter` implements a muxer for the Matroska format.
///
/// Incoming packets are grouped into clusters bounded by size and duration. While writing, the
/// muxer maintains two seek heads (one reserved near the start of the segment for level-1
/// elements, one appended near the end for clusters) and a cue index of video keyframes. All
/// three, along with the segment duration and UID, are patched into place when the container is
/// finalized with [`FormatWriter::end`].
pub struct MkvWriter<'s> {
    sink: MediaSinkStream<'s>,
    info: &'static FormatInfo,
    tracks: Vec<Track>,
    /// Patch offset of the Segment master element.
    segment: u64,
    /// The absolute offset of the SegmentUID reservation, unless bit-exact output was requested.
    segment_uid_offset: Option<u64>,
    /// The absolute offset of the Duration reservation.
    duration_offset: u64,
    /// Running maximum of packet pts plus duration, in milliseconds.
    duration: u64,
    /// Patch offset of the current Cluster master element.
    cluster: u64,
    /// The absolute offset of the current Cluster element.
    cluster_pos: u64,
    /// The timecode of the current cluster, in milliseconds.
    cluster_pts: u64,
    main_seek_head: Option<SeekHead>,
    cluster_seek_head: Option<SeekHead>,
    cues: Option<Cues>,
    md5: Md5,
    finalized: bool,
}

impl<'s> MkvWriter<'s> {
    /// Attempt to instantiate a `MkvWriter` for the given tracks, writing the container header
    /// up to and including the start of the first cluster.
    ///
    /// Packet timestamps passed to [`FormatWriter::write`] must be in milliseconds; the timebase
    /// of every track is pinned to 1/1000 accordingly.
    pub fn try_new(
        mut sink: MediaSinkStream<'s>,
        tracks: &[Track],
        opts: MkvWriterOptions,
    ) -> Result<MkvWriter<'s>> {
        if !sink.is_seekable() {
            return unsupported_error("mkv: sink must be seekable");
        }
        if tracks.len() > MAX_TRACKS {
            return limit_error("mkv: too many tracks");
        }

        let mut tracks = tracks.to_vec();

        // Millisecond precision is the de-facto standard timescale for mkv files.
        for track in tracks.iter_mut() {
            if opts.audio_only && track.track_type() == Some(TrackType::Video) {
                return unsupported_error("mkv: video tracks are not allowed in matroska_audio");
            }
            track.with_time_base(TimeBase::new(1, 1000));
        }

        // EBML DocType header.
        let ebml_header = start_ebml_master(&mut sink, element_ids::EBML_HEADER)?;
        write_ebml_uint(&mut sink, element_ids::EBML_VERSION, 1)?;
        write_ebml_uint(&mut sink, element_ids::EBML_READ_VERSION, 1)?;
        write_ebml_uint(&mut sink, element_ids::EBML_MAX_ID_LENGTH, 4)?;
        write_ebml_uint(&mut sink, element_ids::EBML_MAX_SIZE_LENGTH, 8)?;
        write_ebml_string(&mut sink, element_ids::EBML_DOC_TYPE, "matroska")?;
        write_ebml_uint(&mut sink, element_ids::EBML_DOC_TYPE_VERSION, 2)?;
        write_ebml_uint(&mut sink, element_ids::EBML_DOC_TYPE_READ_VERSION, 2)?;
        end_ebml_master(&mut sink, ebml_header)?;

        let segment = start_ebml_master(&mut sink, element_ids::SEGMENT)?;
        let segment_offset = sink.pos();

        // Two seek heads are written: one reserved here to point at every other level-1 element
        // (including the second seek head), and one appended at the end of the file to point at
        // each cluster.
        let mut main_seek_head =
            SeekHead::new(&mut sink, segment_offset, MAIN_SEEK_HEAD_ENTRIES)?;
        let mut cluster_seek_head = SeekHead::new(&mut sink, segment_offset, 0)?;

        main_seek_head.add(element_ids::INFO, sink.pos())?;

        let info = start_ebml_master(&mut sink, element_ids::INFO)?;
        write_ebml_uint(&mut sink, element_ids::TIMECODE_SCALE, TIMECODE_SCALE)?;
        if let Some(title) = &opts.writer.title {
            write_ebml_string(&mut sink, element_ids::TITLE, title)?;
        }

        let mut segment_uid_offset = None;
        if !opts.writer.bit_exact {
            let muxing_app = opts.writer.muxing_app.as_deref().unwrap_or(IDENT);
            let writing_app = opts.writer.writing_app.as_deref().unwrap_or(IDENT);
            write_ebml_string(&mut sink, element_ids::MUXING_APP, muxing_app)?;
            write_ebml_string(&mut sink, element_ids::WRITING_APP, writing_app)?;

            // Reserve space to write the segment UID at finalization.
            segment_uid_offset = Some(sink.pos());
            write_ebml_void(&mut sink, SEGMENT_UID_RESERVED)?;
        }

        // Reserve space for the duration.
        let duration_offset = sink.pos();
        write_ebml_void(&mut sink, DURATION_RESERVED)?;
        end_ebml_master(&mut sink, info)?;

        // Track entries.
        main_seek_head.add(element_ids::TRACKS, sink.pos())?;

        let tracks_elem = start_ebml_master(&mut sink, element_ids::TRACKS)?;
        for (i, track) in tracks.iter().enumerate() {
            write_track_entry(&mut sink, i, track)?;
        }
        end_ebml_master(&mut sink, tracks_elem)?;

        // Open the first cluster.
        cluster_seek_head.add(element_ids::CLUSTER, sink.pos())?;

        let cluster_pos = sink.pos();
        let cluster = start_ebml_master(&mut sink, element_ids::CLUSTER)?;
        write_ebml_uint(&mut sink, element_ids::CLUSTER_TIMECODE, 0)?;

        let cues = Cues::new(segment_offset);

        Ok(MkvWriter {
            sink,
            info: if opts.audio_only { &MKA_FORMAT_INFO } else { &MKV_FORMAT_INFO },
            tracks,
            segment,
            segment_uid_offset,
            duration_offset,
            duration: 0,
            cluster,
            cluster_pos,
            cluster_pts: 0,
            main_seek_head: Some(main_seek_head),
            cluster_seek_head: Some(cluster_seek_head),
            cues: Some(cues),
            md5: Md5::new(),
            finalized: false,
        })
    }

    /// Writes a block element: the block header, the 16-bit timecode offset from the cluster
    /// timecode, the flags, and the packet payload.
    fn write_block(&mut self, block_id: u32, track_num: u64, pkt: &Packet, flags: u8) -> Result<()> {
        debug!(
            "writing block at offset {}, size {}, pts {}, dts {}, duration {}, flags {}",
            self.sink.pos(),
            pkt.data.len(),
            pkt.pts,
            pkt.dts,
            pkt.dur,
            flags
        );

        let timecode = pkt.pts as i64 - self.cluster_pts as i64;

        crate::ebml::write_ebml_id(&mut self.sink, block_id)?;
        crate::ebml::write_ebml_size(&mut self.sink, pkt.data.len() as u64 + 4, 0)?;
        self.sink.write_byte(0x80 | track_num as u8)?;
        self.sink.write_be_i16(timecode as i16)?;
        self.sink.write_byte(flags)?;
        self.sink.write_buf(&pkt.data)
    }
}

/// Writes one TrackEntry element for a track.
fn write_track_entry(sink: &mut MediaSinkStream<'_>, index: usize, track: &Track) -> Result<()> {
    let track_num = index as u64 + 1;

    let track_elem = start_ebml_master(sink, element_ids::TRACK_ENTRY)?;
    write_ebml_uint(sink, element_ids::TRACK_NUMBER, track_num)?;
    write_ebml_uint(sink, element_ids::TRACK_UID, track_num)?;
    write_ebml_uint(sink, element_ids::TRACK_FLAG_LACING, 0)?;
    write_ebml_string(sink, element_ids::TRACK_LANGUAGE, track.language.as_deref().unwrap_or("und"))?;

    let params = match &track.codec_params {
        Some(params) => params,
        None => {
            // A track without codec parameters still occupies a track number, but cannot be
            // described further.
            warn!("mkv: track {} has no codec parameters", track.id);
            return end_ebml_master(sink, track_elem);
        }
    };

    // Prefer a codec ID string specific to Matroska; without one, fall back to the VFW or ACM
    // wrappings below.
    let native_id = mkv_codec_id(params.id());

    if let Some(codec_id) = native_id {
        write_ebml_string(sink, element_ids::CODEC_ID, codec_id)?;
    }

    match params {
        CodecParameters::Video(video) => {
            if native_id.is_some() {
                if params.id() == CodecId::Video(CODEC_ID_THEORA) {
                    let extra = video.extra_data.as_deref().unwrap_or(&[]);
                    write_xiph_codec_private(sink, params.id(), extra)?;
                }
                else if let Some(extra) = &video.extra_data {
                    write_ebml_binary(sink, element_ids::CODEC_PRIVATE, extra)?;
                }
            }
            else {
                // No Matroska-specific codec ID, use VFW mode.
                let fourcc = bmp_tag(video.codec).unwrap_or([0; 4]);

                write_ebml_string(sink, element_ids::CODEC_ID, CODEC_ID_VIDEO_VFW_FOURCC)?;
                let bmp_header = start_ebml_master(sink, element_ids::CODEC_PRIVATE)?;
                crate::riff::write_bmp_header(sink, video, fourcc)?;
                end_ebml_master(sink, bmp_header)?;
            }

            write_ebml_uint(sink, element_ids::TRACK_TYPE, element_ids::TRACK_TYPE_VIDEO)?;

            let subinfo = start_ebml_master(sink, element_ids::TRACK_VIDEO)?;
            write_ebml_uint(sink, element_ids::VIDEO_PIXEL_WIDTH, u64::from(video.width.unwrap_or(0)))?;
            write_ebml_uint(sink, element_ids::VIDEO_PIXEL_HEIGHT, u64::from(video.height.unwrap_or(0)))?;
            if let Some((num, den)) = video.sample_aspect_ratio {
                write_ebml_uint(sink, element_ids::VIDEO_DISPLAY_WIDTH, u64::from(num))?;
                write_ebml_uint(sink, element_ids::VIDEO_DISPLAY_HEIGHT, u64::from(den))?;
            }
            end_ebml_master(sink, subinfo)?;
        }
        CodecParameters::Audio(audio) => {
            let mut sample_rate = audio.sample_rate.unwrap_or(0);
            let mut output_sample_rate = None;

            if params.id() == CodecId::Audio(CODEC_ID_AAC) {
                match aac_sample_rates(audio.extra_data.as_deref().unwrap_or(&[])) {
                    Ok((rate, output_rate)) => {
                        sample_rate = rate;
                        output_sample_rate = output_rate;
                    }
                    Err(err) => warn!("{}", err),
                }
            }

            if native_id.is_some() {
                if params.id() == CodecId::Audio(CODEC_ID_VORBIS) {
                    let extra = audio.extra_data.as_deref().unwrap_or(&[]);
                    write_xiph_codec_private(sink, params.id(), extra)?;
                }
                else if params.id() == CodecId::Audio(CODEC_ID_FLAC) {
                    let extra = audio.extra_data.as_deref().unwrap_or(&[]);
                    write_flac_codec_private(sink, extra)?;
                }
                else if let Some(extra) = &audio.extra_data {
                    write_ebml_binary(sink, element_ids::CODEC_PRIVATE, extra)?;
                }
            }
            else {
                // No Matroska-specific codec ID, use ACM mode.
                let format_tag = match wav_tag(audio.codec) {
                    Some(tag) => tag,
                    None => return unsupported_error("mkv: no codec id found for audio track"),
                };

                write_ebml_string(sink, element_ids::CODEC_ID, CODEC_ID_AUDIO_ACM)?;
                let wav_header = start_ebml_master(sink, element_ids::CODEC_PRIVATE)?;
                crate::riff::write_wav_header(sink, audio, format_tag)?;
                end_ebml_master(sink, wav_header)?;
            }

            write_ebml_uint(sink, element_ids::TRACK_TYPE, element_ids::TRACK_TYPE_AUDIO)?;

            let subinfo = start_ebml_master(sink, element_ids::TRACK_AUDIO)?;
            write_ebml_uint(sink, element_ids::AUDIO_CHANNELS, u64::from(audio.num_channels.unwrap_or(0)))?;
            write_ebml_float(sink, element_ids::AUDIO_SAMPLING_FREQ, f64::from(sample_rate))?;
            if let Some(output_sample_rate) = output_sample_rate {
                write_ebml_float(sink, element_ids::AUDIO_OUT_SAMPLING_FREQ, f64::from(output_sample_rate))?;
            }
            if let Some(bits) = audio.bits_per_sample {
                write_ebml_uint(sink, element_ids::AUDIO_BIT_DEPTH, u64::from(bits))?;
            }
            end_ebml_master(sink, subinfo)?;
        }
        CodecParameters::Subtitle(subtitle) => {
            if native_id.is_some() {
                if let Some(extra) = &subtitle.extra_data {
                    write_ebml_binary(sink, element_ids::CODEC_PRIVATE, extra)?;
                }
            }
            write_ebml_uint(sink, element_ids::TRACK_TYPE, element_ids::TRACK_TYPE_SUBTITLE)?;
        }
        _ => {
            warn!("mkv: only audio, video, and subtitle tracks are supported");
        }
    }

    end_ebml_master(sink, track_elem)
}

impl FormatWriter for MkvWriter<'_> {
    fn format_info(&self) -> &FormatInfo {
        self.info
    }

    fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    fn write(&mut self, pkt: &Packet) -> Result<()> {
        if self.finalized {
            return unsupported_error("mkv: container already finalized");
        }

        let index = match self.tracks.iter().position(|track| track.id == pkt.track_id) {
            Some(index) => index,
            None => return unsupported_error("mkv: unknown track id"),
        };

        let track_type = self.tracks[index].track_type();

        // Start a new cluster every 5 MB or 5 seconds.
        if self.sink.pos() > self.cluster + CLUSTER_MAX_SIZE
            || pkt.pts > self.cluster_pts + CLUSTER_MAX_DURATION
        {
            debug!(
                "starting new cluster at offset {} bytes, pts {}",
                self.sink.pos(),
                pkt.pts
            );

            end_ebml_master(&mut self.sink, self.cluster)?;

            if let Some(cluster_seek_head) = &mut self.cluster_seek_head {
                cluster_seek_head.add(element_ids::CLUSTER, self.sink.pos())?;
            }

            self.cluster_pos = self.sink.pos();
            self.cluster = start_ebml_master(&mut self.sink, element_ids::CLUSTER)?;
            write_ebml_uint(&mut self.sink, element_ids::CLUSTER_TIMECODE, pkt.pts)?;
            self.cluster_pts = pkt.pts;

            // The segment UID is derived from the content: the head of the first packet of each
            // cluster is folded into the digest.
            self.md5.update(&pkt.data[..pkt.data.len().min(200)]);
        }

        let track_num = index as u64 + 1;

        if track_type != Some(TrackType::Subtitle) {
            let flags = u8::from(pkt.key) << 7;
            self.write_block(element_ids::SIMPLE_BLOCK, track_num, pkt, flags)?;
        }
        else {
            let blockgroup = start_ebml_master(&mut self.sink, element_ids::BLOCK_GROUP)?;
            self.write_block(element_ids::BLOCK, track_num, pkt, 0)?;
            write_ebml_uint(&mut self.sink, element_ids::BLOCK_DURATION, pkt.dur)?;
            end_ebml_master(&mut self.sink, blockgroup)?;
        }

        if track_type == Some(TrackType::Video) && pkt.key {
            if let Some(cues) = &mut self.cues {
                cues.add(pkt.pts, track_num as u32, self.cluster_pos);
            }
        }

        self.duration = self.duration.max(pkt.pts + pkt.dur);
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        if self.finalized {
            return Ok(());
        }

        end_ebml_master(&mut self.sink, self.cluster)?;

        let cues_pos = match self.cues.take() {
            Some(cues) => cues.write(&mut self.sink)?,
            None => unreachable!("cues exist until finalization"),
        };
        let second_seek_head_pos = match self.cluster_seek_head.take() {
            Some(seek_head) => seek_head.write(&mut self.sink)?,
            None => unreachable!("cluster seek head exists until finalization"),
        };

        if let Some(mut main_seek_head) = self.main_seek_head.take() {
            main_seek_head.add(element_ids::CUES, cues_pos)?;
            main_seek_head.add(element_ids::SEEK_HEAD, second_seek_head_pos)?;
            main_seek_head.write(&mut self.sink)?;
        }

        // Update the duration.
        debug!("end duration = {}", self.duration);
        let currentpos = self.sink.pos();
        self.sink.seek(SeekFrom::Start(self.duration_offset))?;
        write_ebml_float(&mut self.sink, element_ids::DURATION, self.duration as f64)?;

        // Write the md5 digest of the sampled frames as the segment UID.
        if let Some(segment_uid_offset) = self.segment_uid_offset {
            let segment_uid = mem::take(&mut self.md5).finalize();
            self.sink.seek(SeekFrom::Start(segment_uid_offset))?;
            write_ebml_binary(&mut self.sink, element_ids::SEGMENT_UID, &segment_uid)?;
        }
        self.sink.seek(SeekFrom::Start(currentpos))?;

        end_ebml_master(&mut self.sink, self.segment)?;
        self.sink.flush()?;

        self.finalized = true;
        Ok(())
    }

    fn into_inner<'s>(self: Box<Self>) -> MediaSinkStream<'s>
    where
        Self: 's,
    {
        self.sink
    }
}

impl RegisterableWriter for MkvWriter<'_> {
    fn writer_data() -> &'static [WriterFormatData] {
        &[
            WriterFormatData {
                info: MKV_FORMAT_INFO,
                extensions: &["mkv"],
                mime_types: &["video/x-matroska"],
                default_audio_codec: Some(CODEC_ID_MP2),
                default_video_codec: Some(CODEC_ID_MPEG4),
            },
            WriterFormatData {
                info: MKA_FORMAT_INFO,
                extensions: &["mka"],
                mime_types: &["audio/x-matroska"],
                default_audio_codec: Some(CODEC_ID_MP2),
                default_video_codec: None,
            },
        ]
    }
}
