// Toccata
// Copyright (c) 2026 The Project Toccata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use log::{debug, error, info, warn};

use toccata_core::codecs::audio::well_known::{
    CODEC_ID_PCM_S16BE, CODEC_ID_PCM_S16LE, CODEC_ID_PCM_S24BE, CODEC_ID_PCM_S24LE,
    CODEC_ID_PCM_S32BE, CODEC_ID_PCM_S32LE,
};
use toccata_core::codecs::audio::AudioCodecParameters;
use toccata_core::codecs::video::VideoCodecParameters;
use toccata_core::codecs::{CodecId, CodecParameters};
use toccata_core::errors::{decode_error, is_end_of_stream, seek_error, Result, SeekErrorKind};
use toccata_core::formats::probe::{ProbeFormatData, ProbeableFormat, Score, Scoreable};
use toccata_core::formats::well_known::FORMAT_ID_MXF;
use toccata_core::formats::{
    FormatInfo, FormatOptions, FormatReader, SeekMode, SeekTo, SeekedTo, Track,
};
use toccata_core::io::{MediaSourceStream, ReadBytes};
use toccata_core::packet::Packet;
use toccata_core::support_format;
use toccata_core::units::TimeBase;

use crate::klv::read_klv;
use crate::sets::{ComponentKind, Descriptor, MxfMetadata, PackageKind, PackageSet, TrackSet};
use crate::uls;

const MXF_FORMAT_INFO: FormatInfo = FormatInfo {
    format: FORMAT_ID_MXF,
    short_name: "mxf",
    long_name: "Material Exchange Format (MXF)",
};

const HEADER_PARTITION_PACK_MARKER: &[u8] = &uls::HEADER_PARTITION_PACK;

/// Material Exchange Format (MXF) demultiplexer.
///
/// `MxfReader` implements a demuxer for OP1a MXF files.
///
/// Only tracks with an associated descriptor are exposed ("highly desirable", SMPTE 377M D.1),
/// and only descriptors carrying a SoundEssenceCompression or PictureEssenceCoding label yield a
/// codec ID ("D/req", SMPTE 377M).
pub struct MxfReader<'s> {
    stream: MediaSourceStream<'s>,
    tracks: Vec<Track>,
    /// The essence element track number of each output track, parallel to `tracks`. The last
    /// four bytes of an essence element key select the track it belongs to (SMPTE 379M 7.3).
    track_numbers: Vec<[u8; 4]>,
}

impl<'s> MxfReader<'s> {
    pub fn try_new(mut stream: MediaSourceStream<'s>, _opts: FormatOptions) -> Result<Self> {
        let mut metadata = MxfMetadata::new();

        // Read every KLV packet of the header, dispatching the structural metadata sets by key.
        // The loop terminates at the first essence element, which is rewound so the packet read
        // path sees it again.
        loop {
            let klv = match read_klv(&mut stream) {
                Ok(klv) => klv,
                Err(err) if is_end_of_stream(&err) => break,
                Err(err) => {
                    error!("mxf: error reading KLV packet");
                    return Err(err);
                }
            };

            let key = &klv.key;

            if *key == uls::TRACK || *key == uls::STATIC_TRACK {
                metadata.read_track(&mut stream, &klv)?;
            }
            else if *key == uls::SOURCE_PACKAGE {
                metadata.read_package(&mut stream, &klv, PackageKind::Source)?;
            }
            else if *key == uls::MATERIAL_PACKAGE {
                metadata.read_package(&mut stream, &klv, PackageKind::Material)?;
            }
            else if *key == uls::SEQUENCE {
                metadata.read_sequence(&mut stream, &klv)?;
            }
            else if *key == uls::SOURCE_CLIP {
                metadata.read_structural_component(&mut stream, &klv, ComponentKind::SourceClip)?;
            }
            else if *key == uls::TIMECODE_COMPONENT {
                metadata.read_structural_component(&mut stream, &klv, ComponentKind::Timecode)?;
            }
            else if *key == uls::MULTIPLE_DESCRIPTOR {
                metadata.read_multiple_descriptor(&mut stream, &klv)?;
            }
            else if *key == uls::WAVE_DESCRIPTOR
                || *key == uls::MPEG_VIDEO_DESCRIPTOR
                || *key == uls::CDCI_DESCRIPTOR
                || *key == uls::GENERIC_SOUND_DESCRIPTOR
            {
                metadata.read_descriptor(&mut stream, &klv)?;
            }
            else if *key == uls::PREFACE {
                metadata.read_preface(&mut stream, &klv)?;
            }
            else if *key == uls::CONTENT_STORAGE {
                metadata.read_content_storage(&mut stream, &klv)?;
            }
            else if key[..12] == uls::ESSENCE_ELEMENT {
                // Rewind to the start of the essence element so the first packet read finds it.
                stream.seek_buffered_rev((stream.pos() - klv.offset) as usize);
                break;
            }
            else {
                debug!("mxf: ignoring KLV packet with key {:02x?}", key);
                stream.ignore_bytes(klv.length)?;
            }
        }

        debug!(
            "mxf: operational pattern {:02x?}, content storage {:02x?}",
            metadata.operational_pattern_ul, metadata.content_storage_uid
        );
        debug!(
            "mxf: {} essence container labels, {} essence container data sets",
            metadata.essence_container_uls.len(),
            metadata.essence_container_data_refs.len()
        );

        let package_slots = metadata.resolve();
        let (tracks, track_numbers) = derive_tracks(&metadata, &package_slots)?;

        Ok(MxfReader { stream, tracks, track_numbers })
    }
}

/// Walks the structural metadata from the Material Package down to essence descriptors and
/// produces one output track per fully resolved chain.
fn derive_tracks(
    metadata: &MxfMetadata,
    package_slots: &[Option<usize>],
) -> Result<(Vec<Track>, Vec<[u8; 4]>)> {
    let mut packages = package_slots.iter().filter_map(|slot| slot.map(|i| &metadata.packages[i]));

    let material_package = match packages.find(|package| package.kind == PackageKind::Material) {
        Some(package) => package,
        None => {
            error!("mxf: no material package found");
            return decode_error("mxf: no material package found");
        }
    };

    if packages.any(|package| package.kind == PackageKind::Material) {
        info!("mxf: multiple material packages found, only the first is used");
    }

    let mut tracks = Vec::new();
    let mut track_numbers = Vec::new();

    for slot in &material_package.tracks {
        let material_track = match slot {
            Some(index) => &metadata.tracks[*index],
            None => {
                warn!("mxf: unresolved material track reference");
                continue;
            }
        };

        let sequence = match material_track.sequence {
            Some(index) => &metadata.sequences[index],
            None => {
                warn!("mxf: material track {} has no sequence", material_track.track_id);
                continue;
            }
        };

        // Use the first source clip of the sequence; timecode components and unresolved slots
        // are passed over.
        let component = sequence
            .components
            .iter()
            .filter_map(|slot| slot.map(|i| &metadata.components[i]))
            .find(|component| component.kind == ComponentKind::SourceClip);

        let component = match component {
            Some(component) => component,
            None => {
                debug!("mxf: material track {} has no source clip", material_track.track_id);
                continue;
            }
        };

        let source_package = package_slots
            .iter()
            .filter_map(|slot| slot.map(|i| &metadata.packages[i]))
            .find(|package| package.package_uid == component.source_package_uid);

        let source_package = match source_package {
            Some(package) => package,
            None => {
                error!(
                    "mxf: material track {}: no corresponding source package found",
                    material_track.track_id
                );
                continue;
            }
        };

        let source_track = source_package
            .tracks
            .iter()
            .filter_map(|slot| slot.map(|i| &metadata.tracks[i]))
            .find(|track| track.track_id == component.source_track_id);

        let source_track = match source_track {
            Some(track) => track,
            None => {
                error!(
                    "mxf: material track {}: no corresponding source track found",
                    material_track.track_id
                );
                continue;
            }
        };

        let descriptor = match find_descriptor(metadata, source_package, source_track) {
            Some(descriptor) => descriptor,
            None => {
                info!("mxf: source track {}: no descriptor found", source_track.track_id);
                continue;
            }
        };

        debug!(
            "mxf: source track {}: essence codec {:02x?}, container {:02x?}, sequence duration {}",
            source_track.track_id,
            descriptor.essence_codec_ul,
            descriptor.essence_container_ul,
            sequence.duration
        );

        // The essence kind is declared by the data definition label of the source track's
        // sequence; fall back to the material sequence when the source sequence is unresolved.
        let data_definition_ul = source_track
            .sequence
            .map(|index| &metadata.sequences[index].data_definition_ul)
            .unwrap_or(&sequence.data_definition_ul);

        let mut track = Track::new(source_track.track_id as u32);

        if let Some(params) = make_codec_params(data_definition_ul, descriptor) {
            track.with_codec_params(params);
        }

        let (num, den) = material_track.edit_rate;
        if num > 0 && den > 0 {
            track.with_time_base(TimeBase::new(num, den));
        }

        if component.duration >= 0 {
            track.with_duration(component.duration as u64);
        }
        track.with_start_ts(component.start_position.max(0) as u64);

        tracks.push(track);
        track_numbers.push(source_track.track_number);
    }

    Ok((tracks, track_numbers))
}

/// Selects the descriptor describing a source track: the sub-descriptor of a multiple
/// descriptor whose linked track ID matches, or the package's lone descriptor.
fn find_descriptor<'a>(
    metadata: &'a MxfMetadata,
    package: &PackageSet,
    track: &TrackSet,
) -> Option<&'a Descriptor> {
    let descriptor = &metadata.descriptors[package.descriptor?];

    if !descriptor.sub_descriptor_refs.is_empty() {
        descriptor
            .sub_descriptors
            .iter()
            .filter_map(|slot| slot.map(|i| &metadata.descriptors[i]))
            .find(|sub| sub.linked_track_id == track.track_id)
    }
    else {
        Some(descriptor)
    }
}

/// Builds codec parameters for a resolved chain from its data definition label and descriptor.
fn make_codec_params(
    data_definition_ul: &crate::klv::Uid,
    descriptor: &Descriptor,
) -> Option<CodecParameters> {
    let codec_id = uls::codec_id_for_ul(&descriptor.essence_codec_ul);

    if *data_definition_ul == uls::PICTURE_ESSENCE_TRACK {
        let mut params = VideoCodecParameters::new();

        if let Some(CodecId::Video(id)) = codec_id {
            params.for_codec(id);
        }
        params.with_dimensions(descriptor.width, descriptor.height);

        let (num, den) = descriptor.aspect_ratio;
        if num > 0 && den > 0 {
            params.with_sample_aspect_ratio(num, den);
        }

        Some(CodecParameters::Video(params))
    }
    else if *data_definition_ul == uls::SOUND_ESSENCE_TRACK {
        let mut params = AudioCodecParameters::new();

        if let Some(CodecId::Audio(mut id)) = codec_id {
            // A descriptor may widen 16-bit PCM to a deeper variant.
            if id == CODEC_ID_PCM_S16LE {
                if descriptor.bits_per_sample == 24 {
                    id = CODEC_ID_PCM_S24LE;
                }
                else if descriptor.bits_per_sample == 32 {
                    id = CODEC_ID_PCM_S32LE;
                }
            }
            else if id == CODEC_ID_PCM_S16BE {
                if descriptor.bits_per_sample == 24 {
                    id = CODEC_ID_PCM_S24BE;
                }
                else if descriptor.bits_per_sample == 32 {
                    id = CODEC_ID_PCM_S32BE;
                }
            }
            params.for_codec(id);
        }

        if descriptor.channels > 0 {
            params.with_num_channels(descriptor.channels);
        }
        if descriptor.bits_per_sample > 0 {
            params.with_bits_per_sample(descriptor.bits_per_sample);
        }

        let (num, den) = descriptor.sample_rate;
        if den > 0 {
            params.with_sample_rate(num / den);
        }

        Some(CodecParameters::Audio(params))
    }
    else {
        // Data essence is exposed without codec parameters.
        None
    }
}

impl FormatReader for MxfReader<'_> {
    fn format_info(&self) -> &FormatInfo {
        &MXF_FORMAT_INFO
    }

    fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    fn seek(&mut self, _mode: SeekMode, _to: SeekTo) -> Result<SeekedTo> {
        seek_error(SeekErrorKind::Unseekable)
    }

    fn next_packet(&mut self) -> Result<Option<Packet>> {
        loop {
            let klv = match read_klv(&mut self.stream) {
                Ok(klv) => klv,
                Err(err) if is_end_of_stream(&err) => return Ok(None),
                Err(err) => return Err(err),
            };

            if klv.key[..12] == uls::ESSENCE_ELEMENT {
                let data = self.stream.read_boxed_slice_exact(klv.length as usize)?;

                // Route by the essence element number in the trailing bytes of the key.
                let index = self
                    .track_numbers
                    .iter()
                    .position(|track_number| *track_number == klv.key[12..]);

                return match index {
                    Some(index) => Ok(Some(Packet::new(self.tracks[index].id, 0, 0, data))),
                    None => decode_error("mxf: essence element for an unknown track"),
                };
            }

            // Everything else in the body is filler or repeated metadata.
            self.stream.ignore_bytes(klv.length)?;
        }
    }

    fn into_inner<'s>(self: Box<Self>) -> MediaSourceStream<'s>
    where
        Self: 's,
    {
        self.stream
    }
}

impl Scoreable for MxfReader<'_> {
    fn score(src: &mut MediaSourceStream<'_>) -> Result<Score> {
        // A KLV packet describing an MXF header partition pack must lead the stream.
        let mut header = [0u8; 14];
        src.read_buf_exact(&mut header)?;

        if header == uls::HEADER_PARTITION_PACK {
            Ok(Score::Supported(255))
        }
        else {
            Ok(Score::Unsupported)
        }
    }
}

impl ProbeableFormat<'_> for MxfReader<'_> {
    fn try_probe_new(
        mss: MediaSourceStream<'_>,
        opts: FormatOptions,
    ) -> Result<Box<dyn FormatReader + '_>>
    where
        Self: Sized,
    {
        Ok(Box::new(MxfReader::try_new(mss, opts)?))
    }

    fn probe_data() -> &'static [ProbeFormatData] {
        &[support_format!(
            MXF_FORMAT_INFO,
            &["mxf"],
            &["application/mxf"],
            &[HEADER_PARTITION_PACK_MARKER]
        )]
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rand::rngs::SmallRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    use toccata_core::codecs::audio::well_known::{CODEC_ID_PCM_S16LE, CODEC_ID_PCM_S24LE};
    use toccata_core::codecs::video::well_known::CODEC_ID_MPEG2VIDEO;
    use toccata_core::formats::probe::{Hint, Probe};
    use toccata_core::formats::{FormatOptions, FormatReader};
    use toccata_core::io::MediaSourceStream;
    use toccata_core::units::TimeBase;

    use crate::klv::Uid;
    use crate::uls;

    use super::MxfReader;

    const VIDEO_TRACK_NUMBER: [u8; 4] = [0x15, 0x01, 0x05, 0x01];
    const SOUND_TRACK_NUMBER: [u8; 4] = [0x16, 0x01, 0x01, 0x01];

    /// PictureEssenceCoding label for MPEG-2 I-frame video.
    const MPEG2_IFRAME_UL: Uid =
        [0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x03, 0x04, 0x01, 0x02, 0x02, 0x01, 0x02, 0x02, 0x00];
    /// SoundEssenceCompression label for 16-bit little-endian PCM.
    const PCM_S16LE_UL: Uid =
        [0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x01, 0x04, 0x02, 0x02, 0x01, 0x7f, 0x00, 0x00, 0x00];

    fn uid(n: u8) -> Uid {
        [n; 16]
    }

    fn item(tag: u16, value: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&tag.to_be_bytes());
        out.extend_from_slice(&(value.len() as u16).to_be_bytes());
        out.extend_from_slice(value);
        out
    }

    fn batch(uids: &[Uid]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(uids.len() as u32).to_be_bytes());
        out.extend_from_slice(&16u32.to_be_bytes());
        for uid in uids {
            out.extend_from_slice(uid);
        }
        out
    }

    /// A full 32-byte UMID whose material number (trailing half) is `material`.
    fn umid(material: Uid) -> Vec<u8> {
        let mut out = vec![0x0c; 16];
        out.extend_from_slice(&material);
        out
    }

    fn edit_rate(num: u32, den: u32) -> Vec<u8> {
        // Stored denominator first.
        let mut out = Vec::new();
        out.extend_from_slice(&den.to_be_bytes());
        out.extend_from_slice(&num.to_be_bytes());
        out
    }

    fn klv(key: &[u8; 16], value: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(key);
        out.push(0x82);
        out.extend_from_slice(&(value.len() as u16).to_be_bytes());
        out.extend_from_slice(value);
        out
    }

    fn partition_pack() -> Vec<u8> {
        let mut key = [0u8; 16];
        key[..14].copy_from_slice(&uls::HEADER_PARTITION_PACK);
        key[14] = 0x01;
        key[15] = 0x02;
        klv(&key, &[0u8; 64])
    }

    fn essence_klv(track_number: [u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut key = [0u8; 16];
        key[..12].copy_from_slice(&uls::ESSENCE_ELEMENT);
        key[12..].copy_from_slice(&track_number);
        klv(&key, payload)
    }

    /// Builds the structural metadata of an OP1a file: a material package with a video and a
    /// sound track, each resolving through a source clip to a source package whose multiple
    /// descriptor carries one sub-descriptor per source track.
    fn op1a_sets(with_sound_descriptor: bool, sound_bits: u32) -> Vec<Vec<u8>> {
        let mut sets = Vec::new();

        // Preface.
        let mut body = Vec::new();
        body.extend(item(0x3c0a, &uid(0xa0)));
        body.extend(item(0x3b03, &uid(0xa1)));
        body.extend(item(0x3b09, &uid(0x0d)));
        body.extend(item(0x3b0a, &batch(&[uid(0xa2)])));
        sets.push(klv(&uls::PREFACE, &body));

        // Content storage.
        let mut body = Vec::new();
        body.extend(item(0x3c0a, &uid(0xa1)));
        body.extend(item(0x1901, &batch(&[uid(0xb0), uid(0xb1)])));
        sets.push(klv(&uls::CONTENT_STORAGE, &body));

        // Material package with two tracks.
        let mut body = Vec::new();
        body.extend(item(0x3c0a, &uid(0xb0)));
        body.extend(item(0x4401, &umid(uid(0xba))));
        body.extend(item(0x4403, &batch(&[uid(0xc1), uid(0xc2)])));
        sets.push(klv(&uls::MATERIAL_PACKAGE, &body));

        // Material tracks.
        let mut body = Vec::new();
        body.extend(item(0x3c0a, &uid(0xc1)));
        body.extend(item(0x4801, &1i32.to_be_bytes()));
        body.extend(item(0x4b01, &edit_rate(25, 1)));
        body.extend(item(0x4803, &uid(0xd1)));
        sets.push(klv(&uls::TRACK, &body));

        let mut body = Vec::new();
        body.extend(item(0x3c0a, &uid(0xc2)));
        body.extend(item(0x4801, &2i32.to_be_bytes()));
        body.extend(item(0x4b01, &edit_rate(48000, 1)));
        body.extend(item(0x4803, &uid(0xd2)));
        sets.push(klv(&uls::TRACK, &body));

        // Material sequences. The video sequence leads with a timecode component that the
        // linker must pass over.
        let mut body = Vec::new();
        body.extend(item(0x3c0a, &uid(0xd1)));
        body.extend(item(0x0201, &uls::PICTURE_ESSENCE_TRACK));
        body.extend(item(0x0202, &250i64.to_be_bytes()));
        body.extend(item(0x1001, &batch(&[uid(0xe0), uid(0xe1)])));
        sets.push(klv(&uls::SEQUENCE, &body));

        let mut body = Vec::new();
        body.extend(item(0x3c0a, &uid(0xd2)));
        body.extend(item(0x0201, &uls::SOUND_ESSENCE_TRACK));
        body.extend(item(0x0202, &500i64.to_be_bytes()));
        body.extend(item(0x1001, &batch(&[uid(0xe2)])));
        sets.push(klv(&uls::SEQUENCE, &body));

        // Timecode component referenced by the video sequence.
        let mut body = Vec::new();
        body.extend(item(0x3c0a, &uid(0xe0)));
        body.extend(item(0x0202, &250i64.to_be_bytes()));
        sets.push(klv(&uls::TIMECODE_COMPONENT, &body));

        // Source clips.
        let mut body = Vec::new();
        body.extend(item(0x3c0a, &uid(0xe1)));
        body.extend(item(0x0202, &250i64.to_be_bytes()));
        body.extend(item(0x1201, &10i64.to_be_bytes()));
        body.extend(item(0x1101, &umid(uid(0xbb))));
        body.extend(item(0x1102, &101i32.to_be_bytes()));
        sets.push(klv(&uls::SOURCE_CLIP, &body));

        let mut body = Vec::new();
        body.extend(item(0x3c0a, &uid(0xe2)));
        body.extend(item(0x0202, &500i64.to_be_bytes()));
        body.extend(item(0x1201, &20i64.to_be_bytes()));
        body.extend(item(0x1101, &umid(uid(0xbb))));
        body.extend(item(0x1102, &102i32.to_be_bytes()));
        sets.push(klv(&uls::SOURCE_CLIP, &body));

        // Source package with two tracks and a multiple descriptor.
        let mut body = Vec::new();
        body.extend(item(0x3c0a, &uid(0xb1)));
        body.extend(item(0x4401, &umid(uid(0xbb))));
        body.extend(item(0x4403, &batch(&[uid(0xc3), uid(0xc4)])));
        body.extend(item(0x4701, &uid(0xf0)));
        sets.push(klv(&uls::SOURCE_PACKAGE, &body));

        // Source tracks.
        let mut body = Vec::new();
        body.extend(item(0x3c0a, &uid(0xc3)));
        body.extend(item(0x4801, &101i32.to_be_bytes()));
        body.extend(item(0x4804, &VIDEO_TRACK_NUMBER));
        body.extend(item(0x4b01, &edit_rate(25, 1)));
        body.extend(item(0x4803, &uid(0xd3)));
        sets.push(klv(&uls::TRACK, &body));

        let mut body = Vec::new();
        body.extend(item(0x3c0a, &uid(0xc4)));
        body.extend(item(0x4801, &102i32.to_be_bytes()));
        body.extend(item(0x4804, &SOUND_TRACK_NUMBER));
        body.extend(item(0x4b01, &edit_rate(48000, 1)));
        body.extend(item(0x4803, &uid(0xd4)));
        sets.push(klv(&uls::TRACK, &body));

        // Source sequences declaring the essence kind of each source track.
        let mut body = Vec::new();
        body.extend(item(0x3c0a, &uid(0xd3)));
        body.extend(item(0x0201, &uls::PICTURE_ESSENCE_TRACK));
        sets.push(klv(&uls::SEQUENCE, &body));

        let mut body = Vec::new();
        body.extend(item(0x3c0a, &uid(0xd4)));
        body.extend(item(0x0201, &uls::SOUND_ESSENCE_TRACK));
        sets.push(klv(&uls::SEQUENCE, &body));

        // Multiple descriptor with one sub-descriptor per source track.
        let mut body = Vec::new();
        body.extend(item(0x3c0a, &uid(0xf0)));
        body.extend(item(0x3f01, &batch(&[uid(0xf1), uid(0xf2)])));
        sets.push(klv(&uls::MULTIPLE_DESCRIPTOR, &body));

        // Video descriptor.
        let mut body = Vec::new();
        body.extend(item(0x3c0a, &uid(0xf1)));
        body.extend(item(0x3006, &101i32.to_be_bytes()));
        body.extend(item(0x3203, &1920u32.to_be_bytes()));
        body.extend(item(0x3202, &1080u32.to_be_bytes()));
        body.extend(item(0x320e, &[0, 0, 0, 16, 0, 0, 0, 9]));
        body.extend(item(0x3201, &MPEG2_IFRAME_UL));
        sets.push(klv(&uls::MPEG_VIDEO_DESCRIPTOR, &body));

        // Sound descriptor.
        if with_sound_descriptor {
            let mut body = Vec::new();
            body.extend(item(0x3c0a, &uid(0xf2)));
            body.extend(item(0x3006, &102i32.to_be_bytes()));
            body.extend(item(0x3d07, &2u32.to_be_bytes()));
            body.extend(item(0x3d01, &sound_bits.to_be_bytes()));
            body.extend(item(0x3d03, &[0, 0, 0xbb, 0x80, 0, 0, 0, 1]));
            body.extend(item(0x3d06, &PCM_S16LE_UL));
            sets.push(klv(&uls::GENERIC_SOUND_DESCRIPTOR, &body));
        }

        sets
    }

    fn assemble(sets: &[Vec<u8>], essence: &[Vec<u8>]) -> Vec<u8> {
        let mut file = partition_pack();
        for set in sets {
            file.extend_from_slice(set);
        }
        for element in essence {
            file.extend_from_slice(element);
        }
        file
    }

    fn open(file: Vec<u8>) -> MxfReader<'static> {
        let mss = MediaSourceStream::new(Box::new(Cursor::new(file)), Default::default());
        MxfReader::try_new(mss, FormatOptions::default()).unwrap()
    }

    #[test]
    fn verify_op1a_track_resolution() {
        let reader = open(assemble(&op1a_sets(true, 16), &[]));
        let tracks = reader.tracks();

        assert_eq!(tracks.len(), 2);

        let video = &tracks[0];
        assert_eq!(video.id, 101);
        assert_eq!(video.time_base, Some(TimeBase::new(25, 1)));
        assert_eq!(video.duration, Some(250));
        assert_eq!(video.start_ts, 10);

        let params = video.codec_params.as_ref().unwrap().video().unwrap();
        assert_eq!(params.codec, CODEC_ID_MPEG2VIDEO);
        assert_eq!(params.width, Some(1920));
        assert_eq!(params.height, Some(1080));
        assert_eq!(params.sample_aspect_ratio, Some((16, 9)));

        let audio = &tracks[1];
        assert_eq!(audio.id, 102);
        assert_eq!(audio.time_base, Some(TimeBase::new(48000, 1)));
        assert_eq!(audio.duration, Some(500));
        assert_eq!(audio.start_ts, 20);

        let params = audio.codec_params.as_ref().unwrap().audio().unwrap();
        assert_eq!(params.codec, CODEC_ID_PCM_S16LE);
        assert_eq!(params.num_channels, Some(2));
        assert_eq!(params.bits_per_sample, Some(16));
        assert_eq!(params.sample_rate, Some(48000));
    }

    #[test]
    fn verify_metadata_set_order_is_arbitrary() {
        let mut rng = SmallRng::seed_from_u64(0x6d78_66);

        for _ in 0..8 {
            let mut sets = op1a_sets(true, 16);
            sets.shuffle(&mut rng);

            let reader = open(assemble(&sets, &[]));
            let ids: Vec<u32> = reader.tracks().iter().map(|t| t.id).collect();
            assert_eq!(ids, [101, 102]);
        }
    }

    #[test]
    fn verify_missing_descriptor_drops_track() {
        // Without the sound sub-descriptor only the video chain resolves; the sound track is
        // dropped and parsing continues.
        let reader = open(assemble(&op1a_sets(false, 16), &[]));
        let tracks = reader.tracks();

        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].id, 101);
    }

    #[test]
    fn verify_pcm_promotion() {
        let reader = open(assemble(&op1a_sets(true, 24), &[]));
        let audio = &reader.tracks()[1];

        let params = audio.codec_params.as_ref().unwrap().audio().unwrap();
        assert_eq!(params.codec, CODEC_ID_PCM_S24LE);
        assert_eq!(params.bits_per_sample, Some(24));
    }

    #[test]
    fn verify_essence_routing() {
        let essence = [
            essence_klv(VIDEO_TRACK_NUMBER, &[0x11; 128]),
            essence_klv(SOUND_TRACK_NUMBER, &[0x22; 64]),
            essence_klv(VIDEO_TRACK_NUMBER, &[0x33; 96]),
        ];

        let mut reader = open(assemble(&op1a_sets(true, 16), &essence));

        let pkt = reader.next_packet().unwrap().unwrap();
        assert_eq!(pkt.track_id, 101);
        assert_eq!(&pkt.data[..], &[0x11; 128][..]);

        let pkt = reader.next_packet().unwrap().unwrap();
        assert_eq!(pkt.track_id, 102);
        assert_eq!(&pkt.data[..], &[0x22; 64][..]);

        let pkt = reader.next_packet().unwrap().unwrap();
        assert_eq!(pkt.track_id, 101);
        assert_eq!(&pkt.data[..], &[0x33; 96][..]);

        assert!(reader.next_packet().unwrap().is_none());
    }

    #[test]
    fn verify_missing_material_package_fails_open() {
        // Drop the material package set; the open must fail outright.
        let sets: Vec<Vec<u8>> = op1a_sets(true, 16)
            .into_iter()
            .filter(|set| set[..16] != uls::MATERIAL_PACKAGE)
            .collect();

        let file = assemble(&sets, &[]);
        let mss = MediaSourceStream::new(Box::new(Cursor::new(file)), Default::default());
        assert!(MxfReader::try_new(mss, FormatOptions::default()).is_err());
    }

    #[test]
    fn verify_probe() {
        let mut probe = Probe::new();
        probe.register_format::<MxfReader<'_>>();

        let file = assemble(&op1a_sets(true, 16), &[]);
        let mss = MediaSourceStream::new(Box::new(Cursor::new(file)), Default::default());

        let reader = probe.probe(&Hint::new(), mss, FormatOptions::default()).unwrap();
        assert_eq!(reader.format_info().short_name, "mxf");
        assert_eq!(reader.tracks().len(), 2);
    }
}
