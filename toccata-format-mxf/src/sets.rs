// Toccata
// Copyright (c) 2026 The Project Toccata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Structural metadata sets.
//!
//! Each metadata KLV in the header is a local set: a sequence of 2-byte tag / 2-byte length
//! items. Sets reference one another by 16-byte instance UID and arrive in arbitrary order, so
//! they are accumulated into one arena per set kind while reading and every strong reference is
//! resolved in a single post-pass once the header has been consumed. Unresolvable references are
//! tolerated; the affected chain is dropped when output tracks are derived.

use std::collections::HashMap;

use log::debug;

use toccata_core::errors::{decode_error, Result};
use toccata_core::io::{MediaSourceStream, ReadBytes};

use crate::klv::{KlvPacket, Uid};

/// Batch counts at or above this are implausible for any real file and treated as malformed.
const MAX_BATCH_COUNT: u32 = u32::MAX / 16;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum PackageKind {
    Material,
    Source,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum ComponentKind {
    Timecode,
    SourceClip,
}

/// A structural component of a sequence: a source clip referencing a track in another package,
/// or an uninterpreted timecode component.
pub(crate) struct StructuralComponent {
    pub uid: Uid,
    pub kind: ComponentKind,
    pub duration: i64,
    pub start_position: i64,
    /// The referenced package's UMID material number (the trailing half of the UMID).
    pub source_package_uid: Uid,
    pub source_track_id: i32,
}

impl StructuralComponent {
    fn new(kind: ComponentKind) -> Self {
        StructuralComponent {
            uid: Uid::default(),
            kind,
            duration: 0,
            start_position: 0,
            source_package_uid: Uid::default(),
            source_track_id: 0,
        }
    }
}

/// A sequence of structural components. Belongs to exactly one track.
#[derive(Default)]
pub(crate) struct Sequence {
    pub uid: Uid,
    pub data_definition_ul: Uid,
    pub duration: i64,
    pub component_refs: Vec<Uid>,
    /// Resolved component arena indices, parallel to `component_refs`.
    pub components: Vec<Option<usize>>,
}

/// A timeline or static track. Belongs to exactly one package.
#[derive(Default)]
pub(crate) struct TrackSet {
    pub uid: Uid,
    pub track_id: i32,
    /// Links the track to its essence element KLVs, whose keys end in this value.
    pub track_number: [u8; 4],
    /// The edit rate as a (numerator, denominator) pair.
    pub edit_rate: (u32, u32),
    pub sequence_ref: Uid,
    /// Resolved sequence arena index.
    pub sequence: Option<usize>,
}

/// A file descriptor carrying the coding parameters of one essence stream, or a multiple
/// descriptor aggregating sub-descriptors.
#[derive(Default)]
pub(crate) struct Descriptor {
    pub uid: Uid,
    pub essence_container_ul: Uid,
    pub essence_codec_ul: Uid,
    /// The sample rate as a (numerator, denominator) pair.
    pub sample_rate: (u32, u32),
    pub aspect_ratio: (u32, u32),
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    pub bits_per_sample: u32,
    pub linked_track_id: i32,
    pub sub_descriptor_refs: Vec<Uid>,
    /// Resolved sub-descriptor arena indices, parallel to `sub_descriptor_refs`.
    pub sub_descriptors: Vec<Option<usize>>,
}

/// A material or source package.
pub(crate) struct PackageSet {
    pub uid: Uid,
    /// The trailing half of the package UMID; source clips reference packages by this value.
    pub package_uid: Uid,
    pub kind: PackageKind,
    pub track_refs: Vec<Uid>,
    /// Resolved track arena indices, parallel to `track_refs`.
    pub tracks: Vec<Option<usize>>,
    pub descriptor_ref: Option<Uid>,
    /// Resolved descriptor arena index.
    pub descriptor: Option<usize>,
}

impl PackageSet {
    fn new(kind: PackageKind) -> Self {
        PackageSet {
            uid: Uid::default(),
            package_uid: Uid::default(),
            kind,
            track_refs: Vec::new(),
            tracks: Vec::new(),
            descriptor_ref: None,
            descriptor: None,
        }
    }
}

/// All structural metadata read from the header, one arena per set kind.
#[derive(Default)]
pub(crate) struct MxfMetadata {
    /// Package references declared by the content storage set, in declaration order.
    pub package_refs: Vec<Uid>,
    pub packages: Vec<PackageSet>,
    pub tracks: Vec<TrackSet>,
    pub sequences: Vec<Sequence>,
    pub components: Vec<StructuralComponent>,
    pub descriptors: Vec<Descriptor>,
    pub essence_container_data_refs: Vec<Uid>,
    pub essence_container_uls: Vec<Uid>,
    pub operational_pattern_ul: Uid,
    pub content_storage_uid: Uid,
}

impl MxfMetadata {
    pub(crate) fn new() -> Self {
        Default::default()
    }

    pub(crate) fn read_preface(
        &mut self,
        stream: &mut MediaSourceStream<'_>,
        klv: &KlvPacket,
    ) -> Result<()> {
        let mut set = LocalSetReader::new(stream, klv.length);

        while let Some((tag, size)) = set.next_item()? {
            match tag {
                0x3b03 => self.content_storage_uid = read_uid(set.stream)?,
                0x3b09 => self.operational_pattern_ul = read_uid(set.stream)?,
                0x3b0a => self.essence_container_uls = read_batch(set.stream)?,
                _ => set.skip(size)?,
            }
        }
        Ok(())
    }

    pub(crate) fn read_content_storage(
        &mut self,
        stream: &mut MediaSourceStream<'_>,
        klv: &KlvPacket,
    ) -> Result<()> {
        let mut set = LocalSetReader::new(stream, klv.length);

        while let Some((tag, size)) = set.next_item()? {
            match tag {
                0x1901 => self.package_refs = read_batch(set.stream)?,
                0x1902 => self.essence_container_data_refs = read_batch(set.stream)?,
                _ => set.skip(size)?,
            }
        }
        Ok(())
    }

    pub(crate) fn read_package(
        &mut self,
        stream: &mut MediaSourceStream<'_>,
        klv: &KlvPacket,
        kind: PackageKind,
    ) -> Result<()> {
        let mut set = LocalSetReader::new(stream, klv.length);
        let mut package = PackageSet::new(kind);

        while let Some((tag, size)) = set.next_item()? {
            match tag {
                0x3c0a => package.uid = read_uid(set.stream)?,
                0x4403 => package.track_refs = read_batch(set.stream)?,
                0x4401 => package.package_uid = read_umid(set.stream)?,
                0x4701 => package.descriptor_ref = Some(read_uid(set.stream)?),
                _ => set.skip(size)?,
            }
        }

        self.packages.push(package);
        Ok(())
    }

    pub(crate) fn read_track(
        &mut self,
        stream: &mut MediaSourceStream<'_>,
        klv: &KlvPacket,
    ) -> Result<()> {
        let mut set = LocalSetReader::new(stream, klv.length);
        let mut track = TrackSet::default();

        while let Some((tag, size)) = set.next_item()? {
            match tag {
                0x3c0a => track.uid = read_uid(set.stream)?,
                0x4801 => track.track_id = set.stream.read_be_i32()?,
                0x4804 => set.stream.read_buf_exact(&mut track.track_number)?,
                0x4b01 => {
                    // The edit rate is stored denominator first.
                    track.edit_rate.1 = set.stream.read_be_u32()?;
                    track.edit_rate.0 = set.stream.read_be_u32()?;
                }
                0x4803 => track.sequence_ref = read_uid(set.stream)?,
                _ => set.skip(size)?,
            }
        }

        self.tracks.push(track);
        Ok(())
    }

    pub(crate) fn read_sequence(
        &mut self,
        stream: &mut MediaSourceStream<'_>,
        klv: &KlvPacket,
    ) -> Result<()> {
        let mut set = LocalSetReader::new(stream, klv.length);
        let mut sequence = Sequence::default();

        while let Some((tag, size)) = set.next_item()? {
            match tag {
                0x3c0a => sequence.uid = read_uid(set.stream)?,
                0x0202 => sequence.duration = set.stream.read_be_i64()?,
                0x0201 => sequence.data_definition_ul = read_uid(set.stream)?,
                0x1001 => sequence.component_refs = read_batch(set.stream)?,
                _ => set.skip(size)?,
            }
        }

        self.sequences.push(sequence);
        Ok(())
    }

    pub(crate) fn read_structural_component(
        &mut self,
        stream: &mut MediaSourceStream<'_>,
        klv: &KlvPacket,
        kind: ComponentKind,
    ) -> Result<()> {
        let mut set = LocalSetReader::new(stream, klv.length);
        let mut component = StructuralComponent::new(kind);

        while let Some((tag, size)) = set.next_item()? {
            match tag {
                0x3c0a => component.uid = read_uid(set.stream)?,
                0x0202 => component.duration = set.stream.read_be_i64()?,
                0x1201 => component.start_position = set.stream.read_be_i64()?,
                0x1101 => component.source_package_uid = read_umid(set.stream)?,
                0x1102 => component.source_track_id = set.stream.read_be_i32()?,
                _ => set.skip(size)?,
            }
        }

        self.components.push(component);
        Ok(())
    }

    pub(crate) fn read_descriptor(
        &mut self,
        stream: &mut MediaSourceStream<'_>,
        klv: &KlvPacket,
    ) -> Result<()> {
        let mut set = LocalSetReader::new(stream, klv.length);
        let mut descriptor = Descriptor::default();

        while let Some((tag, size)) = set.next_item()? {
            match tag {
                0x3c0a => descriptor.uid = read_uid(set.stream)?,
                0x3004 => descriptor.essence_container_ul = read_uid(set.stream)?,
                0x3006 => descriptor.linked_track_id = set.stream.read_be_i32()?,
                // PictureEssenceCoding and SoundEssenceCompression.
                0x3201 | 0x3d06 => descriptor.essence_codec_ul = read_uid(set.stream)?,
                0x3203 => descriptor.width = set.stream.read_be_u32()?,
                0x3202 => descriptor.height = set.stream.read_be_u32()?,
                0x320e => {
                    descriptor.aspect_ratio.0 = set.stream.read_be_u32()?;
                    descriptor.aspect_ratio.1 = set.stream.read_be_u32()?;
                }
                0x3d03 => {
                    descriptor.sample_rate.0 = set.stream.read_be_u32()?;
                    descriptor.sample_rate.1 = set.stream.read_be_u32()?;
                }
                0x3d07 => descriptor.channels = set.stream.read_be_u32()?,
                0x3d01 => descriptor.bits_per_sample = set.stream.read_be_u32()?,
                _ => set.skip(size)?,
            }
        }

        self.descriptors.push(descriptor);
        Ok(())
    }

    pub(crate) fn read_multiple_descriptor(
        &mut self,
        stream: &mut MediaSourceStream<'_>,
        klv: &KlvPacket,
    ) -> Result<()> {
        let mut set = LocalSetReader::new(stream, klv.length);
        let mut descriptor = Descriptor::default();

        while let Some((tag, size)) = set.next_item()? {
            match tag {
                0x3c0a => descriptor.uid = read_uid(set.stream)?,
                0x3f01 => descriptor.sub_descriptor_refs = read_batch(set.stream)?,
                _ => set.skip(size)?,
            }
        }

        self.descriptors.push(descriptor);
        Ok(())
    }

    /// Resolve every recorded strong reference against the arenas.
    ///
    /// Returns the content storage package list with each slot resolved to a package arena
    /// index. Any reference whose target set was never read leaves a `None` slot behind; the
    /// chain it belongs to is dropped later when output tracks are derived.
    pub(crate) fn resolve(&mut self) -> Vec<Option<usize>> {
        let packages_by_uid: HashMap<Uid, usize> =
            self.packages.iter().enumerate().map(|(i, p)| (p.uid, i)).collect();
        let tracks_by_uid: HashMap<Uid, usize> =
            self.tracks.iter().enumerate().map(|(i, t)| (t.uid, i)).collect();
        let sequences_by_uid: HashMap<Uid, usize> =
            self.sequences.iter().enumerate().map(|(i, s)| (s.uid, i)).collect();
        let components_by_uid: HashMap<Uid, usize> =
            self.components.iter().enumerate().map(|(i, c)| (c.uid, i)).collect();
        let descriptors_by_uid: HashMap<Uid, usize> =
            self.descriptors.iter().enumerate().map(|(i, d)| (d.uid, i)).collect();

        for sequence in self.sequences.iter_mut() {
            sequence.components = sequence
                .component_refs
                .iter()
                .map(|uid| lookup(&components_by_uid, uid, "structural component"))
                .collect();
        }

        for track in self.tracks.iter_mut() {
            track.sequence = lookup(&sequences_by_uid, &track.sequence_ref, "sequence");
        }

        for package in self.packages.iter_mut() {
            package.tracks = package
                .track_refs
                .iter()
                .map(|uid| lookup(&tracks_by_uid, uid, "track"))
                .collect();

            if let Some(descriptor_ref) = &package.descriptor_ref {
                package.descriptor = lookup(&descriptors_by_uid, descriptor_ref, "descriptor");
            }
        }

        for descriptor in self.descriptors.iter_mut() {
            descriptor.sub_descriptors = descriptor
                .sub_descriptor_refs
                .iter()
                .map(|uid| lookup(&descriptors_by_uid, uid, "sub-descriptor"))
                .collect();
        }

        self.package_refs
            .iter()
            .map(|uid| lookup(&packages_by_uid, uid, "package"))
            .collect()
    }
}

fn lookup(map: &HashMap<Uid, usize>, uid: &Uid, kind: &str) -> Option<usize> {
    let index = map.get(uid).copied();
    if index.is_none() {
        debug!("unresolved {} reference {:02x?}", kind, uid);
    }
    index
}

/// Iterates the 2-byte tag / 2-byte length items of one metadata local set.
///
/// The caller must consume exactly the announced number of value bytes for every item it
/// recognizes, and [`LocalSetReader::skip`] past every item it does not.
struct LocalSetReader<'a, 's> {
    stream: &'a mut MediaSourceStream<'s>,
    len: u64,
    bytes_read: u64,
}

impl<'a, 's> LocalSetReader<'a, 's> {
    fn new(stream: &'a mut MediaSourceStream<'s>, len: u64) -> Self {
        LocalSetReader { stream, len, bytes_read: 0 }
    }

    /// Advance to the next item. Returns the item's tag and value length, or [`None`] once the
    /// set is exhausted.
    fn next_item(&mut self) -> Result<Option<(u16, u16)>> {
        if self.bytes_read >= self.len {
            return Ok(None);
        }

        let tag = self.stream.read_be_u16()?;
        let size = self.stream.read_be_u16()?;
        self.bytes_read += u64::from(size) + 4;

        Ok(Some((tag, size)))
    }

    fn skip(&mut self, size: u16) -> Result<()> {
        self.stream.ignore_bytes(u64::from(size))
    }
}

fn read_uid(stream: &mut MediaSourceStream<'_>) -> Result<Uid> {
    let mut uid = Uid::default();
    stream.read_buf_exact(&mut uid)?;
    Ok(uid)
}

/// Reads a 32-byte UMID and captures its trailing 16 bytes, the material number that package
/// references are matched against.
fn read_umid(stream: &mut MediaSourceStream<'_>) -> Result<Uid> {
    stream.ignore_bytes(16)?;
    read_uid(stream)
}

/// Reads a batch of UIDs: a 32-bit count, a 32-bit per-element size (always 16, ignored), then
/// the elements.
fn read_batch(stream: &mut MediaSourceStream<'_>) -> Result<Vec<Uid>> {
    let count = stream.read_be_u32()?;
    if count >= MAX_BATCH_COUNT {
        return decode_error("mxf: implausible batch count");
    }

    stream.ignore_bytes(4)?;

    let mut uids = Vec::with_capacity(count as usize);
    for _ in 0..count {
        uids.push(read_uid(stream)?);
    }
    Ok(uids)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use toccata_core::io::{MediaSourceStream, ReadBytes};

    use crate::klv::{KlvPacket, Uid};

    use super::{ComponentKind, MxfMetadata, PackageKind};

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

    fn set_stream(body: &[u8]) -> (MediaSourceStream<'static>, KlvPacket) {
        let stream =
            MediaSourceStream::new(Box::new(Cursor::new(body.to_vec())), Default::default());
        let klv = KlvPacket { key: [0; 16], offset: 0, length: body.len() as u64 };
        (stream, klv)
    }

    #[test]
    fn verify_track_set_parsing() {
        let mut body = Vec::new();
        body.extend(item(0x3c0a, &[0x10; 16]));
        body.extend(item(0x4801, &7i32.to_be_bytes()));
        body.extend(item(0x4804, &[0x15, 0x01, 0x05, 0x01]));
        // Unknown tag in the middle of the set must be skipped by length.
        body.extend(item(0x4b02, &[0xde, 0xad]));
        // The edit rate is stored denominator first.
        body.extend(item(0x4b01, &[0, 0, 0, 1, 0, 0, 0, 25]));
        body.extend(item(0x4803, &[0x20; 16]));

        let (mut stream, klv) = set_stream(&body);
        let mut metadata = MxfMetadata::new();
        metadata.read_track(&mut stream, &klv).unwrap();

        let track = &metadata.tracks[0];
        assert_eq!(track.uid, [0x10; 16]);
        assert_eq!(track.track_id, 7);
        assert_eq!(track.track_number, [0x15, 0x01, 0x05, 0x01]);
        assert_eq!(track.edit_rate, (25, 1));
        assert_eq!(track.sequence_ref, [0x20; 16]);

        // The whole set was consumed.
        assert_eq!(stream.pos(), body.len() as u64);
    }

    #[test]
    fn verify_umid_takes_trailing_half() {
        let mut umid = [0u8; 32];
        for (i, byte) in umid.iter_mut().enumerate() {
            *byte = i as u8 ^ 0x5a;
        }

        let mut body = Vec::new();
        body.extend(item(0x3c0a, &[0x30; 16]));
        body.extend(item(0x1101, &umid));
        body.extend(item(0x1102, &3i32.to_be_bytes()));

        let (mut stream, klv) = set_stream(&body);
        let mut metadata = MxfMetadata::new();
        metadata.read_structural_component(&mut stream, &klv, ComponentKind::SourceClip).unwrap();

        let component = &metadata.components[0];
        assert_eq!(&component.source_package_uid[..], &umid[16..]);
        assert_eq!(component.source_track_id, 3);
    }

    #[test]
    fn verify_batch_count_bound() {
        let mut value = Vec::new();
        value.extend_from_slice(&(u32::MAX / 16).to_be_bytes());
        value.extend_from_slice(&16u32.to_be_bytes());

        let body = item(0x1901, &value);

        let (mut stream, klv) = set_stream(&body);
        let mut metadata = MxfMetadata::new();
        assert!(metadata.read_content_storage(&mut stream, &klv).is_err());
    }

    #[test]
    fn verify_reference_resolution() {
        let mut metadata = MxfMetadata::new();

        // A package referencing one track, which references a sequence, which references one
        // source clip; all sets arrive before their referents.
        let mut body = Vec::new();
        body.extend(item(0x3c0a, &[0x01; 16]));
        body.extend(item(0x4403, &batch(&[[0x02; 16], [0x0e; 16]])));
        let (mut stream, klv) = set_stream(&body);
        metadata.read_package(&mut stream, &klv, PackageKind::Material).unwrap();

        let mut body = Vec::new();
        body.extend(item(0x3c0a, &[0x02; 16]));
        body.extend(item(0x4803, &[0x03; 16]));
        let (mut stream, klv) = set_stream(&body);
        metadata.read_track(&mut stream, &klv).unwrap();

        let mut body = Vec::new();
        body.extend(item(0x3c0a, &[0x03; 16]));
        body.extend(item(0x1001, &batch(&[[0x04; 16]])));
        let (mut stream, klv) = set_stream(&body);
        metadata.read_sequence(&mut stream, &klv).unwrap();

        let mut body = Vec::new();
        body.extend(item(0x3c0a, &[0x04; 16]));
        let (mut stream, klv) = set_stream(&body);
        metadata.read_structural_component(&mut stream, &klv, ComponentKind::SourceClip).unwrap();

        metadata.package_refs = vec![[0x01; 16], [0x99; 16]];

        let package_slots = metadata.resolve();

        // The second content storage slot has no matching package and stays unresolved.
        assert_eq!(package_slots, vec![Some(0), None]);

        let package = &metadata.packages[0];
        // The second track reference is dangling.
        assert_eq!(package.tracks, vec![Some(0), None]);

        let track = &metadata.tracks[0];
        assert_eq!(track.sequence, Some(0));
        assert_eq!(metadata.sequences[0].components, vec![Some(0)]);
    }

    #[test]
    fn verify_descriptor_parsing() {
        let mut body = Vec::new();
        body.extend(item(0x3c0a, &[0x40; 16]));
        body.extend(item(0x3006, &5i32.to_be_bytes()));
        body.extend(item(0x3203, &1920u32.to_be_bytes()));
        body.extend(item(0x3202, &1080u32.to_be_bytes()));
        body.extend(item(0x320e, &[0, 0, 0, 16, 0, 0, 0, 9]));
        body.extend(item(0x3d03, &[0, 0, 0xbb, 0x80, 0, 0, 0, 1]));
        body.extend(item(0x3d07, &2u32.to_be_bytes()));
        body.extend(item(0x3d01, &24u32.to_be_bytes()));

        let (mut stream, klv) = set_stream(&body);
        let mut metadata = MxfMetadata::new();
        metadata.read_descriptor(&mut stream, &klv).unwrap();

        let descriptor = &metadata.descriptors[0];
        assert_eq!(descriptor.linked_track_id, 5);
        assert_eq!(descriptor.width, 1920);
        assert_eq!(descriptor.height, 1080);
        assert_eq!(descriptor.aspect_ratio, (16, 9));
        assert_eq!(descriptor.sample_rate, (48000, 1));
        assert_eq!(descriptor.channels, 2);
        assert_eq!(descriptor.bits_per_sample, 24);
    }
}
