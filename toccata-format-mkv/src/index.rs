// Toccata
// Copyright (c) 2026 The Project Toccata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Index builders for the deferred SeekHead and Cues elements.
//!
//! Both indices are accumulated in memory while clusters are written, and serialized once when
//! the container is finalized. A SeekHead may reserve space near the start of the file so the
//! final write does not shift any bytes.

use std::io::SeekFrom;

use toccata_core::errors::{limit_error, Result};
use toccata_core::io::{MediaSinkStream, WriteBytes};

use crate::ebml::{
    ebml_id_size, end_ebml_master, start_ebml_master, write_ebml_id, write_ebml_size,
    write_ebml_uint, write_ebml_void,
};
use crate::element_ids;

/// Worst-case size of one serialized seek entry: 10 bytes for the SeekEntry ID and size, 7 bytes
/// for the SeekID, and 11 bytes for the SeekPosition.
const SEEK_ENTRY_MAX_SIZE: u64 = 28;

/// Fixed overhead of a reserved SeekHead: the SeekHead ID and size, plus room for the trailing
/// Void element.
const SEEK_HEAD_OVERHEAD: u64 = 13;

struct SeekHeadEntry {
    element_id: u32,
    segment_pos: u64,
}

/// An index of level-1 elements, mapping element IDs to segment-relative positions.
pub(crate) struct SeekHead {
    /// The file offset the SeekHead will be written at, when space was reserved.
    file_pos: u64,
    /// The file offset of the beginning of the segment.
    segment_offset: u64,
    /// The number of bytes reserved, or 0 when appending to the file.
    reserved_size: u64,
    /// The maximum number of entries, or 0 when unlimited.
    max_entries: usize,
    entries: Vec<SeekHeadEntry>,
}

impl SeekHead {
    /// Create a seek head ready to index level-1 elements.
    ///
    /// If `num_elements` is greater than 0, enough space to index that many elements is reserved
    /// at the current position and the final [`SeekHead::write`] lands there. Otherwise the seek
    /// head is appended wherever the cursor is at write time.
    pub(crate) fn new(
        sink: &mut MediaSinkStream<'_>,
        segment_offset: u64,
        num_elements: usize,
    ) -> Result<SeekHead> {
        let mut seek_head = SeekHead {
            file_pos: 0,
            segment_offset,
            reserved_size: 0,
            max_entries: num_elements,
            entries: Vec::new(),
        };

        if num_elements > 0 {
            seek_head.file_pos = sink.pos();
            seek_head.reserved_size = num_elements as u64 * SEEK_ENTRY_MAX_SIZE + SEEK_HEAD_OVERHEAD;
            write_ebml_void(sink, seek_head.reserved_size)?;
        }

        Ok(seek_head)
    }

    /// Index an element. `file_pos` is the absolute offset of the element.
    pub(crate) fn add(&mut self, element_id: u32, file_pos: u64) -> Result<()> {
        // Don't store more elements than space was reserved for.
        if self.max_entries > 0 && self.max_entries <= self.entries.len() {
            return limit_error("mkv: seek head reservation exhausted");
        }

        self.entries
            .push(SeekHeadEntry { element_id, segment_pos: file_pos - self.segment_offset });
        Ok(())
    }

    /// Serialize the seek head, either at the reserved location or at the current position.
    ///
    /// Returns the file offset the seek head was written at.
    pub(crate) fn write(self, sink: &mut MediaSinkStream<'_>) -> Result<u64> {
        let mut currentpos = sink.pos();

        if self.reserved_size > 0 {
            sink.seek(SeekFrom::Start(self.file_pos))?;
        }

        let seek_head = start_ebml_master(sink, element_ids::SEEK_HEAD)?;
        for entry in &self.entries {
            let seek_entry = start_ebml_master(sink, element_ids::SEEK_ENTRY)?;

            // The SeekID payload is the indexed element's ID, stored raw.
            write_ebml_id(sink, element_ids::SEEK_ID)?;
            write_ebml_size(sink, ebml_id_size(entry.element_id) as u64, 0)?;
            write_ebml_id(sink, entry.element_id)?;

            write_ebml_uint(sink, element_ids::SEEK_POSITION, entry.segment_pos)?;
            end_ebml_master(sink, seek_entry)?;
        }
        end_ebml_master(sink, seek_head)?;

        if self.reserved_size > 0 {
            let remaining = self.file_pos + self.reserved_size - sink.pos();
            write_ebml_void(sink, remaining)?;
            sink.seek(SeekFrom::Start(currentpos))?;

            currentpos = self.file_pos;
        }

        Ok(currentpos)
    }
}

struct CueEntry {
    pts: u64,
    track_num: u32,
    /// Segment-relative offset of the cluster containing the indexed block.
    cluster_pos: u64,
}

/// An index of keyframes, mapping presentation timestamps to cluster positions.
pub(crate) struct Cues {
    segment_offset: u64,
    entries: Vec<CueEntry>,
}

impl Cues {
    pub(crate) fn new(segment_offset: u64) -> Cues {
        Cues { segment_offset, entries: Vec::new() }
    }

    /// Index a keyframe. `cluster_pos` is the absolute offset of the containing cluster.
    pub(crate) fn add(&mut self, pts: u64, track_num: u32, cluster_pos: u64) {
        self.entries.push(CueEntry {
            pts,
            track_num,
            cluster_pos: cluster_pos - self.segment_offset,
        });
    }

    /// Serialize the cues at the current position.
    ///
    /// Entries from different tracks with the exact same timestamp are coalesced into a single
    /// CuePoint with one CueTrackPositions child per entry. Only contiguous runs coalesce, so
    /// entries must have been added in packet order.
    ///
    /// Returns the file offset the cues were written at.
    pub(crate) fn write(self, sink: &mut MediaSinkStream<'_>) -> Result<u64> {
        let currentpos = sink.pos();

        let cues = start_ebml_master(sink, element_ids::CUES)?;

        let mut i = 0;
        while i < self.entries.len() {
            let pts = self.entries[i].pts;

            let cue_point = start_ebml_master(sink, element_ids::CUE_POINT)?;
            write_ebml_uint(sink, element_ids::CUE_TIME, pts)?;

            while i < self.entries.len() && self.entries[i].pts == pts {
                let entry = &self.entries[i];

                let track_positions = start_ebml_master(sink, element_ids::CUE_TRACK_POSITIONS)?;
                write_ebml_uint(sink, element_ids::CUE_TRACK, u64::from(entry.track_num))?;
                write_ebml_uint(sink, element_ids::CUE_CLUSTER_POSITION, entry.cluster_pos)?;
                end_ebml_master(sink, track_positions)?;

                i += 1;
            }

            end_ebml_master(sink, cue_point)?;
        }

        end_ebml_master(sink, cues)?;

        Ok(currentpos)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use toccata_core::errors::Error;
    use toccata_core::io::{BufReader, MediaSinkStream, ReadBytes, WriteBytes};

    use crate::ebml::{read_ebml_id, read_ebml_size};
    use crate::element_ids;

    use super::{Cues, SeekHead};

    /// Read one element header and return (id, data length).
    fn read_header(reader: &mut BufReader<'_>) -> (u32, u64) {
        let id = read_ebml_id(&mut *reader).unwrap();
        let size = read_ebml_size(&mut *reader).unwrap().unwrap();
        (id, size)
    }

    #[test]
    fn verify_seek_head_reservation() {
        let mut buf = Vec::new();
        let mut sink = MediaSinkStream::new(Box::new(Cursor::new(&mut buf)));

        let mut seek_head = SeekHead::new(&mut sink, 0, 4).unwrap();
        let reserved_end = sink.pos();
        assert_eq!(reserved_end, 4 * 28 + 13);

        // Simulate segment content following the reservation.
        sink.write_buf(&[0xAA; 100]).unwrap();

        seek_head.add(element_ids::INFO, 200).unwrap();
        seek_head.add(element_ids::TRACKS, 300).unwrap();

        let written_at = seek_head.write(&mut sink).unwrap();
        assert_eq!(written_at, 0);
        // The cursor is restored past the content written so far.
        assert_eq!(sink.pos(), reserved_end + 100);
        sink.into_inner().unwrap();

        // The reserved region must contain the seek head followed by a void, and nothing of the
        // region afterwards may have moved.
        assert_eq!(buf.len() as u64, reserved_end + 100);
        assert!(buf[reserved_end as usize..].iter().all(|&b| b == 0xAA));

        let mut reader = BufReader::new(&buf);
        let (id, size) = read_header(&mut reader);
        assert_eq!(id, element_ids::SEEK_HEAD);

        let void_start = reader.pos() + size;
        let mut reader = BufReader::new(&buf[void_start as usize..]);
        let (id, size) = read_header(&mut reader);
        assert_eq!(id, element_ids::EBML_VOID);
        assert_eq!(void_start + reader.pos() + size, reserved_end);
    }

    #[test]
    fn verify_seek_head_overflow() {
        let mut buf = Vec::new();
        let mut sink = MediaSinkStream::new(Box::new(Cursor::new(&mut buf)));

        let mut seek_head = SeekHead::new(&mut sink, 0, 1).unwrap();
        seek_head.add(element_ids::INFO, 100).unwrap();

        match seek_head.add(element_ids::TRACKS, 200) {
            Err(Error::LimitError(_)) => (),
            _ => panic!("expected a limit error"),
        }
    }

    #[test]
    fn verify_segment_relative_positions() {
        let mut buf = Vec::new();
        let mut sink = MediaSinkStream::new(Box::new(Cursor::new(&mut buf)));

        // Pretend the segment payload starts at offset 40.
        sink.write_buf(&[0u8; 40]).unwrap();

        let mut seek_head = SeekHead::new(&mut sink, 40, 0).unwrap();
        seek_head.add(element_ids::CLUSTER, 140).unwrap();

        let written_at = seek_head.write(&mut sink).unwrap();
        assert_eq!(written_at, 40);
        sink.into_inner().unwrap();

        let mut reader = BufReader::new(&buf[40..]);
        let (id, _) = read_header(&mut reader);
        assert_eq!(id, element_ids::SEEK_HEAD);
        let (id, _) = read_header(&mut reader);
        assert_eq!(id, element_ids::SEEK_ENTRY);

        // SeekID holds the raw element ID.
        let (id, size) = read_header(&mut reader);
        assert_eq!(id, element_ids::SEEK_ID);
        assert_eq!(size, 4);
        assert_eq!(read_ebml_id(&mut reader).unwrap(), element_ids::CLUSTER);

        // SeekPosition is segment-relative.
        let (id, size) = read_header(&mut reader);
        assert_eq!(id, element_ids::SEEK_POSITION);
        assert_eq!(size, 1);
        assert_eq!(reader.read_byte().unwrap(), 100);
    }

    #[test]
    fn verify_cues_coalesce_equal_pts() {
        let mut buf = Vec::new();
        let mut sink = MediaSinkStream::new(Box::new(Cursor::new(&mut buf)));

        let mut cues = Cues::new(0);
        cues.add(0, 1, 64);
        cues.add(0, 2, 64);
        cues.add(1000, 1, 4096);

        cues.write(&mut sink).unwrap();
        sink.into_inner().unwrap();

        let mut reader = BufReader::new(&buf);
        let (id, _) = read_header(&mut reader);
        assert_eq!(id, element_ids::CUES);

        // First cue point carries both track positions for pts 0.
        let (id, _) = read_header(&mut reader);
        assert_eq!(id, element_ids::CUE_POINT);
        let (id, size) = read_header(&mut reader);
        assert_eq!((id, size), (element_ids::CUE_TIME, 1));
        assert_eq!(reader.read_byte().unwrap(), 0);

        for expected_track in [1u8, 2] {
            let (id, _) = read_header(&mut reader);
            assert_eq!(id, element_ids::CUE_TRACK_POSITIONS);
            let (id, _) = read_header(&mut reader);
            assert_eq!(id, element_ids::CUE_TRACK);
            assert_eq!(reader.read_byte().unwrap(), expected_track);
            let (id, _) = read_header(&mut reader);
            assert_eq!(id, element_ids::CUE_CLUSTER_POSITION);
            assert_eq!(reader.read_byte().unwrap(), 64);
        }

        // Second cue point holds the remaining entry.
        let (id, _) = read_header(&mut reader);
        assert_eq!(id, element_ids::CUE_POINT);
        let (id, size) = read_header(&mut reader);
        assert_eq!((id, size), (element_ids::CUE_TIME, 2));
        assert_eq!(reader.read_be_u16().unwrap(), 1000);
    }
}
