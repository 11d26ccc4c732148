// Toccata
// Copyright (c) 2026 The Project Toccata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `packet` module defines the packet structure.

use crate::io::BufReader;
use crate::units::{Duration, TimeStamp};

/// A `Packet` contains a discrete amount of encoded data for a single codec bitstream. The exact
/// amount of data is bounded, but not defined, and is dependant on the container and/or the
/// encapsulated codec.
#[derive(Clone)]
pub struct Packet {
    /// The track ID.
    pub track_id: u32,
    /// The presentation timestamp (PTS) of the packet in `TimeBase` units.
    pub pts: TimeStamp,
    /// The decode timestamp (DTS) of the packet in `TimeBase` units. Equal to the PTS unless the
    /// codec reorders frames.
    pub dts: TimeStamp,
    /// The duration of the packet in `TimeBase` units.
    pub dur: Duration,
    /// Indicates the packet contains a keyframe and is a valid point to begin decoding at.
    pub key: bool,
    /// The packet buffer.
    pub data: Box<[u8]>,
}

impl Packet {
    /// Create a new `Packet`.
    pub fn new(track_id: u32, pts: TimeStamp, dur: Duration, data: impl Into<Box<[u8]>>) -> Self {
        Packet { track_id, pts, dts: pts, dur, key: false, data: data.into() }
    }

    /// Create a new keyframe `Packet`.
    pub fn new_key(
        track_id: u32,
        pts: TimeStamp,
        dur: Duration,
        data: impl Into<Box<[u8]>>,
    ) -> Self {
        Packet { track_id, pts, dts: pts, dur, key: true, data: data.into() }
    }

    /// The track identifier of the track this packet belongs to.
    #[inline]
    pub fn track_id(&self) -> u32 {
        self.track_id
    }

    /// Get an immutable slice to the packet buffer.
    #[inline]
    pub fn buf(&self) -> &[u8] {
        &self.data
    }

    /// Get a `BufReader` to read the packet data buffer sequentially.
    #[inline]
    pub fn as_buf_reader(&self) -> BufReader<'_> {
        BufReader::new(&self.data)
    }
}
