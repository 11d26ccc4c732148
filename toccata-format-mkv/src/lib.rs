// Toccata
// Copyright (c) 2026 The Project Toccata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A Matroska (MKV/MKA) muxer.
//!
//! The muxer clusters incoming packets by time and size, maintains seek and cue indices while
//! writing, and patches the deferred SeekHead, Duration, and SegmentUID elements when the
//! container is finalized.

mod codecs;
mod ebml;
mod element_ids;
mod index;
mod muxer;
mod riff;
mod xiph;

pub use crate::muxer::{MkvWriter, MkvWriterOptions};
