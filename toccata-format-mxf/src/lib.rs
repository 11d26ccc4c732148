// Toccata
// Copyright (c) 2026 The Project Toccata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A Material Exchange Format (MXF) demuxer for OP1a files.
//!
//! The demuxer reads the KLV-encoded header metadata into a graph of structural metadata sets,
//! links a Material Package's abstract tracks to the Source Package tracks and descriptors that
//! carry the essence, and then routes essence element KLVs to the resolved output tracks.
//!
//! References:
//! * SMPTE 336M KLV Data Encoding Protocol Using Key-Length-Value
//! * SMPTE 377M MXF File Format Specifications
//! * SMPTE 378M Operational Pattern 1a

mod demuxer;
mod klv;
mod sets;
mod uls;

pub use crate::demuxer::MxfReader;
