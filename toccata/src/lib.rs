// Toccata
// Copyright (c) 2026 The Project Toccata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! # Project Toccata
//!
//! Toccata is a pure Rust multimedia container muxing and demuxing library.
//!
//! # Support
//!
//! Supported container formats are listed below. Each format can be disabled via its feature
//! flag.
//!
//! | Format        | Direction | Feature Flag | Default |
//! |---------------|-----------|--------------|---------|
//! | Matroska/MKA  | mux       | `mkv`        | Yes     |
//! | MXF (OP1a)    | demux     | `mxf`        | Yes     |
//!
//! # Usage
//!
//! To read a media file:
//!
//! 1. Instantiate a [`MediaSourceStream`][core::io::MediaSourceStream] with a source implementing
//!    [`MediaSource`][core::io::MediaSource] (implemented for `std::fs::File` and
//!    `std::io::Cursor`).
//! 2. Obtain the default [`Probe`][core::formats::probe::Probe] with [`default::get_probe`] and
//!    call [`probe`][core::formats::probe::Probe::probe] to detect the container format and
//!    instantiate a [`FormatReader`][core::formats::FormatReader].
//! 3. Examine the reader's [`tracks`][core::formats::FormatReader::tracks] and pull packets with
//!    [`next_packet`][core::formats::FormatReader::next_packet].
//!
//! To write a media file:
//!
//! 1. Instantiate a [`MediaSinkStream`][core::io::MediaSinkStream] with a seekable sink
//!    implementing [`MediaSink`][core::io::MediaSink].
//! 2. Describe the media with a list of [`Track`][core::formats::Track]s and instantiate a
//!    [`FormatWriter`][core::formats::FormatWriter] such as
//!    [`MkvWriter`][default::formats::MkvWriter] for it.
//! 3. Feed packets in timestamp order with [`write`][core::formats::FormatWriter::write] and
//!    finalize the container with [`end`][core::formats::FormatWriter::end].

pub mod default {
    //! The `default` module provides convenience functions and registries to get an implementer
    //! up-and-running as quickly as possible, and to reduce boiler-plate. Using the `default`
    //! module is completely optional and incurs no overhead unless actually used.

    pub mod formats {
        //! The `formats` module re-exports all enabled Toccata format readers and writers.

        #[cfg(feature = "mkv")]
        pub use toccata_format_mkv::{MkvWriter, MkvWriterOptions};
        #[cfg(feature = "mxf")]
        pub use toccata_format_mxf::MxfReader;
    }

    use lazy_static::lazy_static;

    use toccata_core::formats::probe::Probe;

    lazy_static! {
        static ref PROBE: Probe = {
            let mut probe = Probe::new();
            register_enabled_formats(&mut probe);
            probe
        };
    }

    /// Gets the default `Probe`. The probe pre-registers all the demuxable formats selected by
    /// the `feature` flags in the includer's `Cargo.toml`. If `features` is not set, the default
    /// set of Toccata formats is registered.
    ///
    /// This function is lazy and does not instantiate the `Probe` until the first call to this
    /// function.
    pub fn get_probe() -> &'static Probe {
        &PROBE
    }

    /// Registers all the demuxable formats selected by the `feature` flags in the includer's
    /// `Cargo.toml` on the provided `Probe`. If `features` is not set, the default set of
    /// Toccata formats is registered.
    ///
    /// Use this function to easily populate a custom probe with all enabled formats.
    pub fn register_enabled_formats(_probe: &mut Probe) {
        // Muxers are not probeable; they are selected by name, extension, or MIME type from
        // their registration data.
        #[cfg(feature = "mxf")]
        _probe.register_format::<formats::MxfReader<'_>>();
    }
}

pub use toccata_core as core;
