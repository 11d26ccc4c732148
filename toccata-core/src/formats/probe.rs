// Toccata
// Copyright (c) 2026 The Project Toccata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `probe` module provides methods and traits to support auto-detection of media formats
//! from arbitrary media streams.

use std::io::SeekFrom;

use crate::errors::{unsupported_error, Error, Result};
use crate::formats::{FormatInfo, FormatOptions, FormatReader};
use crate::io::{MediaSourceStream, ReadBytes};

use log::{debug, error, trace};

/// The maximum length of a format marker, in bytes.
const MAX_MARKER_LEN: usize = 16;

/// The probe match specification provides declarative information that is used by a `Probe` to
/// detect the presence of a specific container format while scanning a `MediaSourceStream`.
#[derive(Copy, Clone)]
pub struct ProbeDataMatchSpec {
    /// A list of case-insensitive file extensions that are generally used by the format.
    pub extensions: &'static [&'static str],
    /// A list of case-insensitive MIME types that are generally used by the format.
    pub mime_types: &'static [&'static str],
    /// A byte-string start-of-format marker that will be searched for within the stream.
    /// Typically some magic numbers associated with the start of the container format.
    pub markers: &'static [&'static [u8]],
}

/// Container format-specific probe data.
#[derive(Copy, Clone)]
pub struct ProbeFormatData {
    /// The match specification used by the probe to match against the media source stream.
    pub spec: ProbeDataMatchSpec,
    /// A description of the container format and reader if a match with the basic probe data is
    /// found.
    pub info: FormatInfo,
}

/// The result of a scoring operation.
pub enum Score {
    /// The format is not supported.
    Unsupported,
    /// The format is supported with a confidence between 0 (not confident) and 255 (very
    /// confident).
    Supported(u8),
}

/// The `Scoreable` trait defines the scoring functionality a reader must implement to support
/// probing for a container format.
pub trait Scoreable {
    /// Calculate and return a value between 0 and 255 indicating the confidence of the reader in
    /// decoding or parsing the stream starting at the current position.
    ///
    /// A score operation must not consume more bytes than the seek-back margin of the stream
    /// allows, and must not seek the stream itself. The probe restores the stream position after
    /// scoring.
    fn score(src: &mut MediaSourceStream<'_>) -> Result<Score>;
}

/// `FormatReader` probe factory function. Creates a boxed `FormatReader`.
pub type FormatFactoryFn =
    for<'s> fn(MediaSourceStream<'s>, FormatOptions) -> Result<Box<dyn FormatReader + 's>>;

/// To support probing, a `FormatReader` must implement the `ProbeableFormat` trait.
pub trait ProbeableFormat<'s>: FormatReader + Scoreable {
    /// Create an instance of the format reader.
    fn try_probe_new(
        mss: MediaSourceStream<'s>,
        opts: FormatOptions,
    ) -> Result<Box<dyn FormatReader + 's>>
    where
        Self: Sized;

    /// Returns a list of probe data that a [`Probe`] will use to determine if the reader
    /// implementing this trait may support the media source stream.
    fn probe_data() -> &'static [ProbeFormatData];
}

/// A function pointer to the score function of a registered format.
type ScoreFn = fn(&mut MediaSourceStream<'_>) -> Result<Score>;

/// Private/internal representation of a registered probeable format.
#[derive(Copy, Clone)]
struct RegisteredFormat {
    /// The match specification.
    spec: ProbeDataMatchSpec,
    /// A basic description about the container format.
    info: FormatInfo,
    /// A function to assign a likelyhood score that the media source is the start of the format.
    score: ScoreFn,
    /// A factory function to create an instance of the matching format reader.
    factory: FormatFactoryFn,
}

/// A `Hint` provides additional information and context when probing a media source stream.
///
/// For example, the `Probe` cannot examine the extension or mime-type of the media because
/// `MediaSourceStream` abstracts away such details. However, the embedder may have this
/// information from a file path, HTTP header, email attachment metadata, etc. `Hint`s are
/// optional, and won't lead the probe astray if they're wrong, but they may provide an informed
/// initial guess.
#[derive(Clone, Debug, Default)]
pub struct Hint {
    extension: Option<String>,
    mime_type: Option<String>,
}

impl Hint {
    /// Instantiate an empty `Hint`.
    pub fn new() -> Self {
        Default::default()
    }

    /// Add a file extension hint.
    pub fn with_extension(&mut self, extension: &str) -> &mut Self {
        self.extension = Some(extension.to_owned());
        self
    }

    /// Add a MIME/Media-type hint.
    pub fn mime_type(&mut self, mime_type: &str) -> &mut Self {
        self.mime_type = Some(mime_type.to_owned());
        self
    }

    /// Returns true if the hint matches the provided match specification.
    fn matches(&self, spec: &ProbeDataMatchSpec) -> bool {
        let ext_match = self
            .extension
            .as_deref()
            .map(|ext| spec.extensions.iter().any(|c| c.eq_ignore_ascii_case(ext)))
            .unwrap_or(false);

        let mime_match = self
            .mime_type
            .as_deref()
            .map(|mime| spec.mime_types.iter().any(|c| c.eq_ignore_ascii_case(mime)))
            .unwrap_or(false);

        ext_match || mime_match
    }
}

/// Options for controlling the behaviour of a `Probe`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ProbeOptions {
    /// The maximum number of bytes that will be scanned from the media source before giving up.
    ///
    /// The default is 1 MB.
    pub max_probe_depth: u32,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self { max_probe_depth: 1024 * 1024 }
    }
}

/// `Probe` scans a `MediaSourceStream` for container formats, and instantiates a `FormatReader`
/// for the first format encountered.
#[derive(Default)]
pub struct Probe {
    registered: Vec<RegisteredFormat>,
    opts: ProbeOptions,
}

impl Probe {
    /// Instantiate a probe with default options.
    pub fn new() -> Self {
        Default::default()
    }

    /// Instantiate a probe with custom options.
    pub fn new_with_options(opts: &ProbeOptions) -> Self {
        Probe { opts: *opts, ..Default::default() }
    }

    /// Register the parameterized format reader.
    pub fn register_format<P>(&mut self)
    where
        for<'a> P: ProbeableFormat<'a>,
    {
        for data in P::probe_data() {
            for marker in data.spec.markers {
                assert!(
                    (2..=MAX_MARKER_LEN).contains(&marker.len()),
                    "invalid marker length (only 2-16 bytes supported)"
                );
            }

            self.registered.push(RegisteredFormat {
                spec: data.spec,
                info: data.info,
                score: P::score,
                factory: |mss, opts| P::try_probe_new(mss, opts),
            });
        }
    }

    /// Searches the provided `MediaSourceStream` for a container format, and instantiates its
    /// reader.
    pub fn probe<'s>(
        &self,
        hint: &Hint,
        mut mss: MediaSourceStream<'s>,
        fmt_opts: FormatOptions,
    ) -> Result<Box<dyn FormatReader + 's>> {
        let init_pos = mss.pos();

        // Candidates matching the hint are tested first.
        let mut candidates: Vec<&RegisteredFormat> = self.registered.iter().collect();
        candidates.sort_by_key(|c| !hint.matches(&c.spec));

        let mut count = 0u32;

        loop {
            // Read up to one marker-length window at the current position, then re-align the
            // stream to the start of the window.
            let mut win = [0u8; MAX_MARKER_LEN];
            let mut win_len = 0;

            while win_len < MAX_MARKER_LEN {
                match mss.read_buf(&mut win[win_len..]) {
                    Ok(len) => win_len += len,
                    Err(err) if crate::errors::is_end_of_stream(&err) => break,
                    Err(err) => return Err(err),
                }
            }

            if win_len == 0 {
                break;
            }

            mss.seek_buffered_rev(win_len);

            for candidate in &candidates {
                let matched = candidate
                    .spec
                    .markers
                    .iter()
                    .any(|marker| marker.len() <= win_len && win[..marker.len()] == **marker);

                if !matched {
                    continue;
                }

                trace!("found a marker for '{}' @ {} bytes", candidate.info.short_name, mss.pos());

                if let Score::Supported(score) = score(candidate, &mut mss)? {
                    debug!(
                        "selected format reader '{}' with score {}",
                        candidate.info.short_name, score
                    );

                    if mss.pos() > init_pos {
                        debug!("skipped {} bytes of junk at {}", mss.pos() - init_pos, init_pos);
                    }

                    return (candidate.factory)(mss, fmt_opts);
                }
            }

            // No registered format matched at this position. Advance the stream one byte and
            // try again.
            count += 1;

            if count > self.opts.max_probe_depth {
                error!("reached probe limit of {} bytes", self.opts.max_probe_depth);
                break;
            }

            if mss.read_byte().is_err() {
                break;
            }
        }

        unsupported_error("core (probe): no suitable format reader found")
    }
}

fn score(candidate: &RegisteredFormat, mss: &mut MediaSourceStream<'_>) -> Result<Score> {
    // Save the initial position to rewind back to after scoring is complete.
    let init_pos = mss.pos();

    let result = match (candidate.score)(mss) {
        Err(Error::IoError(err)) if err.kind() != std::io::ErrorKind::UnexpectedEof => {
            // IO errors that are not an unexpected end-of-file error abort the entire probe
            // operation.
            Err(Error::IoError(err))
        }
        Err(_) => {
            // All other errors are caught and return unsupported.
            Ok(Score::Unsupported)
        }
        result => result,
    };

    // Rewind to the initial position.
    if mss.is_seekable() {
        mss.seek(SeekFrom::Start(init_pos))?;
    }
    else {
        mss.seek_buffered_rev((mss.pos() - init_pos) as usize);
    }

    result
}

/// Convenience macro for declaring a `ProbeFormatData` for a `FormatReader`.
#[macro_export]
macro_rules! support_format {
    ($info:expr, $exts:expr, $mimes:expr, $markers:expr) => {
        toccata_core::formats::probe::ProbeFormatData {
            spec: toccata_core::formats::probe::ProbeDataMatchSpec {
                extensions: $exts,
                mime_types: $mimes,
                markers: $markers,
            },
            info: $info,
        }
    };
}
