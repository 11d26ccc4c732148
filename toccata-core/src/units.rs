// Toccata
// Copyright (c) 2026 The Project Toccata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `units` module provides definitions for common units.

use std::fmt;

/// A `TimeStamp` represents an instantenous instant in time since the start of a stream. One
/// `TimeStamp` "tick" is equivalent to the stream's `TimeBase` in seconds.
pub type TimeStamp = u64;

/// A `Duration` indicates a positive span of time.
pub type Duration = u64;

/// `Time` represents a duration of time in seconds, or the number of seconds since an arbitrary
/// epoch. `Time` is stored as an integer number of seconds plus any remaining fraction of a second
/// as a floating point value.
#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd)]
pub struct Time {
    pub seconds: u64,
    pub frac: f64,
}

impl Time {
    pub fn new(seconds: u64, frac: f64) -> Self {
        Time { seconds, frac }
    }
}

impl From<u64> for Time {
    fn from(seconds: u64) -> Self {
        Time::new(seconds, 0.0)
    }
}

impl From<f64> for Time {
    fn from(seconds: f64) -> Self {
        if seconds >= 0.0 {
            Time::new(seconds.trunc() as u64, seconds.fract())
        }
        else {
            Time::new(0, 0.0)
        }
    }
}

/// A `TimeBase` is the conversion factor between a `TimeStamp` and seconds: one tick of a
/// timestamp or duration is `numer / denom` seconds long.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TimeBase {
    /// The numerator.
    pub numer: u32,
    /// The denominator.
    pub denom: u32,
}

impl TimeBase {
    /// Creates a new `TimeBase`. Panics if either the numerator or denominator is 0.
    pub fn new(numer: u32, denom: u32) -> Self {
        assert!(numer > 0 && denom > 0, "timebase must be positive and non-zero");
        TimeBase { numer, denom }
    }

    /// Accurately calculates a `Time` using the `TimeBase` and the provided `TimeStamp`.
    pub fn calc_time(&self, ts: TimeStamp) -> Time {
        debug_assert!(self.numer > 0 && self.denom > 0);

        let numer = u64::from(self.numer);
        let denom = u64::from(self.denom);

        // Split the timestamp into whole seconds and the remaining ticks to keep the fractional
        // part accurate for large timestamps.
        let seconds = (ts / denom) * numer;
        let rest = ts % denom;

        let frac_ticks = rest * numer;
        let seconds = seconds + (frac_ticks / denom);
        let frac = (frac_ticks % denom) as f64 / denom as f64;

        Time::new(seconds, frac)
    }
}

impl fmt::Display for TimeBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numer, self.denom)
    }
}

#[cfg(test)]
mod tests {
    use super::TimeBase;

    #[test]
    fn verify_timebase() {
        // One tick of a 1/1000 timebase is one millisecond.
        let tb = TimeBase::new(1, 1000);
        let time = tb.calc_time(12_345);
        assert_eq!(time.seconds, 12);
        assert!((time.frac - 0.345).abs() < 1e-9);

        // A 1001/30000 timebase (NTSC) over one hour of frames.
        let tb = TimeBase::new(1001, 30000);
        let time = tb.calc_time(30000);
        assert_eq!(time.seconds, 1001);
    }
}
