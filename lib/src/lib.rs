// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: MIT

//! A library for counting pulses on a single GPIO line on Linux platforms
//! using the GPIO character device.
//!
//! The line is described by a [`Config`], requested from the kernel by a
//! [`Builder`], and the resulting [`Request`] is drained by a [`Sampler`]
//! which reports the number of edges seen per read to a [`ReportSink`].
//!
//! ```no_run
//! # fn example() -> Result<(), pulsecount::Error> {
//! use pulsecount::report::{Emitter, SystemClock, TimeFmt};
//! use pulsecount::request::{Builder, Config};
//! use pulsecount::sampler::{Sampler, SamplerConfig};
//!
//! let cfg = Config::new(26);
//! let req = Builder::new("/dev/gpiochip0", cfg).request()?;
//! let mut sampler = Sampler::new(req, SamplerConfig::default());
//! let mut emitter = Emitter::new(std::io::stdout(), SystemClock::default(), TimeFmt::Seconds);
//! let err = sampler.run(&mut emitter);
//! # Err(err)
//! # }
//! ```
//!
//! [`Config`]: request::Config
//! [`Builder`]: request::Builder
//! [`Request`]: request::Request
//! [`Sampler`]: sampler::Sampler
//! [`ReportSink`]: report::ReportSink

use pulsecount_uapi as uapi;
use std::path::PathBuf;

/// Header pin naming schemes for specific boards.
pub mod board;

/// One-time, best-effort, latency reduction for the calling process.
pub mod latency;

/// Edge and bias modes of the counted line.
pub mod line;

/// Parsing of human readable periods.
pub mod period;

/// Timestamped reports of the sampled edge counts.
pub mod report;

/// Types and functions related to requesting the counted line.
pub mod request;

/// The loop draining edge events from a requested line.
pub mod sampler;

pub use errno::Errno;
pub use uapi::Offset;

/// Errors returned by [`pulsecount`] functions.
///
/// [`pulsecount`]: crate
#[derive(Clone, Debug, thiserror::Error, Eq, PartialEq)]
pub enum Error {
    /// A period does not have the form `<integer><unit>`.
    #[error("'{0}' is not a valid period - use <integer> followed by 'us', 'ms', 's', 'min' or 'h'")]
    InvalidFormat(String),

    /// A value is outside the range accepted for its purpose.
    #[error("{name} '{value}' is out of range ({range})")]
    OutOfRange {
        name: &'static str,
        value: String,
        range: &'static str,
    },

    /// A mode keyword is not one of the accepted set.
    #[error("'{value}' is not a valid {kind} - use {expected}")]
    InvalidMode {
        kind: &'static str,
        value: String,
        expected: &'static str,
    },

    /// A pin name does not map to a line on the board.
    #[error("cannot find pin '{pin}' on {board}")]
    UnknownPin { board: board::Board, pin: String },

    /// Problem opening the GPIO chip character device.
    #[error("\"{}\" {}.", .0.display(), .1)]
    GpioChip(PathBuf, Errno),

    /// The kernel refused the line request.
    #[error("uAPI get_line for offset {0} returned: {1}")]
    GetLine(uapi::Offset, #[source] uapi::Error),

    /// A report could not be written.
    #[error("failed to emit report: {0}")]
    Emit(std::io::ErrorKind),

    /// The error policy stopped the sampler.
    #[error("giving up after {count} consecutive faults, the last being: {last}")]
    GaveUp { count: u32, last: sampler::Fault },
}

impl Error {
    /// The OS error number underlying the error, if any.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Error::GpioChip(_, e) => Some(e.0),
            Error::GetLine(_, e) => Some(e.errno()),
            Error::GaveUp { last, .. } => last.errno(),
            _ => None,
        }
    }
}

/// The result for [`pulsecount`] functions.
///
/// [`pulsecount`]: crate
pub type Result<T> = std::result::Result<T, Error>;
