// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use anyhow::Result;
use clap::{ArgAction, Parser, ValueEnum};
use pulsecount::board::{Board, DEFAULT_CHIP, DEFAULT_PIN};
use pulsecount::period;
use pulsecount::report::{ClockId, TimeFmt};
use pulsecount::sampler::RetryPolicy;
use pulsecount::Offset;
use std::path::PathBuf;
use std::time::Duration;

// common helper functions

pub fn chip_path_from_id(id: &str) -> PathBuf {
    if id.chars().all(char::is_numeric) {
        // from number
        return format!("/dev/gpiochip{id}").into();
    }
    if !id.chars().any(|x| x == '/') {
        // from name
        let mut p: PathBuf = "/dev".into();
        p.push(id);
        return p;
    }
    // from raw path
    id.into()
}

/// Split a `[chip:]pin` line identifier into the chip path and line offset.
pub fn resolve_line(line: Option<&str>, board: Board) -> Result<(PathBuf, Offset)> {
    let (chip, pin) = match line {
        None => (DEFAULT_CHIP, DEFAULT_PIN),
        Some(l) => match l.rsplit_once(':') {
            Some((chip, pin)) => (chip, pin),
            None => (DEFAULT_CHIP, l),
        },
    };
    if chip.is_empty() || pin.is_empty() {
        return Err(Error::BadLine(line.unwrap_or_default().into()).into());
    }
    let offset = board.resolve_pin(pin)?;
    Ok((chip_path_from_id(chip), offset))
}

pub fn parse_backoff(s: &str) -> pulsecount::Result<Duration> {
    period::parse_period(s).map(Duration::from_micros)
}

// common command line parser options

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ClockFlags {
    Tai,
    Realtime,
    Monotonic,
}
impl From<ClockFlags> for ClockId {
    fn from(c: ClockFlags) -> Self {
        match c {
            ClockFlags::Tai => ClockId::Tai,
            ClockFlags::Realtime => ClockId::Realtime,
            ClockFlags::Monotonic => ClockId::Monotonic,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Parser)]
pub struct TimeOpts {
    /// The source clock for report timestamps
    ///
    /// By default reports are stamped with International Atomic Time.
    #[arg(
        long,
        value_name = "clock",
        value_enum,
        ignore_case = true,
        conflicts_with = "timefmt"
    )]
    pub clock: Option<ClockFlags>,

    /// Format report timestamps as local time
    ///
    /// Implies the realtime clock.
    #[arg(long, group = "timefmt")]
    pub localtime: bool,

    /// Format report timestamps as UTC
    ///
    /// Implies the realtime clock.
    #[arg(long, group = "timefmt")]
    pub utc: bool,
}
impl TimeOpts {
    pub fn clock(&self) -> ClockId {
        match self.clock {
            Some(c) => c.into(),
            None if self.localtime || self.utc => ClockId::Realtime,
            None => ClockId::Tai,
        }
    }

    pub fn timefmt(&self) -> TimeFmt {
        if self.localtime {
            TimeFmt::Localtime
        } else if self.utc {
            TimeFmt::Utc
        } else {
            TimeFmt::Seconds
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Parser)]
pub struct RetryOpts {
    /// Exit after this many consecutive failed reads
    ///
    /// By default failed reads are logged and retried indefinitely.
    #[arg(long, value_name = "num")]
    pub retry_limit: Option<u32>,

    /// Pause for this period after a failed read
    ///
    /// The pause doubles for each consecutive failure, up to 64 times the
    /// initial period.
    #[arg(long, value_name = "period", value_parser = parse_backoff)]
    pub retry_backoff: Option<Duration>,
}
impl RetryOpts {
    /// The policy to apply, if any differs from the default.
    pub fn policy(&self) -> Option<RetryPolicy> {
        if self.retry_limit.is_none() && self.retry_backoff.is_none() {
            return None;
        }
        Some(
            RetryPolicy::new()
                .with_limit(self.retry_limit)
                .with_backoff(self.retry_backoff),
        )
    }
}

#[derive(Clone, Copy, Debug, Default, Parser)]
pub struct EmitOpts {
    /// Provide more detailed diagnostics and error messages
    ///
    /// May be repeated for more detail.
    #[arg(short = 'v', long, action = ArgAction::Count, display_order = 800)]
    pub verbose: u8,

    /// Emit reports in JSON format
    #[cfg(feature = "json")]
    #[arg(long)]
    pub json: bool,
}

pub fn emit_error(opts: &EmitOpts, e: &anyhow::Error) {
    let e_str = format_error(opts, e);
    #[cfg(feature = "json")]
    if opts.json {
        println!("{}", serde_json::json!({ "error": e_str }));
        return;
    }
    eprintln!("{e_str}");
}

pub fn format_error(opts: &EmitOpts, e: &anyhow::Error) -> String {
    if opts.verbose > 0 {
        format!("{e:#}")
    } else {
        format!("{e}")
    }
}

/// The process exit status for an error.
///
/// The OS error number, where there is one, else 1.
pub fn exit_status(e: &anyhow::Error) -> u8 {
    e.downcast_ref::<Error>()
        .and_then(Error::errno)
        .or_else(|| e.downcast_ref::<pulsecount::Error>().and_then(pulsecount::Error::errno))
        .and_then(|errno| u8::try_from(errno).ok())
        .filter(|&status| status != 0)
        .unwrap_or(1)
}

/// Errors returned by cli functions.
#[derive(Clone, Debug, thiserror::Error, Eq, PartialEq)]
pub enum Error {
    #[error("'{0}' is not a valid line - use [chip:]pin")]
    BadLine(String),

    // The cause is part of the message so it is reported without --verbose.
    #[error("unable to request line {offset} on chip '{}': {cause}", .chip.display())]
    Request {
        offset: Offset,
        chip: PathBuf,
        cause: pulsecount::Error,
    },

    #[error("counting stopped: {0}")]
    Stopped(pulsecount::Error),
}

impl Error {
    pub fn errno(&self) -> Option<i32> {
        match self {
            Error::BadLine(_) => None,
            Error::Request { cause, .. } => cause.errno(),
            Error::Stopped(cause) => cause.errno(),
        }
    }
}
