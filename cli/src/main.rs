// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A command line tool for counting pulses on a GPIO line.

use anyhow::Result;
use clap::Parser;
use pulsecount::board::Board;
use pulsecount::latency;
use pulsecount::line::{BiasMode, EdgeMode};
use pulsecount::period;
use pulsecount::report::{Emitter, ReportSink, SystemClock};
use pulsecount::request::{Builder, Config, Request, DEFAULT_CONSUMER};
use pulsecount::sampler::{Sampler, SamplerConfig};
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;

mod common;
#[cfg(feature = "json")]
mod json;
mod logger;

fn main() -> ExitCode {
    let opts = match Opts::try_parse() {
        Ok(opts) => opts,
        Err(e) => e.exit(),
    };
    if let Err(e) = logger::init(opts.emit.verbose) {
        eprintln!("{e}");
    }
    match cmd(&opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            common::emit_error(&opts.emit, &e);
            ExitCode::from(common::exit_status(&e))
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "pulse-counting",
    about = "Count edges on a GPIO line, reporting the number seen per read.",
    version
)]
struct Opts {
    /// The line to count edges on
    ///
    /// Identified as [chip:]pin, where the chip may be identified by number,
    /// name, or path, and defaults to gpiochip0.
    /// The pin may be a line offset or a header pin name, such as P1-37.
    /// e.g. the following all select the same line:
    ///     P1-37
    ///     26
    ///     0:26
    ///     gpiochip0:P1_37
    ///     /dev/gpiochip0:26
    #[arg(value_name = "line", verbatim_doc_comment)]
    line: Option<String>,

    /// The board used to resolve header pin names
    #[arg(
        long,
        value_name = "board",
        env = "PULSECOUNT_BOARD",
        default_value = "rpi",
        value_parser = Board::from_str
    )]
    board: Board,

    /// The consumer label applied to the requested line
    #[arg(short = 'L', long, value_name = "name", default_value = DEFAULT_CONSUMER)]
    label: String,

    /// The debounce period applied to the line
    ///
    /// Periods are an integer followed by 'us', 'ms', 's', 'min' or 'h',
    /// and may be at most 1h.
    #[arg(short = 'D', long, value_name = "period", value_parser = period::parse_debounce)]
    debounce: Option<u32>,

    /// Report idle if no edges are seen for this period
    ///
    /// By default the count is only reported once edges are seen.
    /// The period may be at most 48h.
    #[arg(short = 'I', long, value_name = "period", value_parser = period::parse_idle_timeout)]
    idle_timeout: Option<Duration>,

    /// The bias applied to the line
    ///
    /// One of 'as-is', 'disabled', 'pull-up' or 'pull-down'.
    #[arg(
        short,
        long,
        value_name = "bias",
        default_value = "as-is",
        value_parser = BiasMode::from_str
    )]
    bias: BiasMode,

    /// The edge to count
    ///
    /// One of 'rising' or 'falling'.
    #[arg(
        short,
        long,
        value_name = "edge",
        default_value = "rising",
        value_parser = EdgeMode::from_str
    )]
    edge: EdgeMode,

    /// Do not switch to realtime scheduling or lock memory
    #[arg(long)]
    no_realtime: bool,

    #[command(flatten)]
    time_opts: common::TimeOpts,

    #[command(flatten)]
    retry_opts: common::RetryOpts,

    #[command(flatten)]
    emit: common::EmitOpts,
}

impl Opts {
    fn config(&self) -> Result<(Builder, SamplerConfig)> {
        let (chip, offset) = common::resolve_line(self.line.as_deref(), self.board)?;
        let mut cfg = Config::new(offset);
        cfg.with_edge(self.edge)
            .with_bias(self.bias)
            .with_debounce_period_us(self.debounce)
            .with_consumer(self.label.as_str());
        let scfg = SamplerConfig::default().with_idle_timeout(self.idle_timeout);
        Ok((Builder::new(chip, cfg), scfg))
    }

    fn sink(&self, req: &Request) -> Box<dyn ReportSink> {
        let clock = SystemClock(self.time_opts.clock());
        let timefmt = self.time_opts.timefmt();
        #[cfg(feature = "json")]
        if self.emit.json {
            let line = json::LineInfo::new(req.chip_path(), req.config());
            return Box::new(
                json::JsonEmitter::new(std::io::stdout(), clock, timefmt).with_line(line),
            );
        }
        #[cfg(not(feature = "json"))]
        let _ = req;
        Box::new(Emitter::new(std::io::stdout(), clock, timefmt))
    }
}

fn cmd(opts: &Opts) -> Result<()> {
    let (builder, scfg) = opts.config()?;
    let offset = builder.config().offset();
    let chip = builder.chip().to_path_buf();
    let req = builder.request().map_err(|cause| common::Error::Request {
        offset,
        chip,
        cause,
    })?;
    log::info!(
        "counting {} edges on {}:{}",
        req.config().edge(),
        req.chip_path().display(),
        req.offset()
    );
    if !opts.no_realtime {
        latency::reduce_latency();
    }
    let mut sink = opts.sink(&req);
    let mut sampler = Sampler::new(req, scfg);
    if let Some(policy) = opts.retry_opts.policy() {
        sampler = sampler.with_policy(policy);
    }
    Err(common::Error::Stopped(sampler.run(sink.as_mut())).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pulsecount::report::{ClockId, TimeFmt};

    fn parse(args: &[&str]) -> Opts {
        let mut argv = vec!["pulse-counting"];
        argv.extend_from_slice(args);
        Opts::try_parse_from(argv).expect("args should be valid")
    }

    fn parse_err(args: &[&str]) -> clap::error::ErrorKind {
        let mut argv = vec!["pulse-counting"];
        argv.extend_from_slice(args);
        Opts::try_parse_from(argv)
            .expect_err("args should be invalid")
            .kind()
    }

    #[test]
    fn command() {
        Opts::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let opts = parse(&[]);
        let (builder, scfg) = opts.config().unwrap();
        assert_eq!(builder.chip(), std::path::Path::new("/dev/gpiochip0"));
        let cfg = builder.config();
        assert_eq!(cfg.offset(), 26);
        assert_eq!(cfg.edge(), EdgeMode::Rising);
        assert_eq!(cfg.bias(), BiasMode::AsIs);
        assert_eq!(cfg.debounce_period_us(), None);
        assert_eq!(cfg.consumer(), "pulse-counting");
        assert_eq!(scfg, SamplerConfig::default());
        assert!(!opts.no_realtime);
        assert_eq!(opts.time_opts.clock(), ClockId::Tai);
        assert_eq!(opts.time_opts.timefmt(), TimeFmt::Seconds);
        assert_eq!(opts.retry_opts.policy(), None);
        assert_eq!(opts.emit.verbose, 0);
    }

    #[test]
    fn all_options() {
        let opts = parse(&[
            "-L",
            "meter",
            "-D",
            "5ms",
            "-I",
            "2s",
            "-b",
            "pull-up",
            "-e",
            "falling",
            "--no-realtime",
            "--utc",
            "--retry-limit",
            "3",
            "-vv",
            "gpiochip1:P1-11",
        ]);
        let (builder, scfg) = opts.config().unwrap();
        assert_eq!(builder.chip(), std::path::Path::new("/dev/gpiochip1"));
        let cfg = builder.config();
        assert_eq!(cfg.offset(), 17);
        assert_eq!(cfg.edge(), EdgeMode::Falling);
        assert_eq!(cfg.bias(), BiasMode::PullUp);
        assert_eq!(cfg.debounce_period_us(), Some(5000));
        assert_eq!(cfg.consumer(), "meter");
        assert_eq!(scfg.idle_timeout, Some(Duration::from_secs(2)));
        assert!(opts.no_realtime);
        assert_eq!(opts.time_opts.clock(), ClockId::Realtime);
        assert_eq!(opts.time_opts.timefmt(), TimeFmt::Utc);
        assert!(opts.retry_opts.policy().is_some());
        assert_eq!(opts.emit.verbose, 2);
    }

    #[test]
    fn invalid_options() {
        use clap::error::ErrorKind::{ArgumentConflict, ValueValidation};

        assert_eq!(parse_err(&["-D", "5"]), ValueValidation);
        assert_eq!(parse_err(&["-D", "2h"]), ValueValidation);
        assert_eq!(parse_err(&["-I", "0us"]), ValueValidation);
        assert_eq!(parse_err(&["-I", "49h"]), ValueValidation);
        assert_eq!(parse_err(&["-b", "pullup"]), ValueValidation);
        assert_eq!(parse_err(&["-e", "both"]), ValueValidation);
        assert_eq!(parse_err(&["-e", "Rising"]), ValueValidation);
        assert_eq!(parse_err(&["--board", "bbb"]), ValueValidation);
        assert_eq!(parse_err(&["--retry-backoff", "fast"]), ValueValidation);
        assert_eq!(parse_err(&["--utc", "--localtime"]), ArgumentConflict);
        assert_eq!(
            parse_err(&["--clock", "monotonic", "--utc"]),
            ArgumentConflict
        );
    }

    #[test]
    fn unknown_pin() {
        let opts = parse(&["P1-1"]);
        let e = opts.config().unwrap_err();
        assert!(matches!(
            e.downcast_ref::<pulsecount::Error>(),
            Some(pulsecount::Error::UnknownPin { .. })
        ));
    }

    #[test]
    fn missing_chip() {
        let opts = parse(&["--no-realtime", "/nonexistent/gpiochip0:3"]);
        let e = cmd(&opts).unwrap_err();
        let msg = common::format_error(&opts.emit, &e);
        assert!(msg.starts_with("unable to request line 3 on chip '/nonexistent/gpiochip0': "));
        assert!(msg.contains(&pulsecount::Errno(libc::ENOENT).to_string()));
        assert_eq!(common::exit_status(&e), libc::ENOENT as u8);
    }

    #[test]
    fn not_a_chip() {
        let opts = parse(&["--no-realtime", "/dev/null:3"]);
        let e = cmd(&opts).unwrap_err();
        let errno = common::exit_status(&e);
        assert_ne!(errno, 1);
        let msg = common::format_error(&opts.emit, &e);
        assert!(msg.starts_with("unable to request line 3 on chip '/dev/null': "));
        assert!(msg.contains("get_line"));
        assert!(msg.contains(&pulsecount::Errno(errno.into()).to_string()));
    }
}
