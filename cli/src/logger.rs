// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Writes diagnostics to stderr, leaving stdout for reports.
#[derive(Debug)]
pub struct StderrLogger {
    level: LevelFilter,
}

impl StderrLogger {
    pub fn new(level: LevelFilter) -> Self {
        StderrLogger { level }
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("{}", format_record(record.level(), record.args()));
        }
    }

    fn flush(&self) {}
}

fn format_record(level: Level, args: &std::fmt::Arguments) -> String {
    format!("{}: {}", level.as_str().to_lowercase(), args)
}

/// The maximum level logged for the number of `--verbose` flags.
pub fn level_from_count(count: u8) -> LevelFilter {
    match count {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

pub fn init(verbose: u8) -> Result<(), SetLoggerError> {
    let level = level_from_count(verbose);
    log::set_boxed_logger(Box::new(StderrLogger::new(level)))
        .map(|()| log::set_max_level(level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity() {
        assert_eq!(level_from_count(0), LevelFilter::Warn);
        assert_eq!(level_from_count(1), LevelFilter::Info);
        assert_eq!(level_from_count(2), LevelFilter::Debug);
        assert_eq!(level_from_count(3), LevelFilter::Trace);
        assert_eq!(level_from_count(u8::MAX), LevelFilter::Trace);
    }

    #[test]
    fn enabled() {
        let l = StderrLogger::new(LevelFilter::Info);
        let md = |level| Metadata::builder().level(level).build();
        assert!(l.enabled(&md(Level::Error)));
        assert!(l.enabled(&md(Level::Warn)));
        assert!(l.enabled(&md(Level::Info)));
        assert!(!l.enabled(&md(Level::Debug)));
        assert!(!l.enabled(&md(Level::Trace)));
    }

    #[test]
    fn format() {
        assert_eq!(
            format_record(Level::Warn, &format_args!("read failed: {}", 5)),
            "warn: read failed: 5"
        );
    }
}
