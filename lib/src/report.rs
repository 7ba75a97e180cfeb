// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use chrono::{Local, TimeZone, Utc};
use std::fmt;
use std::io::{self, Write};
use std::time::{SystemTime, UNIX_EPOCH};

/// The event being reported.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Event {
    /// The sampler has started.
    Started,

    /// No edges arrived within the idle timeout.
    Idle,

    /// The number of edges read in one batch.
    Pulses(usize),
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Started => write!(f, "started"),
            Event::Idle => write!(f, "idle"),
            Event::Pulses(n) => write!(f, "{n}"),
        }
    }
}

/// A consumer of the sampler events.
pub trait ReportSink {
    /// Report an event.
    fn emit(&mut self, event: Event) -> io::Result<()>;
}

/// Collects the events, in order, without timestamps.
impl ReportSink for Vec<Event> {
    fn emit(&mut self, event: Event) -> io::Result<()> {
        self.push(event);
        Ok(())
    }
}

/// A moment in time, relative to the origin of the clock it was read from.
#[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
pub struct Timestamp {
    /// Whole seconds.
    pub secs: i64,

    /// Nanoseconds within the second.
    pub nsecs: u32,
}

impl Timestamp {
    /// Microseconds within the second.
    pub fn subsec_micros(&self) -> u32 {
        self.nsecs / 1000
    }
}

/// A source of report timestamps.
pub trait Clock {
    /// The current time.
    fn now(&self) -> Timestamp;
}

/// The system clock used to stamp reports.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ClockId {
    /// International Atomic Time - wall clock time without leap seconds.
    #[default]
    Tai,

    /// Wall clock time, subject to leap seconds and adjustment.
    Realtime,

    /// Time since an arbitrary point, typically boot, that never goes backwards.
    Monotonic,
}

impl ClockId {
    fn raw(self) -> libc::clockid_t {
        match self {
            ClockId::Tai => libc::CLOCK_TAI,
            ClockId::Realtime => libc::CLOCK_REALTIME,
            ClockId::Monotonic => libc::CLOCK_MONOTONIC,
        }
    }
}

/// Reads timestamps from a system clock.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SystemClock(pub ClockId);

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let mut ts = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        // SAFETY: ts is a valid timespec for the duration of the call.
        if unsafe { libc::clock_gettime(self.0.raw(), &mut ts) } == 0 {
            return Timestamp {
                secs: ts.tv_sec as i64,
                nsecs: ts.tv_nsec as u32,
            };
        }
        // only fails for clocks the kernel does not support
        let d = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Timestamp {
            secs: d.as_secs() as i64,
            nsecs: d.subsec_nanos(),
        }
    }
}

/// The format of report timestamps.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TimeFmt {
    /// Seconds and microseconds since the clock origin.
    #[default]
    Seconds,

    /// Local date and time. Only meaningful for wall clocks.
    Localtime,

    /// UTC date and time. Only meaningful for wall clocks.
    Utc,
}

/// Format a timestamp.
///
/// Falls back to seconds if the timestamp cannot be represented as a date.
pub fn format_time(ts: &Timestamp, timefmt: TimeFmt) -> String {
    let dt = match timefmt {
        TimeFmt::Seconds => None,
        TimeFmt::Localtime => Local
            .timestamp_opt(ts.secs, ts.nsecs)
            .single()
            .map(|t| t.format("%FT%T%.6f").to_string()),
        TimeFmt::Utc => Utc
            .timestamp_opt(ts.secs, ts.nsecs)
            .single()
            .map(|t| t.format("%FT%T%.6fZ").to_string()),
    };
    dt.unwrap_or_else(|| format!("{}.{:06}", ts.secs, ts.subsec_micros()))
}

/// Writes timestamped reports, one per line.
///
/// Each line has the form `<timestamp>: <event>`, e.g. `1700000037.000123: 5`.
pub struct Emitter<W: Write, C: Clock> {
    out: W,
    clock: C,
    timefmt: TimeFmt,
}

impl<W: Write, C: Clock> Emitter<W, C> {
    /// Create an emitter writing to `out`, stamping reports with `clock`.
    pub fn new(out: W, clock: C, timefmt: TimeFmt) -> Self {
        Emitter {
            out,
            clock,
            timefmt,
        }
    }

    /// Return the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write, C: Clock> ReportSink for Emitter<W, C> {
    fn emit(&mut self, event: Event) -> io::Result<()> {
        let ts = self.clock.now();
        writeln!(self.out, "{}: {}", format_time(&ts, self.timefmt), event)?;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FixedClock(Cell<Timestamp>);

    impl Clock for FixedClock {
        fn now(&self) -> Timestamp {
            let ts = self.0.get();
            self.0.set(Timestamp {
                secs: ts.secs + 1,
                ..ts
            });
            ts
        }
    }

    fn fixed(secs: i64, nsecs: u32) -> FixedClock {
        FixedClock(Cell::new(Timestamp { secs, nsecs }))
    }

    #[test]
    fn event_display() {
        assert_eq!(Event::Started.to_string(), "started");
        assert_eq!(Event::Idle.to_string(), "idle");
        assert_eq!(Event::Pulses(0).to_string(), "0");
        assert_eq!(Event::Pulses(1024).to_string(), "1024");
    }

    #[test]
    fn format_seconds() {
        let ts = Timestamp {
            secs: 1_700_000_037,
            nsecs: 123_456_789,
        };
        assert_eq!(format_time(&ts, TimeFmt::Seconds), "1700000037.123456");
        let ts = Timestamp { secs: 5, nsecs: 999 };
        assert_eq!(format_time(&ts, TimeFmt::Seconds), "5.000000");
    }

    #[test]
    fn format_utc() {
        let ts = Timestamp {
            secs: 1_700_000_000,
            nsecs: 42_000,
        };
        assert_eq!(
            format_time(&ts, TimeFmt::Utc),
            "2023-11-14T22:13:20.000042Z"
        );
    }

    #[test]
    fn emitter() {
        let mut e = Emitter::new(Vec::new(), fixed(100, 7_000), TimeFmt::Seconds);
        e.emit(Event::Started).unwrap();
        e.emit(Event::Idle).unwrap();
        e.emit(Event::Pulses(3)).unwrap();
        let out = String::from_utf8(e.into_inner()).unwrap();
        assert_eq!(
            out,
            "100.000007: started\n101.000007: idle\n102.000007: 3\n"
        );
    }

    #[test]
    fn emitter_write_error() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::ErrorKind::BrokenPipe.into())
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
        let mut e = Emitter::new(Broken, fixed(0, 0), TimeFmt::Seconds);
        assert_eq!(
            e.emit(Event::Idle).unwrap_err().kind(),
            io::ErrorKind::BrokenPipe
        );
    }

    #[test]
    fn system_clock() {
        for id in [ClockId::Tai, ClockId::Realtime, ClockId::Monotonic] {
            let clock = SystemClock(id);
            let a = clock.now();
            let b = clock.now();
            assert!(a.nsecs < 1_000_000_000);
            if id == ClockId::Monotonic {
                assert!(b >= a);
            }
        }
    }

    #[test]
    fn vec_sink() {
        let mut v = Vec::new();
        v.emit(Event::Started).unwrap();
        v.emit(Event::Pulses(2)).unwrap();
        assert_eq!(v, vec![Event::Started, Event::Pulses(2)]);
    }
}
