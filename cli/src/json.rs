// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use pulsecount::line::{BiasMode, EdgeMode};
use pulsecount::report::{format_time, Clock, Event, ReportSink, TimeFmt};
use pulsecount::request::Config;
use pulsecount::Offset;
use serde_derive::Serialize;
use std::io::{self, Write};
use std::path::Path;

/// The counted line, as described in the `started` report.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct LineInfo {
    chip: String,
    offset: Offset,
    edge: EdgeMode,
    bias: BiasMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    debounce_period_us: Option<u32>,
}

impl LineInfo {
    pub fn new(chip: &Path, cfg: &Config) -> Self {
        LineInfo {
            chip: chip.display().to_string(),
            offset: cfg.offset(),
            edge: cfg.edge(),
            bias: cfg.bias(),
            debounce_period_us: cfg.debounce_period_us(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
enum Payload<'a> {
    Started {
        #[serde(skip_serializing_if = "Option::is_none")]
        line: Option<&'a LineInfo>,
    },
    Idle,
    Pulses {
        count: usize,
    },
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    timestamp: String,
    #[serde(flatten)]
    payload: Payload<'a>,
}

/// Writes timestamped reports as JSON, one object per line.
pub struct JsonEmitter<W: Write, C: Clock> {
    out: W,
    clock: C,
    timefmt: TimeFmt,
    line: Option<LineInfo>,
}

impl<W: Write, C: Clock> JsonEmitter<W, C> {
    pub fn new(out: W, clock: C, timefmt: TimeFmt) -> Self {
        JsonEmitter {
            out,
            clock,
            timefmt,
            line: None,
        }
    }

    /// Describe the counted line in the `started` report.
    pub fn with_line(mut self, line: LineInfo) -> Self {
        self.line = Some(line);
        self
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write, C: Clock> ReportSink for JsonEmitter<W, C> {
    fn emit(&mut self, event: Event) -> io::Result<()> {
        let payload = match event {
            Event::Started => Payload::Started {
                line: self.line.as_ref(),
            },
            Event::Idle => Payload::Idle,
            Event::Pulses(count) => Payload::Pulses { count },
        };
        let report = Report {
            timestamp: format_time(&self.clock.now(), self.timefmt),
            payload,
        };
        serde_json::to_writer(&mut self.out, &report)?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulsecount::report::Timestamp;

    struct Fixed;

    impl Clock for Fixed {
        fn now(&self) -> Timestamp {
            Timestamp {
                secs: 1_700_000_000,
                nsecs: 5_000,
            }
        }
    }

    #[test]
    fn reports() {
        let mut e = JsonEmitter::new(Vec::new(), Fixed, TimeFmt::Seconds);
        e.emit(Event::Started).unwrap();
        e.emit(Event::Pulses(12)).unwrap();
        e.emit(Event::Idle).unwrap();
        let out = String::from_utf8(e.into_inner()).unwrap();
        assert_eq!(
            out,
            "{\"timestamp\":\"1700000000.000005\",\"event\":\"started\"}\n\
             {\"timestamp\":\"1700000000.000005\",\"event\":\"pulses\",\"count\":12}\n\
             {\"timestamp\":\"1700000000.000005\",\"event\":\"idle\"}\n"
        );
    }

    #[test]
    fn started_with_line() {
        let mut cfg = Config::new(26);
        cfg.with_edge(EdgeMode::Falling).with_bias(BiasMode::PullDown);
        let line = LineInfo::new(Path::new("/dev/gpiochip0"), &cfg);
        let mut e = JsonEmitter::new(Vec::new(), Fixed, TimeFmt::Seconds).with_line(line);
        e.emit(Event::Started).unwrap();
        e.emit(Event::Pulses(2)).unwrap();
        let out = String::from_utf8(e.into_inner()).unwrap();
        assert_eq!(
            out,
            "{\"timestamp\":\"1700000000.000005\",\"event\":\"started\",\
             \"line\":{\"chip\":\"/dev/gpiochip0\",\"offset\":26,\"edge\":\"falling\",\"bias\":\"pull-down\"}}\n\
             {\"timestamp\":\"1700000000.000005\",\"event\":\"pulses\",\"count\":2}\n"
        );

        cfg.with_debounce_period_us(5000);
        let line = LineInfo::new(Path::new("/dev/gpiochip1"), &cfg);
        let v = serde_json::to_value(&line).unwrap();
        assert_eq!(v["debounce_period_us"], 5000);
        assert_eq!(v["bias"], "pull-down");
    }

    #[test]
    fn utc() {
        let mut e = JsonEmitter::new(Vec::new(), Fixed, TimeFmt::Utc);
        e.emit(Event::Pulses(1)).unwrap();
        let out = String::from_utf8(e.into_inner()).unwrap();
        assert_eq!(
            out,
            "{\"timestamp\":\"2023-11-14T22:13:20.000005Z\",\"event\":\"pulses\",\"count\":1}\n"
        );
    }
}
