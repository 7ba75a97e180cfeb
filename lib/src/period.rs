// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{Error, Result};
use std::time::Duration;

/// The longest accepted debounce period, in microseconds (1 hour).
pub const DEBOUNCE_MAX_US: u64 = 3_600_000_000;

/// The longest accepted idle timeout, in microseconds (48 hours).
pub const IDLE_TIMEOUT_MAX_US: u64 = 172_800_000_000;

/// Parse a period of the form `<integer><unit>` into microseconds.
///
/// The unit is one of `us`, `ms`, `s`, `min` or `h`, and is required.
///
/// # Examples
/// ```
/// # use pulsecount::period::parse_period;
/// assert_eq!(parse_period("250ms"), Ok(250_000));
/// assert_eq!(parse_period("2min"), Ok(120_000_000));
/// assert!(parse_period("10").is_err());
/// ```
pub fn parse_period(s: &str) -> Result<u64> {
    let n = match s.find(|c: char| !c.is_ascii_digit()) {
        Some(n) if n > 0 => n,
        _ => return Err(Error::InvalidFormat(s.into())),
    };
    let (num, units) = s.split_at(n);
    let scale: u64 = match units {
        "us" => 1,
        "ms" => 1_000,
        "s" => 1_000_000,
        "min" => 60_000_000,
        "h" => 3_600_000_000,
        _ => return Err(Error::InvalidFormat(s.into())),
    };
    // all digits, so parse can only fail on overflow
    num.parse::<u64>()
        .ok()
        .and_then(|v| v.checked_mul(scale))
        .ok_or_else(|| Error::OutOfRange {
            name: "period",
            value: s.into(),
            range: "must fit in 64 bits of microseconds",
        })
}

/// Parse a debounce period into microseconds.
///
/// Zero, meaning no debounce, is accepted, as is anything up to one hour.
pub fn parse_debounce(s: &str) -> Result<u32> {
    let v = parse_period(s)?;
    if v > DEBOUNCE_MAX_US {
        return Err(Error::OutOfRange {
            name: "debounce period",
            value: s.into(),
            range: "0us .. 1h",
        });
    }
    // DEBOUNCE_MAX_US < u32::MAX
    Ok(v as u32)
}

/// Parse an idle timeout.
///
/// The timeout must be non-zero and no longer than 48 hours.
pub fn parse_idle_timeout(s: &str) -> Result<Duration> {
    let v = parse_period(s)?;
    if v == 0 || v > IDLE_TIMEOUT_MAX_US {
        return Err(Error::OutOfRange {
            name: "idle timeout",
            value: s.into(),
            range: "1us .. 48h",
        });
    }
    Ok(Duration::from_micros(v))
}
