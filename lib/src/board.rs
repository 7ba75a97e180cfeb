// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{Error, Offset, Result};
use std::fmt;
use std::str::FromStr;

/// A board whose header pins can be named instead of using line offsets.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Board {
    /// The 40 pin P1 header of the Raspberry Pi, on `gpiochip0`.
    #[default]
    RaspberryPi,
}

/// The chip that provides the header lines on the default board.
pub const DEFAULT_CHIP: &str = "gpiochip0";

/// The header pin counted if none is specified.
pub const DEFAULT_PIN: &str = "P1-37";

// Indexed by header pin number - 1.
// None for power and ground pins.
const RPI_P1: [Option<Offset>; 40] = [
    None,     // 1: 3.3v
    None,     // 2: 5v
    Some(2),  // 3
    None,     // 4: 5v
    Some(3),  // 5
    None,     // 6: ground
    Some(4),  // 7
    Some(14), // 8
    None,     // 9: ground
    Some(15), // 10
    Some(17), // 11
    Some(18), // 12
    Some(27), // 13
    None,     // 14: ground
    Some(22), // 15
    Some(23), // 16
    None,     // 17: 3.3v
    Some(24), // 18
    Some(10), // 19
    None,     // 20: ground
    Some(9),  // 21
    Some(25), // 22
    Some(11), // 23
    Some(8),  // 24
    None,     // 25: ground
    Some(7),  // 26
    Some(0),  // 27
    Some(1),  // 28
    Some(5),  // 29
    None,     // 30: ground
    Some(6),  // 31
    Some(12), // 32
    Some(13), // 33
    None,     // 34: ground
    Some(19), // 35
    Some(16), // 36
    Some(26), // 37
    Some(20), // 38
    None,     // 39: ground
    Some(21), // 40
];

impl Board {
    /// The line offset wired to a numbered header pin.
    ///
    /// Returns None for pins that are not GPIOs, such as power and ground,
    /// and for pins beyond the header.
    pub fn header_offset(self, pin: u32) -> Option<Offset> {
        match self {
            Board::RaspberryPi => {
                let idx = usize::try_from(pin.checked_sub(1)?).ok()?;
                RPI_P1.get(idx).copied().flatten()
            }
        }
    }

    /// Resolve a pin, identified either by line offset or header pin name,
    /// to a line offset.
    ///
    /// Header pins are named `P1-<n>` or `P1_<n>`.
    ///
    /// # Examples
    /// ```
    /// # use pulsecount::board::Board;
    /// let rpi = Board::RaspberryPi;
    /// assert_eq!(rpi.resolve_pin("P1-37"), Ok(26));
    /// assert_eq!(rpi.resolve_pin("17"), Ok(17));
    /// assert!(rpi.resolve_pin("P1-39").is_err());
    /// ```
    pub fn resolve_pin(self, pin: &str) -> Result<Offset> {
        if let Ok(offset) = pin.parse::<Offset>() {
            return Ok(offset);
        }
        let unknown = || Error::UnknownPin {
            board: self,
            pin: pin.into(),
        };
        let num = pin
            .strip_prefix("P1-")
            .or_else(|| pin.strip_prefix("P1_"))
            .ok_or_else(unknown)?;
        num.parse::<u32>()
            .ok()
            .and_then(|n| self.header_offset(n))
            .ok_or_else(unknown)
    }
}

impl FromStr for Board {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "rpi" | "raspberry-pi" => Ok(Board::RaspberryPi),
            _ => Err(Error::InvalidMode {
                kind: "board",
                value: s.into(),
                expected: "'rpi'",
            }),
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Board::RaspberryPi => write!(f, "rpi"),
        }
    }
}
