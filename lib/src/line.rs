// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::Error;
use pulsecount_uapi::v2::LineFlags;
#[cfg(feature = "serde")]
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The edge that is counted.
///
/// Only one edge may be counted.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum EdgeMode {
    /// Count transitions from *inactive* to *active*.
    #[default]
    Rising,

    /// Count transitions from *active* to *inactive*.
    Falling,
}

impl EdgeMode {
    /// The flag bit for the mode.
    pub fn flags(self) -> LineFlags {
        match self {
            EdgeMode::Rising => LineFlags::EDGE_RISING,
            EdgeMode::Falling => LineFlags::EDGE_FALLING,
        }
    }

    /// Replace the edge detection bits in `flags` with those of the mode.
    pub fn apply(self, flags: &mut LineFlags) {
        flags.remove(LineFlags::EDGES);
        flags.insert(self.flags());
    }
}

impl FromStr for EdgeMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rising" => Ok(EdgeMode::Rising),
            "falling" => Ok(EdgeMode::Falling),
            _ => Err(Error::InvalidMode {
                kind: "edge",
                value: s.into(),
                expected: "'rising' or 'falling'",
            }),
        }
    }
}

impl fmt::Display for EdgeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeMode::Rising => write!(f, "rising"),
            EdgeMode::Falling => write!(f, "falling"),
        }
    }
}

/// The bias applied to the line.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum BiasMode {
    /// Leave the bias as it is.
    #[default]
    AsIs,

    /// Disable any bias.
    Disabled,

    /// Pull the line up.
    PullUp,

    /// Pull the line down.
    PullDown,
}

impl BiasMode {
    /// The flag bit for the mode, if any.
    pub fn flags(self) -> LineFlags {
        match self {
            BiasMode::AsIs => LineFlags::empty(),
            BiasMode::Disabled => LineFlags::BIAS_DISABLED,
            BiasMode::PullUp => LineFlags::BIAS_PULL_UP,
            BiasMode::PullDown => LineFlags::BIAS_PULL_DOWN,
        }
    }

    /// Replace the bias bits in `flags` with those of the mode.
    pub fn apply(self, flags: &mut LineFlags) {
        flags.remove(LineFlags::BIASES);
        flags.insert(self.flags());
    }
}

impl FromStr for BiasMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "as-is" => Ok(BiasMode::AsIs),
            "disabled" => Ok(BiasMode::Disabled),
            "pull-up" => Ok(BiasMode::PullUp),
            "pull-down" => Ok(BiasMode::PullDown),
            _ => Err(Error::InvalidMode {
                kind: "bias",
                value: s.into(),
                expected: "'as-is', 'disabled', 'pull-up' or 'pull-down'",
            }),
        }
    }
}

impl fmt::Display for BiasMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BiasMode::AsIs => "as-is",
            BiasMode::Disabled => "disabled",
            BiasMode::PullUp => "pull-up",
            BiasMode::PullDown => "pull-down",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod edge_mode {
        use super::*;

        #[test]
        fn from_str() {
            assert_eq!("rising".parse::<EdgeMode>(), Ok(EdgeMode::Rising));
            assert_eq!("falling".parse::<EdgeMode>(), Ok(EdgeMode::Falling));
            for s in ["Rising", "FALLING", "both", "failing", ""] {
                assert!(
                    matches!(
                        s.parse::<EdgeMode>(),
                        Err(Error::InvalidMode { kind: "edge", .. })
                    ),
                    "input: {s:?}"
                );
            }
        }

        #[test]
        fn apply() {
            let mut flags = LineFlags::INPUT | LineFlags::EDGE_RISING | LineFlags::BIAS_PULL_UP;
            EdgeMode::Falling.apply(&mut flags);
            assert_eq!(
                flags,
                LineFlags::INPUT | LineFlags::EDGE_FALLING | LineFlags::BIAS_PULL_UP
            );
            EdgeMode::Rising.apply(&mut flags);
            assert_eq!(
                flags,
                LineFlags::INPUT | LineFlags::EDGE_RISING | LineFlags::BIAS_PULL_UP
            );

            // a corrupt group is repaired
            let mut flags = LineFlags::EDGES;
            EdgeMode::Falling.apply(&mut flags);
            assert_eq!(flags, LineFlags::EDGE_FALLING);
        }

        #[test]
        fn failed_parse_leaves_flags() {
            let mut flags = LineFlags::INPUT | LineFlags::EDGE_FALLING;
            if let Ok(mode) = "sideways".parse::<EdgeMode>() {
                mode.apply(&mut flags);
            }
            assert_eq!(flags, LineFlags::INPUT | LineFlags::EDGE_FALLING);
        }

        #[test]
        fn display() {
            for mode in [EdgeMode::Rising, EdgeMode::Falling] {
                assert_eq!(mode.to_string().parse::<EdgeMode>(), Ok(mode));
            }
        }
    }

    mod bias_mode {
        use super::*;

        #[test]
        fn from_str() {
            assert_eq!("as-is".parse::<BiasMode>(), Ok(BiasMode::AsIs));
            assert_eq!("disabled".parse::<BiasMode>(), Ok(BiasMode::Disabled));
            assert_eq!("pull-up".parse::<BiasMode>(), Ok(BiasMode::PullUp));
            assert_eq!("pull-down".parse::<BiasMode>(), Ok(BiasMode::PullDown));
            for s in ["as_is", "pullup", "Pull-Up", "up", ""] {
                assert!(
                    matches!(
                        s.parse::<BiasMode>(),
                        Err(Error::InvalidMode { kind: "bias", .. })
                    ),
                    "input: {s:?}"
                );
            }
        }

        #[test]
        fn apply() {
            let base = LineFlags::INPUT | LineFlags::EDGE_RISING;
            let mut flags = base | LineFlags::BIAS_PULL_DOWN;

            BiasMode::PullUp.apply(&mut flags);
            assert_eq!(flags, base | LineFlags::BIAS_PULL_UP);

            BiasMode::Disabled.apply(&mut flags);
            assert_eq!(flags, base | LineFlags::BIAS_DISABLED);

            BiasMode::PullDown.apply(&mut flags);
            assert_eq!(flags, base | LineFlags::BIAS_PULL_DOWN);

            BiasMode::AsIs.apply(&mut flags);
            assert_eq!(flags, base);

            let mut flags = LineFlags::BIASES | LineFlags::INPUT;
            BiasMode::PullUp.apply(&mut flags);
            assert_eq!(flags, LineFlags::INPUT | LineFlags::BIAS_PULL_UP);
        }
    }
}
