// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::line::{BiasMode, EdgeMode};
use crate::period::DEBOUNCE_MAX_US;
use crate::{Error, Offset, Result};
use pulsecount_uapi::v2::{LineFlags, LineRequest};
use pulsecount_uapi::Offsets;

/// The consumer label applied if none is specified.
pub const DEFAULT_CONSUMER: &str = "pulse-counting";

/// The configuration of the counted line.
///
/// The line is always an input. The edge, bias, debounce and consumer
/// default to rising, as-is, none, and [`DEFAULT_CONSUMER`] respectively.
///
/// The configuration is consumed by the [`Builder`] when the line is requested,
/// so it cannot change for the life of the [`Request`].
///
/// [`Builder`]: super::Builder
/// [`Request`]: super::Request
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    offset: Offset,
    edge: EdgeMode,
    bias: BiasMode,
    debounce_period_us: Option<u32>,
    consumer: String,
}

impl Config {
    /// Create a default configuration for the line with the given offset.
    pub fn new(offset: Offset) -> Config {
        Config {
            offset,
            edge: EdgeMode::default(),
            bias: BiasMode::default(),
            debounce_period_us: None,
            consumer: DEFAULT_CONSUMER.into(),
        }
    }

    /// Set the edge to count.
    pub fn with_edge(&mut self, edge: EdgeMode) -> &mut Self {
        self.edge = edge;
        self
    }

    /// Set the bias applied to the line.
    pub fn with_bias(&mut self, bias: BiasMode) -> &mut Self {
        self.bias = bias;
        self
    }

    /// Set the debounce period, in microseconds.
    ///
    /// A period of zero is passed to the kernel as is, which disables any
    /// debounce already applied to the line.
    pub fn with_debounce_period_us<P: Into<Option<u32>>>(&mut self, period: P) -> &mut Self {
        self.debounce_period_us = period.into();
        self
    }

    /// Set the consumer label applied to the line.
    ///
    /// The label is truncated to fit the uAPI name buffer when requested.
    pub fn with_consumer<N: Into<String>>(&mut self, consumer: N) -> &mut Self {
        self.consumer = consumer.into();
        self
    }

    /// The offset of the line on the chip.
    pub fn offset(&self) -> Offset {
        self.offset
    }

    /// The edge counted.
    pub fn edge(&self) -> EdgeMode {
        self.edge
    }

    /// The bias applied to the line.
    pub fn bias(&self) -> BiasMode {
        self.bias
    }

    /// The debounce period, in microseconds, if any.
    pub fn debounce_period_us(&self) -> Option<u32> {
        self.debounce_period_us
    }

    /// The consumer label.
    pub fn consumer(&self) -> &str {
        &self.consumer
    }

    /// The uAPI flags for the line.
    pub fn flags(&self) -> LineFlags {
        let mut flags = LineFlags::INPUT;
        self.edge.apply(&mut flags);
        self.bias.apply(&mut flags);
        flags
    }

    /// Check the configuration is acceptable to the kernel.
    pub fn validate(&self) -> Result<()> {
        if let Some(period) = self.debounce_period_us {
            if period as u64 > DEBOUNCE_MAX_US {
                return Err(Error::OutOfRange {
                    name: "debounce period",
                    value: format!("{period}us"),
                    range: "0us .. 1h",
                });
            }
        }
        Ok(())
    }

    /// Convert to the uAPI request.
    ///
    /// The conversion is deterministic - equal configs produce identical requests.
    pub fn to_uapi(&self) -> LineRequest {
        let mut lr = LineRequest {
            num_lines: 1,
            offsets: Offsets::from_slice(&[self.offset]),
            consumer: self.consumer.as_str().into(),
            ..Default::default()
        };
        lr.config.flags = self.flags();
        if let Some(period) = self.debounce_period_us {
            // the only line in the request is index 0
            lr.config.add_debounce(period, 0x01);
        }
        lr
    }
}
