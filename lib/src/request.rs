// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::sampler::EdgeSource;
use crate::Offset;
use pulsecount_uapi::{self as uapi, v2};
use std::fs::File;
use std::mem;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod builder;
pub use self::builder::Builder;

mod config;
pub use self::config::{Config, DEFAULT_CONSUMER};

/// An active request of a single line for edge counting.
///
/// Holds both the line request file and the chip it was requested from.
/// Both are closed when the request is dropped.
#[derive(Debug)]
pub struct Request {
    /// The request file.
    f: File,

    /// The chip the line was requested from.
    ///
    /// Not used once the line is requested, but held open for the life of the request.
    _chip: File,

    /// The path to the chip.
    path: PathBuf,

    /// The configuration the line was requested with.
    cfg: Config,
}

impl Request {
    /// The path to the chip the line belongs to.
    pub fn chip_path(&self) -> &Path {
        &self.path
    }

    /// The offset of the requested line.
    pub fn offset(&self) -> Offset {
        self.cfg.offset()
    }

    /// The configuration the line was requested with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Wait for an edge event to be available.
    ///
    /// Returns true if [`read_edge_events_into_slice`] will not block.
    ///
    /// * `timeout` - The maximum time to wait, or `None` to wait indefinitely.
    ///
    /// [`read_edge_events_into_slice`]: #method.read_edge_events_into_slice
    pub fn wait_edge_event(&self, timeout: Option<Duration>) -> uapi::Result<bool> {
        uapi::wait_event(&self.f, timeout)
    }

    /// Read as many raw edge events as are available and fit into the buffer.
    ///
    /// Will block until an edge event is available.
    ///
    /// Returns the number of bytes read.
    pub fn read_edge_events_into_slice(&self, buf: &mut [u64]) -> uapi::Result<usize> {
        uapi::read_event(&self.f, buf)
    }

    /// The number of bytes used to encode a single edge event.
    pub fn edge_event_size(&self) -> usize {
        mem::size_of::<v2::LineEdgeEvent>()
    }
}

impl EdgeSource for Request {
    fn wait_event(&mut self, timeout: Option<Duration>) -> uapi::Result<bool> {
        self.wait_edge_event(timeout)
    }

    fn read_events(&mut self, buf: &mut [u64]) -> uapi::Result<usize> {
        self.read_edge_events_into_slice(buf)
    }

    fn event_size(&self) -> usize {
        self.edge_event_size()
    }
}
