// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::{EdgeSource, Fault};
use std::cmp::max;

/// A reusable buffer for reading edge events in bulk.
///
/// Sized once, on creation, and reused for every read.
/// Only the number of events read is of interest, so the events themselves
/// are never decoded.
#[derive(Clone, Debug)]
pub struct EventBatch {
    /// The size of an individual edge event stored in the buffer.
    event_size: usize,

    /// The buffer for uAPI edge events, sized by event size and capacity.
    ///
    /// u64 aligned as events contain u64 fields.
    buf: Vec<u64>,
}

impl EventBatch {
    /// Create a batch able to hold `capacity` events of `event_size` bytes.
    pub fn new(event_size: usize, capacity: usize) -> EventBatch {
        let event_size = max(event_size, 1);
        let words = (max(capacity, 1) * event_size + 7) / 8;
        EventBatch {
            event_size,
            buf: vec![0; words],
        }
    }

    /// The number of events that can be read in one batch.
    pub fn capacity(&self) -> usize {
        self.buf.len() * 8 / self.event_size
    }

    /// The size of one event, in bytes.
    pub fn event_size(&self) -> usize {
        self.event_size
    }

    /// Read one batch of events from the source.
    ///
    /// Blocks if the source has no events available.
    ///
    /// Returns the number of events read.
    pub fn fill<S: EdgeSource + ?Sized>(&mut self, src: &mut S) -> Result<usize, Fault> {
        let len = src.read_events(&mut self.buf).map_err(Fault::Read)?;
        if len % self.event_size != 0 {
            return Err(Fault::Malformed {
                len,
                size: self.event_size,
            });
        }
        Ok(len / self.event_size)
    }
}
