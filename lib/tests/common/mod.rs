// SPDX-FileCopyrightText: 2023 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use pulsecount::sampler::EdgeSource;
use pulsecount_uapi as uapi;
use std::collections::VecDeque;
use std::time::Duration;

// size of a kernel edge event
pub const EVENT_SIZE: usize = 48;

/// A scripted stand-in for a requested line.
///
/// Waits and reads return the scripted results in order, and panic once
/// the script is exhausted.
#[derive(Debug, Default)]
pub struct Script {
    pub waits: VecDeque<uapi::Result<bool>>,
    pub reads: VecDeque<uapi::Result<usize>>,
    pub wait_count: usize,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wait(mut self, ready: bool) -> Self {
        self.waits.push_back(Ok(ready));
        self
    }

    pub fn wait_err(mut self, errno: i32) -> Self {
        self.waits.push_back(Err(os_err(errno)));
        self
    }

    pub fn events(mut self, n: usize) -> Self {
        self.reads.push_back(Ok(n * EVENT_SIZE));
        self
    }

    pub fn bytes(mut self, n: usize) -> Self {
        self.reads.push_back(Ok(n));
        self
    }

    pub fn read_err(mut self, errno: i32) -> Self {
        self.reads.push_back(Err(os_err(errno)));
        self
    }
}

impl EdgeSource for Script {
    fn wait_event(&mut self, _timeout: Option<Duration>) -> uapi::Result<bool> {
        self.wait_count += 1;
        self.waits.pop_front().expect("wait beyond end of script")
    }

    fn read_events(&mut self, buf: &mut [u64]) -> uapi::Result<usize> {
        let res = self.reads.pop_front().expect("read beyond end of script");
        if let Ok(n) = res {
            assert!(n <= buf.len() * 8, "read larger than the buffer");
        }
        res
    }

    fn event_size(&self) -> usize {
        EVENT_SIZE
    }
}

pub fn os_err(errno: i32) -> uapi::Error {
    uapi::Error::Os(errno::Errno(errno))
}
