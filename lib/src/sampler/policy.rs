// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::Fault;
use std::time::Duration;

/// What the sampler should do after a transient fault.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Action {
    /// Continue sampling immediately.
    Retry,

    /// Sleep for the period, then continue sampling.
    Sleep(Duration),

    /// Stop sampling and return the fault to the caller.
    GiveUp,
}

/// Decides how the sampler responds to transient faults.
pub trait ErrorPolicy {
    /// Called for each fault.
    ///
    /// * `fault` - The fault that occurred.
    /// * `consecutive` - The number of faults since the last successful sample,
    ///   including this one.
    fn on_fault(&mut self, fault: &Fault, consecutive: u32) -> Action;
}

/// Log and continue, without limit or delay.
///
/// A persistently failing line will keep the sampler spinning.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Persist;

impl ErrorPolicy for Persist {
    fn on_fault(&mut self, _fault: &Fault, _consecutive: u32) -> Action {
        Action::Retry
    }
}

/// Retry with an optional exponential backoff and an optional limit.
///
/// The backoff doubles with each consecutive fault, up to 64 times the
/// initial period.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RetryPolicy {
    limit: Option<u32>,
    backoff: Option<Duration>,
}

impl RetryPolicy {
    /// The maximum number of doublings of the backoff period.
    const MAX_DOUBLINGS: u32 = 6;

    /// Create a policy that retries immediately, and indefinitely.
    pub fn new() -> Self {
        Self::default()
    }

    /// Give up once more than `limit` consecutive faults have been retried.
    pub fn with_limit<L: Into<Option<u32>>>(mut self, limit: L) -> Self {
        self.limit = limit.into();
        self
    }

    /// Sleep for `backoff` after the first of a run of faults, doubling for each subsequent fault.
    pub fn with_backoff<B: Into<Option<Duration>>>(mut self, backoff: B) -> Self {
        self.backoff = backoff.into().filter(|b| !b.is_zero());
        self
    }
}

impl ErrorPolicy for RetryPolicy {
    fn on_fault(&mut self, _fault: &Fault, consecutive: u32) -> Action {
        if let Some(limit) = self.limit {
            if consecutive > limit {
                return Action::GiveUp;
            }
        }
        match self.backoff {
            None => Action::Retry,
            Some(initial) => {
                let doublings = consecutive.saturating_sub(1).min(Self::MAX_DOUBLINGS);
                Action::Sleep(initial.saturating_mul(1 << doublings))
            }
        }
    }
}
