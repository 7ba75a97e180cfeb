// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::report::{Event, ReportSink};
use crate::{Error, Result};
use pulsecount_uapi::{self as uapi, LINES_MAX};
use std::time::Duration;

mod batch;
pub use self::batch::EventBatch;

mod policy;
pub use self::policy::{Action, ErrorPolicy, Persist, RetryPolicy};

/// The maximum number of events read in one batch.
///
/// Matches the default kernel buffer of 16 events per line, for the maximum
/// number of lines in a request.
pub const MAX_EVENTS: usize = LINES_MAX * 16;

/// A source of edge events, such as a [`Request`].
///
/// [`Request`]: crate::request::Request
pub trait EdgeSource {
    /// Wait for an edge event to be available.
    ///
    /// Returns false if the timeout expired first.
    ///
    /// * `timeout` - The maximum time to wait, or `None` to wait indefinitely.
    fn wait_event(&mut self, timeout: Option<Duration>) -> uapi::Result<bool>;

    /// Read as many raw edge events as are available and fit into the buffer.
    ///
    /// Blocks until at least one event is available.
    ///
    /// Returns the number of bytes read.
    fn read_events(&mut self, buf: &mut [u64]) -> uapi::Result<usize>;

    /// The number of bytes used to encode a single edge event.
    fn event_size(&self) -> usize;
}

impl<S: EdgeSource + ?Sized> EdgeSource for &mut S {
    fn wait_event(&mut self, timeout: Option<Duration>) -> uapi::Result<bool> {
        (**self).wait_event(timeout)
    }

    fn read_events(&mut self, buf: &mut [u64]) -> uapi::Result<usize> {
        (**self).read_events(buf)
    }

    fn event_size(&self) -> usize {
        (**self).event_size()
    }
}

/// A failure of a single sample that does not prevent further sampling.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Fault {
    /// Waiting for events failed.
    #[error("waiting for edge events failed: {0}")]
    Wait(#[source] uapi::Error),

    /// Reading events failed.
    #[error("reading edge events failed: {0}")]
    Read(#[source] uapi::Error),

    /// The read returned a partial event.
    #[error("read {len} bytes, which is not a multiple of the {size} byte edge event")]
    Malformed { len: usize, size: usize },
}

impl Fault {
    /// The OS error number underlying the fault, if any.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Fault::Wait(e) | Fault::Read(e) => Some(e.errno()),
            Fault::Malformed { .. } => None,
        }
    }
}

/// The outcome of a single iteration of the [`Sampler`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Step {
    /// The event was reported.
    Reported(Event),

    /// The sample failed and nothing was reported.
    Faulted(Fault),
}

/// The configuration of a [`Sampler`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SamplerConfig {
    /// Report idle if no edges arrive within this period.
    ///
    /// If `None` the sampler blocks until edges arrive.
    pub idle_timeout: Option<Duration>,

    /// The maximum number of events read in one batch.
    pub batch_capacity: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig {
            idle_timeout: None,
            batch_capacity: MAX_EVENTS,
        }
    }
}

impl SamplerConfig {
    /// Set the idle timeout.
    pub fn with_idle_timeout<T: Into<Option<Duration>>>(mut self, timeout: T) -> Self {
        self.idle_timeout = timeout.into();
        self
    }
}

/// Counts the edge events read from a source.
///
/// Each iteration either waits for events, if an idle timeout is set, and
/// reports idle if none arrive, or reads a batch of events and reports the
/// number read.
///
/// Failures within an iteration are [`Fault`]s, which are logged and passed
/// to the [`ErrorPolicy`] to decide whether to continue.
/// The default policy, [`Persist`], always continues.
pub struct Sampler<S: EdgeSource> {
    source: S,
    cfg: SamplerConfig,
    policy: Box<dyn ErrorPolicy>,
    batch: EventBatch,
    faults: u32,
}

impl<S: EdgeSource> Sampler<S> {
    /// Create a sampler draining the source.
    pub fn new(source: S, cfg: SamplerConfig) -> Self {
        let batch = EventBatch::new(source.event_size(), cfg.batch_capacity);
        Sampler {
            source,
            cfg,
            policy: Box::new(Persist),
            batch,
            faults: 0,
        }
    }

    /// Replace the error policy.
    pub fn with_policy<P: ErrorPolicy + 'static>(mut self, policy: P) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// The configuration of the sampler.
    pub fn config(&self) -> &SamplerConfig {
        &self.cfg
    }

    /// The source being sampled.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Report that sampling has started.
    pub fn start<K: ReportSink + ?Sized>(&mut self, sink: &mut K) -> Result<()> {
        emit(sink, Event::Started)
    }

    /// Perform a single iteration.
    ///
    /// Returns an error only if the event cannot be reported, or if the
    /// policy gives up after a fault.
    pub fn step<K: ReportSink + ?Sized>(&mut self, sink: &mut K) -> Result<Step> {
        match self.sample() {
            Ok(event) => {
                self.faults = 0;
                emit(sink, event)?;
                Ok(Step::Reported(event))
            }
            Err(fault) => {
                self.faults = self.faults.saturating_add(1);
                log::warn!("{fault}");
                match self.policy.on_fault(&fault, self.faults) {
                    Action::Retry => {}
                    Action::Sleep(period) => std::thread::sleep(period),
                    Action::GiveUp => {
                        return Err(Error::GaveUp {
                            count: self.faults,
                            last: fault,
                        })
                    }
                }
                Ok(Step::Faulted(fault))
            }
        }
    }

    /// Report the start, then sample indefinitely.
    ///
    /// Only returns if an event cannot be reported or the policy gives up.
    pub fn run<K: ReportSink + ?Sized>(&mut self, sink: &mut K) -> Error {
        if let Err(e) = self.start(sink) {
            return e;
        }
        loop {
            if let Err(e) = self.step(sink) {
                return e;
            }
        }
    }

    fn sample(&mut self) -> std::result::Result<Event, Fault> {
        if let Some(timeout) = self.cfg.idle_timeout {
            if !self
                .source
                .wait_event(Some(timeout))
                .map_err(Fault::Wait)?
            {
                return Ok(Event::Idle);
            }
        }
        self.batch.fill(&mut self.source).map(Event::Pulses)
    }
}

fn emit<K: ReportSink + ?Sized>(sink: &mut K, event: Event) -> Result<()> {
    sink.emit(event).map_err(|e| Error::Emit(e.kind()))
}
