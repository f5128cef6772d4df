//! Throttling by an unconditional sleep before each iteration.

use std::thread;
use std::time::Duration;

use crate::unit::{Control, ExecutionUnit, UnitConfig, Worker};

use super::clamp_micros;

/// Execution unit that sleeps a fixed delay before every iteration.
pub type FixedDelayUnit<W> = ExecutionUnit<FixedDelay<W>>;

/// Wraps a worker with an unconditional sleep before each `do_work`.
///
/// No compensation for work time: the iteration period is at least the
/// delay plus however long the work takes.
#[derive(Debug, Clone)]
pub struct FixedDelay<W> {
    sleep_duration: Duration,
    inner: W,
}

impl<W: Worker> FixedDelay<W> {
    /// Wraps `inner` with `delay` before each iteration.
    #[must_use]
    pub const fn new(delay: Duration, inner: W) -> Self {
        Self {
            sleep_duration: delay,
            inner,
        }
    }

    /// Wraps `inner` with a delay in microseconds; negative values mean no
    /// delay.
    #[must_use]
    pub const fn from_micros(delay: i64, inner: W) -> Self {
        Self::new(clamp_micros(delay), inner)
    }

    /// Sleep taken before every iteration.
    #[must_use]
    pub const fn sleep_duration(&self) -> Duration {
        self.sleep_duration
    }

    /// The wrapped worker.
    #[must_use]
    pub const fn inner(&self) -> &W {
        &self.inner
    }

    /// The wrapped worker, mutably.
    pub fn inner_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Unwraps the worker.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Worker> Worker for FixedDelay<W> {
    fn init(&mut self) -> bool {
        self.inner.init()
    }

    fn uninit(&mut self) {
        self.inner.uninit();
    }

    fn pre_iteration(&mut self) {
        if !self.sleep_duration.is_zero() {
            thread::sleep(self.sleep_duration);
        }
        self.inner.pre_iteration();
    }

    fn do_work(&mut self, control: &Control) {
        self.inner.do_work(control);
    }

    fn post_iteration(&mut self) {
        self.inner.post_iteration();
    }
}

impl<W: Worker> ExecutionUnit<FixedDelay<W>> {
    /// Creates an idle unit that sleeps `delay` before every iteration.
    #[must_use]
    pub fn fixed_delay(delay: Duration, worker: W) -> Self {
        Self::new(FixedDelay::new(delay, worker))
    }

    /// Like [`fixed_delay`](Self::fixed_delay) with an explicit config.
    #[must_use]
    pub fn fixed_delay_with_config(delay: Duration, worker: W, config: UnitConfig) -> Self {
        Self::with_config(FixedDelay::new(delay, worker), config)
    }
}
