//! Fixed-rate pacing with an absolute deadline grid.

use std::time::{Duration, Instant};

use crate::trace::debug;
use crate::unit::{Control, ExecutionUnit, UnitConfig, Worker};

use super::{clamp_micros, sleep_until};

/// Longest accepted loop period, about 136 years.
///
/// Longer periods are clamped to this so `now + period` always fits in an
/// [`Instant`].
pub const MAX_LOOP_INTERVAL: Duration = Duration::from_secs(1 << 32);

/// Execution unit that runs at a fixed rate, compensating for work time.
pub type DriftCompensatingUnit<W> = ExecutionUnit<DriftCompensated<W>>;

/// Wraps a worker so iterations start on an absolute, evenly spaced grid.
///
/// The first `pre_iteration` of a run sets `next_deadline = now + period`.
/// Each `post_iteration` then sleeps until that deadline and advances it by
/// exactly one period, so sleep overshoot and work jitter never accumulate.
///
/// If an iteration overruns its deadline the grid is re-anchored at
/// `now + period` and the missed slots are dropped; the unit never fires
/// back-to-back iterations to catch up. Overruns are counted (see
/// [`overruns`](Self::overruns)).
///
/// A zero period disables all of the above.
#[derive(Debug, Clone)]
pub struct DriftCompensated<W> {
    loop_interval: Duration,
    spin_margin: Duration,
    /// `None` until the first iteration of a run.
    next_deadline: Option<Instant>,
    overruns: u64,
    inner: W,
}

impl<W: Worker> DriftCompensated<W> {
    /// Wraps `inner` with a loop period of `period`, clamped to
    /// [`MAX_LOOP_INTERVAL`].
    #[must_use]
    pub const fn new(period: Duration, inner: W) -> Self {
        let loop_interval = if period.as_secs() >= MAX_LOOP_INTERVAL.as_secs() {
            MAX_LOOP_INTERVAL
        } else {
            period
        };

        Self {
            loop_interval,
            spin_margin: Duration::ZERO,
            next_deadline: None,
            overruns: 0,
            inner,
        }
    }

    /// Wraps `inner` with a period in microseconds; non-positive values
    /// disable compensation.
    #[must_use]
    pub const fn from_micros(period: i64, inner: W) -> Self {
        Self::new(clamp_micros(period), inner)
    }

    /// Busy-waits the final `margin` before each deadline instead of
    /// sleeping through it.
    ///
    /// Trades CPU for wake-up precision; useful when the OS sleep granularity
    /// is a noticeable fraction of the period.
    #[must_use]
    pub fn with_spin_margin(mut self, margin: Duration) -> Self {
        self.spin_margin = margin;
        self
    }

    /// Target period between iteration starts.
    #[must_use]
    pub const fn loop_interval(&self) -> Duration {
        self.loop_interval
    }

    /// Busy-wait tail before each deadline; zero means a plain sleep.
    #[must_use]
    pub const fn spin_margin(&self) -> Duration {
        self.spin_margin
    }

    /// Number of iterations that finished past their deadline, across all
    /// runs.
    #[must_use]
    pub const fn overruns(&self) -> u64 {
        self.overruns
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

    /// Unwraps the worker, dropping the pacing state.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Worker> Worker for DriftCompensated<W> {
    fn init(&mut self) -> bool {
        // A panicked run skips uninit and may leave a deadline behind.
        self.next_deadline = None;
        self.inner.init()
    }

    fn uninit(&mut self) {
        self.inner.uninit();
        self.next_deadline = None;
    }

    fn pre_iteration(&mut self) {
        if !self.loop_interval.is_zero() && self.next_deadline.is_none() {
            self.next_deadline = Some(Instant::now() + self.loop_interval);
        }
        self.inner.pre_iteration();
    }

    fn do_work(&mut self, control: &Control) {
        self.inner.do_work(control);
    }

    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn post_iteration(&mut self) {
        self.inner.post_iteration();

        if self.loop_interval.is_zero() {
            return;
        }

        let now = Instant::now();

        match self.next_deadline {
            Some(deadline) if now < deadline => {
                sleep_until(deadline, self.spin_margin);
                self.next_deadline = Some(deadline + self.loop_interval);
            }
            missed => {
                if let Some(deadline) = missed {
                    self.overruns += 1;
                    debug!(
                        behind_us = u64::try_from((now - deadline).as_micros()).unwrap_or(u64::MAX),
                        period_us = u64::try_from(self.loop_interval.as_micros()).unwrap_or(u64::MAX),
                        "deadline missed, re-anchoring"
                    );
                }
                self.next_deadline = Some(now + self.loop_interval);
            }
        }
    }
}

impl<W: Worker> ExecutionUnit<DriftCompensated<W>> {
    /// Creates an idle unit that runs `worker` once per `period`.
    #[must_use]
    pub fn drift_compensating(period: Duration, worker: W) -> Self {
        Self::new(DriftCompensated::new(period, worker))
    }

    /// Like [`drift_compensating`](Self::drift_compensating) with an explicit
    /// config.
    #[must_use]
    pub fn drift_compensating_with_config(
        period: Duration,
        worker: W,
        config: UnitConfig,
    ) -> Self {
        Self::with_config(DriftCompensated::new(period, worker), config)
    }
}
