//! Timing disciplines layered over a [`Worker`](crate::Worker).
//!
//! - [`FixedDelay`]: sleeps a fixed time before every iteration. A
//!   throttle: the period is delay + work time.
//! - [`DriftCompensated`]: keeps an absolute deadline that advances by one
//!   period per iteration, so the average period stays on target even when
//!   work time varies.
//!
//! Both wrap the user's worker and forward every hook to it, so the wrapped
//! worker can still override `pre_iteration`, `post_iteration` and friends.
//! All timing uses `std::time::Instant` (monotonic).

mod drift;
mod fixed_delay;

use std::thread;
use std::time::{Duration, Instant};

pub use drift::{DriftCompensated, DriftCompensatingUnit, MAX_LOOP_INTERVAL};
pub use fixed_delay::{FixedDelay, FixedDelayUnit};

/// Converts a signed microsecond count to a duration, clamping negatives
/// to zero.
#[must_use]
pub const fn clamp_micros(micros: i64) -> Duration {
    if micros <= 0 {
        Duration::ZERO
    } else {
        Duration::from_micros(micros.unsigned_abs())
    }
}

/// Blocks until `deadline`.
///
/// Sleeps for all but `spin_margin` of the remaining time, then busy-waits
/// the rest. With a zero margin this is a plain sleep.
pub(crate) fn sleep_until(deadline: Instant, spin_margin: Duration) {
    let coarse = deadline
        .saturating_duration_since(Instant::now())
        .saturating_sub(spin_margin);

    if !coarse.is_zero() {
        thread::sleep(coarse);
    }

    while Instant::now() < deadline {
        std::hint::spin_loop();
    }
}
