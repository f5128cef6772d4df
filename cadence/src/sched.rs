//! Process-wide scheduling policy and priority.
//!
//! This is a one-shot OS call, not unit state: it applies to the calling
//! process as a whole and has no effect on any unit's lifecycle. Real-time
//! policies (`Fifo`, `RoundRobin`) normally need `CAP_SYS_NICE` or root.

use std::fmt;
use std::ops::RangeInclusive;

use crate::trace::{debug, warn};

/// Scheduling policy passed to [`set_process_priority`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulingPolicy {
    /// Default time-sharing (`SCHED_OTHER`). Priority must be 0.
    Other,
    /// Real-time round robin (`SCHED_RR`).
    RoundRobin,
    /// Real-time first-in first-out (`SCHED_FIFO`).
    Fifo,
    /// CPU-intensive batch work (`SCHED_BATCH`). Priority must be 0.
    Batch,
    /// Very low priority background work (`SCHED_IDLE`). Priority must be 0.
    Idle,
}

impl SchedulingPolicy {
    /// The raw `SCHED_*` constant.
    #[cfg(target_os = "linux")]
    #[must_use]
    pub const fn as_raw(self) -> libc::c_int {
        match self {
            Self::Other => libc::SCHED_OTHER,
            Self::RoundRobin => libc::SCHED_RR,
            Self::Fifo => libc::SCHED_FIFO,
            Self::Batch => libc::SCHED_BATCH,
            Self::Idle => libc::SCHED_IDLE,
        }
    }

    /// Valid static priorities for this policy, as reported by the OS.
    ///
    /// Returns `None` if the OS does not support the policy.
    #[cfg(target_os = "linux")]
    #[must_use]
    pub fn priority_range(self) -> Option<RangeInclusive<i32>> {
        // SAFETY: both calls only read their integer argument.
        let (min, max) = unsafe {
            (
                libc::sched_get_priority_min(self.as_raw()),
                libc::sched_get_priority_max(self.as_raw()),
            )
        };

        if min == -1 || max == -1 {
            None
        } else {
            Some(min..=max)
        }
    }

    /// Always `None`: scheduling policies are only supported on Linux.
    #[cfg(not(target_os = "linux"))]
    #[must_use]
    pub fn priority_range(self) -> Option<RangeInclusive<i32>> {
        None
    }
}

impl fmt::Display for SchedulingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other => write!(f, "other"),
            Self::RoundRobin => write!(f, "round-robin"),
            Self::Fifo => write!(f, "fifo"),
            Self::Batch => write!(f, "batch"),
            Self::Idle => write!(f, "idle"),
        }
    }
}

/// Sets the scheduling policy and static priority of the calling process.
///
/// Returns `false` if the OS rejects the request (insufficient privilege,
/// priority outside [`SchedulingPolicy::priority_range`], unsupported
/// platform). Never panics.
#[cfg(target_os = "linux")]
#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
#[must_use]
pub fn set_process_priority(priority: i32, policy: SchedulingPolicy) -> bool {
    // SAFETY: sched_param is a plain C struct; all-zero is a valid value.
    let mut param: libc::sched_param = unsafe { std::mem::zeroed() };
    param.sched_priority = priority;

    // SAFETY: pid 0 targets the calling process and `param` outlives the call.
    let rc = unsafe { libc::sched_setscheduler(0, policy.as_raw(), &raw const param) };

    if rc == -1 {
        let error = std::io::Error::last_os_error();
        warn!(%policy, priority, %error, "failed to set process scheduling");
        return false;
    }

    debug!(%policy, priority, "process scheduling updated");
    true
}

#[cfg(not(target_os = "linux"))]
#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
#[must_use]
pub fn set_process_priority(priority: i32, policy: SchedulingPolicy) -> bool {
    warn!(%policy, priority, "process scheduling is only supported on Linux");
    false
}
