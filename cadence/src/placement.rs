//! CPU placement for execution threads.
//!
//! A unit configured with [`UnitConfig::core`](crate::UnitConfig::core) pins
//! its execution thread right after spawn, before `init` runs, so every hook
//! executes on that core. Pinning a periodic unit away from busy cores cuts
//! wake-up jitter for drift-compensated loops.

use core_affinity::CoreId;

/// Core ids the calling thread is allowed to run on.
///
/// Empty if the platform cannot report them.
#[must_use]
pub fn available_cores() -> Vec<usize> {
    core_affinity::get_core_ids()
        .map(|ids| ids.into_iter().map(|id| id.id).collect())
        .unwrap_or_default()
}

/// Pins the current thread to the specified core.
///
/// Returns `true` if pinning succeeded, `false` otherwise.
/// Pinning fails if the core is not in [`available_cores`] or the OS denies
/// the request.
#[must_use]
pub fn pin_to_core(core_id: usize) -> bool {
    // Out-of-range ids would index past the OS cpu set.
    if !available_cores().contains(&core_id) {
        return false;
    }
    core_affinity::set_for_current(CoreId { id: core_id })
}
