//! Stop signalling and thread-handle bookkeeping shared between a unit, its
//! execution thread and any [`Control`] clones.

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use crate::trace::{debug, trace, warn};

/// State shared by everything that can start or stop one unit.
///
/// The stop flag is the only channel the execution thread reads, and it
/// reads it without taking `handle`. The mutex only serialises handle
/// transitions and is never held across a hook, a sleep or a join.
#[derive(Debug)]
pub(crate) struct Shared {
    name: String,
    stop_requested: AtomicBool,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Shared {
    pub(crate) fn lock_handle(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.handle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle for stopping an execution unit.
///
/// Passed to [`Worker::do_work`](super::Worker::do_work) and obtainable from
/// [`ExecutionUnit::control`](super::ExecutionUnit::control). Cheap to clone
/// and safe to use from any thread, including the execution thread itself.
#[derive(Debug, Clone)]
pub struct Control {
    shared: Arc<Shared>,
}

impl Control {
    /// Creates the control for an idle unit (stop flag set).
    pub(crate) fn new(name: String) -> Self {
        Self {
            shared: Arc::new(Shared {
                name,
                stop_requested: AtomicBool::new(true),
                handle: Mutex::new(None),
            }),
        }
    }

    pub(crate) fn shared(&self) -> &Shared {
        &self.shared
    }

    /// Name of the unit's execution thread.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Returns `true` once a stop has been requested (or the unit is idle).
    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.shared.stop_requested.load(Ordering::Acquire)
    }

    /// Returns `true` while an execution thread exists and has not finished.
    ///
    /// After [`stop`](Self::stop) with `wait_for_exit == false` this is how
    /// a caller observes that the run has fully completed.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shared
            .lock_handle()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub(crate) fn request_stop(&self) {
        self.shared.stop_requested.store(true, Ordering::Release);
    }

    pub(crate) fn clear_stop(&self) {
        self.shared.stop_requested.store(false, Ordering::Release);
    }

    /// Requests the unit to stop after the current iteration.
    ///
    /// Idempotent, and a no-op on an idle unit. With `wait_for_exit` the call
    /// blocks until the execution thread has run `uninit` and exited. Without
    /// it the thread finishes on its own; its handle is kept and reaped by the
    /// next `start`, `stop(true)` or drop.
    ///
    /// Called from the execution thread itself (self-stop), the join is
    /// always skipped: the loop exits once the current hooks return.
    ///
    /// A `do_work` that never returns blocks `stop(true)` indefinitely.
    pub fn stop(&self, wait_for_exit: bool) {
        let handle = {
            let mut slot = self.shared.lock_handle();

            self.request_stop();

            let Some(handle) = slot.as_ref() else {
                return;
            };

            if handle.thread().id() == thread::current().id() {
                trace!(unit = %self.shared.name, "self-stop requested from execution thread");
                return;
            }

            if !wait_for_exit {
                debug!(unit = %self.shared.name, "stop requested without join");
                return;
            }

            slot.take()
        };

        if let Some(handle) = handle {
            debug!(unit = %self.shared.name, "waiting for execution thread to exit");
            reap(&self.shared.name, handle);
        }
    }
}

/// Joins a finished or finishing execution thread, logging a panic if one
/// escaped the worker.
#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
pub(crate) fn reap(name: &str, handle: JoinHandle<()>) {
    if let Err(payload) = handle.join() {
        let message = panic_message(payload.as_ref());
        warn!(unit = %name, panic = message, "execution thread panicked");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}
