//! The execution unit: one worker, at most one OS thread at a time.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

use crate::placement;
use crate::sched::{self, SchedulingPolicy};
use crate::trace::{debug, trace, warn};

use super::control::{self, Control};
use super::{UnitConfig, UnitError, Worker};

/// Worker storage while no execution thread owns it.
///
/// Lock order: the handle slot in [`Control`] first, then this. `start` only
/// ever `try_lock`s it, so a borrow through `with_worker` may call back into
/// the unit without deadlocking.
type Parking<W> = Arc<Mutex<Option<W>>>;

fn park<W>(parking: &Parking<W>) -> MutexGuard<'_, Option<W>> {
    parking.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Takes the worker unless it is absent or currently borrowed.
fn try_unpark<W>(parking: &Parking<W>) -> Option<W> {
    match parking.try_lock() {
        Ok(mut parked) => parked.take(),
        Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().take(),
        Err(TryLockError::WouldBlock) => None,
    }
}

/// A worker handed to one run. Dropping it parks the worker again, whether
/// the run ended, panicked, or its thread was never spawned.
struct Loan<W> {
    worker: Option<W>,
    parking: Parking<W>,
}

impl<W> Drop for Loan<W> {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            *park(&self.parking) = Some(worker);
        }
    }
}

/// Runs a [`Worker`] on a dedicated background thread until told to stop.
///
/// The unit starts idle. [`start`](Self::start) spawns the execution thread,
/// which takes the worker, drives its hooks, and hands it back when the run
/// ends. [`stop`](Self::stop) requests termination and optionally waits for
/// it. A unit can be started again after a run ends, and dropping it stops
/// and joins any running thread.
///
/// ```
/// use cadence::{Control, ExecutionUnit, Worker};
///
/// struct Countdown(u32);
///
/// impl Worker for Countdown {
///     fn do_work(&mut self, control: &Control) {
///         self.0 -= 1;
///         if self.0 == 0 {
///             control.stop(false);
///         }
///     }
/// }
///
/// let unit = ExecutionUnit::new(Countdown(10));
/// assert!(unit.start().unwrap());
/// while unit.is_running() {
///     std::thread::yield_now();
/// }
/// assert_eq!(unit.with_worker(|w| w.0), Some(0));
/// ```
#[derive(Debug)]
pub struct ExecutionUnit<W: Worker> {
    config: UnitConfig,
    control: Control,
    parking: Parking<W>,
}

impl<W: Worker> ExecutionUnit<W> {
    /// Creates an idle unit with the default configuration.
    #[must_use]
    pub fn new(worker: W) -> Self {
        Self::with_config(worker, UnitConfig::default())
    }

    /// Creates an idle unit.
    #[must_use]
    pub fn with_config(worker: W, config: UnitConfig) -> Self {
        Self {
            control: Control::new(config.name.clone()),
            config,
            parking: Arc::new(Mutex::new(Some(worker))),
        }
    }

    /// The configuration the unit was built with.
    #[must_use]
    pub fn config(&self) -> &UnitConfig {
        &self.config
    }

    /// Returns a handle that can stop this unit from any thread.
    #[must_use]
    pub fn control(&self) -> Control {
        self.control.clone()
    }

    /// Starts the execution thread.
    ///
    /// Returns `Ok(false)` without side effects if a run is still in
    /// progress. A previous run that already ended (self-stop, detached
    /// stop, failed `init`) is reaped first, so the unit restarts cleanly.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::Spawn`] if the OS cannot create the thread and
    /// [`UnitError::InvalidName`] if the configured name is unusable. In both
    /// cases the unit stays idle and keeps its worker.
    pub fn start(&self) -> Result<bool, UnitError> {
        let mut slot = self.control.shared().lock_handle();

        if let Some(handle) = slot.take() {
            if !handle.is_finished() {
                *slot = Some(handle);
                trace!(unit = %self.config.name, "start rejected: already running");
                return Ok(false);
            }
            control::reap(&self.config.name, handle);
        }

        let builder = self.config.thread_builder()?;

        // Absent while another caller still joins the previous run, locked
        // while a `with_worker` borrow is in progress.
        let Some(worker) = try_unpark(&self.parking) else {
            trace!(unit = %self.config.name, "start rejected: worker not parked");
            return Ok(false);
        };

        let loan = Loan {
            worker: Some(worker),
            parking: Arc::clone(&self.parking),
        };
        let control = self.control.clone();
        let core = self.config.core;

        self.control.clear_stop();

        match builder.spawn(move || execute(&control, loan, core)) {
            Ok(handle) => {
                debug!(unit = %self.config.name, "execution thread spawned");
                *slot = Some(handle);
                Ok(true)
            }
            Err(source) => {
                // The rejected closure, and with it the loan, is already
                // dropped: the worker is parked again.
                self.control.request_stop();
                warn!(unit = %self.config.name, error = %source, "failed to spawn execution thread");
                Err(UnitError::Spawn {
                    name: self.config.name.clone(),
                    source,
                })
            }
        }
    }

    /// Requests the unit to stop; see [`Control::stop`].
    pub fn stop(&self, wait_for_exit: bool) {
        self.control.stop(wait_for_exit);
    }

    /// Returns `true` while the execution thread exists and has not finished.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.control.is_running()
    }

    /// Returns `true` when the unit is idle or has been asked to stop.
    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.control.is_stop_requested()
    }

    /// Borrows the worker while it is parked.
    ///
    /// Returns `None` while an execution thread owns it. A `start` issued
    /// while `f` runs is rejected with `Ok(false)`.
    pub fn with_worker<R>(&self, f: impl FnOnce(&W) -> R) -> Option<R> {
        park(&self.parking).as_ref().map(f)
    }

    /// Mutably borrows the worker while it is parked.
    ///
    /// Returns `None` while an execution thread owns it.
    pub fn with_worker_mut<R>(&self, f: impl FnOnce(&mut W) -> R) -> Option<R> {
        park(&self.parking).as_mut().map(f)
    }

    /// Stops the unit, waits for the thread, and returns the worker.
    ///
    /// Returns `None` only if another caller is still joining the last run.
    #[must_use]
    pub fn into_worker(self) -> Option<W> {
        self.stop(true);
        park(&self.parking).take()
    }

    /// Changes the scheduling policy and priority of the calling process.
    ///
    /// Same as [`sched::set_process_priority`]; unrelated to any particular
    /// unit.
    #[must_use]
    pub fn set_process_priority(priority: i32, policy: SchedulingPolicy) -> bool {
        sched::set_process_priority(priority, policy)
    }
}

impl<W: Worker> Drop for ExecutionUnit<W> {
    fn drop(&mut self) {
        self.stop(true);
    }
}

/// Body of the execution thread.
fn execute<W: Worker>(control: &Control, mut loan: Loan<W>, core: Option<usize>) {
    let Some(worker) = loan.worker.as_mut() else {
        control.request_stop();
        return;
    };

    if let Some(core) = core
        && !placement::pin_to_core(core)
    {
        warn!(unit = %control.name(), core, "failed to pin execution thread");
    }

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| run_loop(worker, control)));

    if let Err(payload) = outcome {
        control.request_stop();
        drop(loan);
        panic::resume_unwind(payload);
    }
}

/// init → (pre → work → post)* → uninit
fn run_loop<W: Worker>(worker: &mut W, control: &Control) {
    if !worker.init() {
        debug!(unit = %control.name(), "init failed, run aborted");
        control.request_stop();
        return;
    }

    debug!(unit = %control.name(), "run started");

    while !control.is_stop_requested() {
        worker.pre_iteration();
        worker.do_work(control);
        worker.post_iteration();
    }

    worker.uninit();

    debug!(unit = %control.name(), "run finished");
}
