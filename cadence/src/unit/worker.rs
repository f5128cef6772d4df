//! The hook contract implemented by everything an execution unit can run.

use super::Control;

/// A unit of repeated work plus its lifecycle hooks.
///
/// The execution thread drives the hooks in a fixed order:
///
/// ```text
/// init ─┬─> pre_iteration ─> do_work ─> post_iteration ─┐
///       │                                               │ (until stop is requested)
///       │<──────────────────────────────────────────────┘
///       └─> uninit
/// ```
///
/// All hooks run on the execution thread, one at a time. Only `do_work` is
/// required; the rest default to "succeed" / no-op.
///
/// If `init` returns `false` the run is aborted: neither `do_work` nor
/// `uninit` is called, and the unit must be started again to retry.
///
/// Panics escaping a hook are not caught. The worker is handed back to its
/// unit (so it can be inspected or restarted) but `uninit` is skipped and
/// the panic surfaces when the thread is joined.
pub trait Worker: Send + 'static {
    /// Called once per run before the first iteration.
    ///
    /// Returning `false` aborts the run.
    fn init(&mut self) -> bool {
        true
    }

    /// Called once per run after the last iteration.
    fn uninit(&mut self) {}

    /// Called before every `do_work`.
    fn pre_iteration(&mut self) {}

    /// One bounded unit of work.
    ///
    /// `control` is the owning unit's handle; call `control.stop(false)` to
    /// end the run from inside the loop.
    fn do_work(&mut self, control: &Control);

    /// Called after every `do_work`.
    fn post_iteration(&mut self) {}
}

impl<W: Worker + ?Sized> Worker for Box<W> {
    fn init(&mut self) -> bool {
        (**self).init()
    }

    fn uninit(&mut self) {
        (**self).uninit();
    }

    fn pre_iteration(&mut self) {
        (**self).pre_iteration();
    }

    fn do_work(&mut self, control: &Control) {
        (**self).do_work(control);
    }

    fn post_iteration(&mut self) {
        (**self).post_iteration();
    }
}

/// A [`Worker`] made from a closure; see [`worker_fn`].
#[derive(Debug, Clone)]
pub struct FnWorker<F>(F);

/// Adapts a closure into a [`Worker`] with default hooks.
///
/// ```
/// use cadence::{ExecutionUnit, worker_fn};
///
/// let mut ticks = 0u32;
/// let unit = ExecutionUnit::new(worker_fn(move |control| {
///     ticks += 1;
///     if ticks == 3 {
///         control.stop(false);
///     }
/// }));
/// assert!(unit.start().unwrap());
/// unit.stop(true);
/// ```
#[must_use]
pub fn worker_fn<F>(f: F) -> FnWorker<F>
where
    F: FnMut(&Control) + Send + 'static,
{
    FnWorker(f)
}

impl<F> Worker for FnWorker<F>
where
    F: FnMut(&Control) + Send + 'static,
{
    fn do_work(&mut self, control: &Control) {
        (self.0)(control);
    }
}
