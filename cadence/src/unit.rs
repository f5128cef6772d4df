//! Execution units: a worker, its lifecycle hooks, and the thread that runs them.
//!
//! - [`Worker`]: the hook contract (`init`, `pre_iteration`, `do_work`,
//!   `post_iteration`, `uninit`).
//! - [`ExecutionUnit`]: owns the execution thread; `start` / `stop` from any
//!   thread.
//! - [`Control`]: cloneable stop handle, also handed to `do_work` for
//!   self-stop.
//!
//! # Threading model
//!
//! Each running unit owns exactly one OS thread. Cross-thread signalling is
//! a single atomic stop flag (release on write, acquire on read); a separate
//! mutex guards only the thread-handle transition. Cancellation is
//! cooperative: the flag is checked before each `pre_iteration`, so an
//! in-flight `do_work` always completes.

mod config;
mod control;
mod error;
mod execution;
mod worker;

pub use config::{DEFAULT_THREAD_NAME, UnitConfig};
pub use control::Control;
pub use error::UnitError;
pub use execution::ExecutionUnit;
pub use worker::{FnWorker, Worker, worker_fn};
