//! Background execution units with lifecycle hooks and paced loops.
//!
//! An [`ExecutionUnit`] owns one OS thread that repeatedly calls a
//! [`Worker`]'s `do_work` until told to stop, bracketed by `init` /
//! `uninit` and `pre_iteration` / `post_iteration` hooks. Two timing
//! disciplines wrap any worker:
//!
//! - [`FixedDelay`]: sleep a fixed delay before each iteration.
//! - [`DriftCompensated`]: hold an average period by sleeping to an
//!   absolute, advancing deadline.
//!
//! ```
//! use std::time::Duration;
//!
//! use cadence::{Control, ExecutionUnit, Worker};
//!
//! struct Sampler {
//!     samples: Vec<u64>,
//! }
//!
//! impl Worker for Sampler {
//!     fn do_work(&mut self, control: &Control) {
//!         self.samples.push(self.samples.len() as u64);
//!         if self.samples.len() == 4 {
//!             control.stop(false);
//!         }
//!     }
//! }
//!
//! let unit = ExecutionUnit::drift_compensating(
//!     Duration::from_millis(2),
//!     Sampler { samples: Vec::new() },
//! );
//! assert!(unit.start().unwrap());
//! while unit.is_running() {
//!     std::thread::sleep(Duration::from_millis(1));
//! }
//!
//! let samples = unit.with_worker(|w| w.inner().samples.clone()).unwrap();
//! assert_eq!(samples, [0, 1, 2, 3]);
//! ```
//!
//! Enable the `tracing` feature for lifecycle logging; see [`init_tracing`].

pub mod pacing;
pub mod placement;
pub mod sched;
mod trace;
pub mod unit;

pub use pacing::{DriftCompensated, DriftCompensatingUnit, FixedDelay, FixedDelayUnit};
pub use sched::{SchedulingPolicy, set_process_priority};
pub use trace::init_tracing;
pub use unit::{Control, ExecutionUnit, FnWorker, UnitConfig, UnitError, Worker, worker_fn};
