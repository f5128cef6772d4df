//! Errors raised when a unit cannot start.

use std::io;

use thiserror::Error;

/// Errors from starting an execution unit.
///
/// A rejected start (the unit is already running) is not an error; see
/// [`ExecutionUnit::start`](super::ExecutionUnit::start).
#[derive(Debug, Error)]
pub enum UnitError {
    /// The OS refused to create the execution thread.
    ///
    /// The unit is rolled back to idle and may be started again.
    #[error("failed to spawn execution thread `{name}`: {source}")]
    Spawn {
        /// Configured thread name.
        name: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// The configured thread name cannot be handed to the OS.
    #[error("thread name {0:?} contains an interior NUL byte")]
    InvalidName(String),
}
