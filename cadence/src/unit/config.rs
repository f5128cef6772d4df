//! Per-unit thread settings.

use std::thread;

use super::UnitError;

/// Default execution thread name.
pub const DEFAULT_THREAD_NAME: &str = "cadence-unit";

/// Configuration for the execution thread of a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitConfig {
    /// Name given to the execution thread (visible in debuggers, `top -H`
    /// and log lines).
    pub name: String,
    /// Stack size for the execution thread. `None` uses the platform default.
    pub stack_size: Option<usize>,
    /// Core to pin the execution thread to before `init` runs.
    /// `None` leaves placement to the OS.
    pub core: Option<usize>,
}

impl Default for UnitConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_THREAD_NAME.to_owned(),
            stack_size: None,
            core: None,
        }
    }
}

impl UnitConfig {
    /// Sets the thread name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the thread stack size in bytes.
    #[must_use]
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// Pins the execution thread to `core`.
    #[must_use]
    pub fn with_core(mut self, core: usize) -> Self {
        self.core = Some(core);
        self
    }

    /// Builds the `std::thread::Builder` for one run.
    pub(crate) fn thread_builder(&self) -> Result<thread::Builder, UnitError> {
        // Builder::spawn panics on interior NULs; reject them up front.
        if self.name.contains('\0') {
            return Err(UnitError::InvalidName(self.name.clone()));
        }

        let builder = thread::Builder::new().name(self.name.clone());
        Ok(match self.stack_size {
            Some(bytes) => builder.stack_size(bytes),
            None => builder,
        })
    }
}
