//! Unit lifecycle logging.
//!
//! Inside the crate, `debug!`, `trace!` and `warn!` come from here. With the
//! `tracing` feature they are the `tracing` crate's macros. Without it they
//! swallow their arguments and generate no code, so the iteration loop pays
//! nothing for logging it cannot emit.

#[cfg(feature = "tracing")]
mod backend {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    /// Used when `RUST_LOG` is unset or unparsable.
    const DEFAULT_DIRECTIVES: &str = "cadence=debug";

    /// Routes unit events to stderr.
    ///
    /// Lines carry the emitting thread's name, which is the unit name for
    /// anything logged from an execution thread. A subscriber installed
    /// earlier, by this call or by the application, wins.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

        let layer = fmt::layer()
            .with_target(true)
            .with_thread_names(true)
            .with_line_number(false)
            .with_timer(fmt::time::uptime());

        // Err only means a global subscriber already exists.
        let _ = tracing_subscriber::registry().with(layer).with(filter).try_init();
    }

    pub(crate) use tracing::{debug, trace, warn};
}

#[cfg(not(feature = "tracing"))]
mod backend {
    /// Does nothing: built without the `tracing` feature.
    pub const fn init_tracing() {}

    macro_rules! discard {
        ($($event:tt)*) => {};
    }

    pub(crate) use discard as debug;
    pub(crate) use discard as trace;
    pub(crate) use discard as warn;
}

pub use backend::init_tracing;
pub(crate) use backend::{debug, trace, warn};
