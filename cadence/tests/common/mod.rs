//! Shared helpers for the integration tests.
//!
//! # Running with tracing
//!
//! ```bash
//! RUST_LOG=cadence=trace cargo test --features tracing -- --nocapture
//! ```

#![allow(dead_code)]

use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

static INIT_TRACING: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_test_tracing() {
    INIT_TRACING.call_once(|| {
        cadence::init_tracing();
    });
}

/// Polls `predicate` every millisecond until it holds or `timeout` passes.
pub fn wait_for(timeout: Duration, mut predicate: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;

    while !predicate() {
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(1));
    }

    true
}

/// Hook invocation counters shared between a test and its worker.
#[derive(Debug, Default)]
pub struct HookCounts {
    pub init: AtomicUsize,
    pub uninit: AtomicUsize,
    pub pre: AtomicUsize,
    pub work: AtomicUsize,
    pub post: AtomicUsize,
}

impl HookCounts {
    pub fn init(&self) -> usize {
        self.init.load(Ordering::Acquire)
    }

    pub fn uninit(&self) -> usize {
        self.uninit.load(Ordering::Acquire)
    }

    pub fn pre(&self) -> usize {
        self.pre.load(Ordering::Acquire)
    }

    pub fn work(&self) -> usize {
        self.work.load(Ordering::Acquire)
    }

    pub fn post(&self) -> usize {
        self.post.load(Ordering::Acquire)
    }
}

/// Absolute difference between two durations.
pub fn abs_diff(a: Duration, b: Duration) -> Duration {
    if a > b { a - b } else { b - a }
}
