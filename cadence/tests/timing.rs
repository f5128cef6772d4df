//! Iteration timing of fixed-delay and drift-compensated units.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use cadence::{Control, DriftCompensated, ExecutionUnit, FixedDelay, Worker};

use common::{abs_diff, init_test_tracing, wait_for};

/// Records a timestamp at the start of each `do_work`, burns `work[i]`, and
/// stops itself after `target` iterations.
struct Recording {
    target: usize,
    work: Vec<Duration>,
    timestamps: Vec<Instant>,
    done: Arc<AtomicBool>,
}

impl Recording {
    fn new(target: usize, work: Vec<Duration>) -> (Self, Arc<AtomicBool>) {
        let done = Arc::new(AtomicBool::new(false));
        let worker = Self {
            target,
            work,
            timestamps: Vec::with_capacity(target),
            done: Arc::clone(&done),
        };
        (worker, done)
    }

    fn deltas(&self) -> Vec<Duration> {
        self.timestamps.windows(2).map(|w| w[1] - w[0]).collect()
    }
}

impl Worker for Recording {
    fn init(&mut self) -> bool {
        self.timestamps.clear();
        true
    }

    fn do_work(&mut self, control: &Control) {
        let index = self.timestamps.len();
        self.timestamps.push(Instant::now());
        thread::sleep(self.work[index % self.work.len()]);

        if self.timestamps.len() >= self.target {
            self.done.store(true, Ordering::Release);
            control.stop(false);
        }
    }
}

#[test]
fn fixed_delay_spaces_iterations_by_at_least_delay() {
    init_test_tracing();
    const DELAY: Duration = Duration::from_micros(2_000);
    const TOLERANCE: Duration = Duration::from_micros(500);

    let (worker, done) = Recording::new(5, vec![Duration::from_micros(200)]);
    let unit = ExecutionUnit::new(FixedDelay::from_micros(2_000, worker));

    assert!(unit.start().unwrap());
    let finished = wait_for(Duration::from_millis(500), || done.load(Ordering::Acquire));
    unit.stop(true);
    assert!(finished, "worker did not complete in time");

    let deltas = unit.with_worker(|w| w.inner().deltas()).unwrap();
    assert_eq!(deltas.len(), 4, "unexpected number of iterations recorded");

    for elapsed in deltas {
        assert!(
            elapsed + TOLERANCE >= DELAY,
            "interval too short: {elapsed:?} (expected at least {DELAY:?})"
        );
    }
}

#[test]
fn fixed_delay_does_not_compensate_for_work() {
    const DELAY: Duration = Duration::from_millis(2);
    const WORK: Duration = Duration::from_millis(3);

    let (worker, done) = Recording::new(4, vec![WORK]);
    let unit = ExecutionUnit::fixed_delay(DELAY, worker);

    assert!(unit.start().unwrap());
    assert!(wait_for(Duration::from_millis(500), || done.load(Ordering::Acquire)));
    unit.stop(true);

    let deltas = unit.with_worker(|w| w.inner().deltas()).unwrap();
    for elapsed in deltas {
        assert!(elapsed >= DELAY + WORK, "period {elapsed:?} shorter than delay + work");
    }
}

#[test]
fn negative_fixed_delay_runs_unthrottled() {
    let (worker, done) = Recording::new(50, vec![Duration::ZERO]);
    let unit = ExecutionUnit::new(FixedDelay::from_micros(-1_000, worker));

    let start = Instant::now();
    assert!(unit.start().unwrap());
    assert!(wait_for(Duration::from_millis(500), || done.load(Ordering::Acquire)));
    unit.stop(true);

    // 50 iterations at a 1ms delay would take 50ms.
    assert!(start.elapsed() < Duration::from_millis(50));
    assert_eq!(unit.with_worker(|w| w.sleep_duration()), Some(Duration::ZERO));
}

#[test]
fn drift_compensated_holds_period() {
    init_test_tracing();
    const PERIOD: Duration = Duration::from_micros(5_000);
    const TOLERANCE: Duration = Duration::from_micros(2_000);

    let (worker, done) = Recording::new(6, vec![Duration::from_micros(500)]);
    let unit = ExecutionUnit::new(DriftCompensated::from_micros(5_000, worker));

    assert!(unit.start().unwrap());
    let finished = wait_for(Duration::from_millis(1_000), || done.load(Ordering::Acquire));
    unit.stop(true);
    assert!(finished, "worker did not complete in time");

    let deltas = unit.with_worker(|w| w.inner().deltas()).unwrap();
    assert_eq!(deltas.len(), 5, "unexpected iteration count");

    for elapsed in deltas {
        assert!(
            abs_diff(elapsed, PERIOD) <= TOLERANCE,
            "interval deviation too large: {elapsed:?} (expected {PERIOD:?})"
        );
    }
}

#[test]
fn drift_does_not_accumulate_with_variable_work() {
    const PERIOD: Duration = Duration::from_millis(5);
    const TOLERANCE: Duration = Duration::from_millis(2);

    let work = vec![
        Duration::from_micros(200),
        Duration::from_micros(1_500),
        Duration::from_micros(900),
        Duration::from_micros(2_500),
    ];
    let (worker, done) = Recording::new(11, work);
    let unit = ExecutionUnit::drift_compensating(PERIOD, worker);

    assert!(unit.start().unwrap());
    assert!(wait_for(Duration::from_millis(1_000), || done.load(Ordering::Acquire)));
    unit.stop(true);

    let (span, iterations, overruns) = unit
        .with_worker(|w| {
            let stamps = &w.inner().timestamps;
            (stamps[stamps.len() - 1] - stamps[0], stamps.len() - 1, w.overruns())
        })
        .unwrap();

    let expected = PERIOD * u32::try_from(iterations).unwrap();
    assert_eq!(overruns, 0, "no iteration exceeded the period");
    assert!(
        abs_diff(span, expected) <= TOLERANCE,
        "span {span:?} drifted from {expected:?}"
    );
}

#[test]
fn drift_overrun_re_anchors_instead_of_bursting() {
    const PERIOD: Duration = Duration::from_millis(4);

    // The second iteration overruns by well over a full period.
    let work = vec![
        Duration::from_micros(100),
        Duration::from_millis(10),
        Duration::from_micros(100),
        Duration::from_micros(100),
        Duration::from_micros(100),
    ];
    let (worker, done) = Recording::new(5, work);
    let unit = ExecutionUnit::drift_compensating(PERIOD, worker);

    assert!(unit.start().unwrap());
    assert!(wait_for(Duration::from_millis(1_000), || done.load(Ordering::Acquire)));
    unit.stop(true);

    let (deltas, overruns) = unit
        .with_worker(|w| (w.inner().deltas(), w.overruns()))
        .unwrap();

    assert!(overruns >= 1, "slow iteration should count as an overrun");
    // The slow iteration re-anchors the grid; every later iteration still
    // waits a full period, with no back-to-back catch-up.
    for elapsed in &deltas[2..] {
        assert!(
            *elapsed + Duration::from_millis(1) >= PERIOD,
            "catch-up burst detected: {elapsed:?}"
        );
    }
}

#[test]
fn drift_restart_times_fresh() {
    const PERIOD: Duration = Duration::from_millis(5);
    const TOLERANCE: Duration = Duration::from_millis(2);

    let (worker, done) = Recording::new(3, vec![Duration::from_micros(300)]);
    let unit = ExecutionUnit::drift_compensating(PERIOD, worker);

    assert!(unit.start().unwrap());
    assert!(wait_for(Duration::from_millis(500), || done.load(Ordering::Acquire)));
    unit.stop(true);

    // Long enough that a stale deadline would be far in the past.
    thread::sleep(PERIOD * 4);
    done.store(false, Ordering::Release);

    assert!(unit.start().unwrap());
    assert!(wait_for(Duration::from_millis(500), || done.load(Ordering::Acquire)));
    unit.stop(true);

    let (deltas, overruns) = unit
        .with_worker(|w| (w.inner().deltas(), w.overruns()))
        .unwrap();

    assert_eq!(overruns, 0, "restart reused a stale deadline");
    assert_eq!(deltas.len(), 2);
    for elapsed in deltas {
        assert!(abs_diff(elapsed, PERIOD) <= TOLERANCE, "interval {elapsed:?} after restart");
    }
}

#[test]
fn zero_period_disables_compensation() {
    let (worker, done) = Recording::new(50, vec![Duration::ZERO]);
    let unit = ExecutionUnit::new(DriftCompensated::from_micros(0, worker));

    let start = Instant::now();
    assert!(unit.start().unwrap());
    assert!(wait_for(Duration::from_millis(500), || done.load(Ordering::Acquire)));
    unit.stop(true);

    assert!(start.elapsed() < Duration::from_millis(50));
    assert_eq!(unit.with_worker(|w| w.overruns()), Some(0));
}

#[test]
fn spin_margin_keeps_period() {
    const PERIOD: Duration = Duration::from_millis(3);
    const TOLERANCE: Duration = Duration::from_millis(1);

    let (worker, done) = Recording::new(5, vec![Duration::from_micros(200)]);
    let unit = ExecutionUnit::new(
        DriftCompensated::new(PERIOD, worker).with_spin_margin(Duration::from_micros(300)),
    );

    assert!(unit.start().unwrap());
    assert!(wait_for(Duration::from_millis(500), || done.load(Ordering::Acquire)));
    unit.stop(true);

    let deltas = unit.with_worker(|w| w.inner().deltas()).unwrap();
    for elapsed in deltas {
        assert!(abs_diff(elapsed, PERIOD) <= TOLERANCE, "interval {elapsed:?}");
    }
}
