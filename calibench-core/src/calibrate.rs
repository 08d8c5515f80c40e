//! Adaptive Iteration Controller
//!
//! Drives one benchmark from its first probe call to a terminal state:
//!
//! ```text
//!  probe (N=1) ──► has sub-benchmarks? ──yes──► group node, no measurement
//!       │
//!       no
//!       ▼
//!  fixed count? ──yes──► one call at N=count (if count > 1)
//!       │
//!       no
//!       ▼
//!  loop: predict N from the last step, run it, accumulate,
//!        until accumulated time ≥ target or N hits the ceiling
//! ```
//!
//! Iterations and duration accumulate over every step; nothing is reset
//! between calibration steps.

use crate::allocator::settle_heap;
use crate::bencher::{BenchState, Bencher};
use crate::config::BenchTime;
use crate::error::{Failure, Outcome};
use crate::sample::{Measurement, Sample};
use crate::worker::{CallOutcome, StepBudget, run_isolated};
use std::time::{Duration, Instant};

/// Hard ceiling on iterations per call
pub const MAX_ITERATIONS: u64 = 1_000_000_000;

/// Largest factor N may grow by in one step
pub const MAX_GROWTH: u64 = 100;

/// Predict the next iteration count.
///
/// Extrapolates the previous step to the target, adds 20% headroom, then
/// keeps the result within `[last + 1, 100 * last]` and under
/// [`MAX_ITERATIONS`].
pub fn predict_iterations(target_nanos: u64, prev_iters: u64, prev_nanos: u64, last: u64) -> u64 {
    let prev_nanos = prev_nanos.max(1) as u128;
    let mut n = target_nanos as u128 * prev_iters as u128 / prev_nanos;
    n += n / 5;

    let last = last as u128;
    n = n.min(MAX_GROWTH as u128 * last).max(last + 1);
    n.min(MAX_ITERATIONS as u128) as u64
}

/// Expected duration of a call at `n` iterations, from a previous call.
pub fn projected_nanos(prev_nanos: u64, prev_iters: u64, n: u64) -> u64 {
    let projected = prev_nanos as u128 * n as u128 / prev_iters.max(1) as u128;
    projected.min(u64::MAX as u128) as u64
}

/// Slack added to every soft budget for timer and scheduling jitter.
pub const SOFT_BUDGET_SLACK: Duration = Duration::from_millis(1);

/// Budgets for a call projected to take `projected`.
///
/// The soft budget allows 50% over the projection plus [`SOFT_BUDGET_SLACK`];
/// the hard budget never drops below half the global timeout.
pub(crate) fn step_budget(projected: Duration, timeout: Duration) -> StepBudget {
    StepBudget {
        soft: projected
            .saturating_add(projected / 2)
            .saturating_add(SOFT_BUDGET_SLACK),
        hard: projected.saturating_mul(2).max(timeout / 2),
    }
}

/// Run a benchmark to completion, leaving `bencher` in a terminal state.
pub(crate) fn run_bench<F>(bencher: &mut Bencher, mut workload: F)
where
    F: FnMut(&mut Bencher) -> Outcome + Send,
{
    let config = bencher.config().clone();
    let started = Instant::now();
    tracing::debug!(bench = bencher.name(), bench_time = %config.bench_time, "starting benchmark");

    let probe_budget = StepBudget {
        soft: config.timeout / 2,
        hard: config.timeout,
    };
    let Some(probe) = step(bencher, &mut workload, 1, probe_budget) else {
        return;
    };

    let mut measurement = Measurement::default();
    measurement.push(probe);

    match config.bench_time {
        BenchTime::Iterations(count) => {
            if count > 1 {
                // The probe only checked the workload runs; the result is the fixed-count call.
                let projected = projected_nanos(probe.duration_nanos, 1, count);
                let budget = step_budget(Duration::from_nanos(projected), config.timeout);
                let Some(sample) = step(bencher, &mut workload, count, budget) else {
                    return;
                };
                measurement = Measurement::default();
                measurement.push(sample);
            }
        }
        BenchTime::Target(target) => {
            let target_nanos = target.as_nanos().min(u64::MAX as u128) as u64;
            loop {
                let last = measurement.last_iterations();
                if measurement.duration_nanos >= target_nanos || last >= MAX_ITERATIONS {
                    break;
                }

                let elapsed = started.elapsed();
                if elapsed > config.timeout {
                    bencher.finish(BenchState::Failed(Failure::Timeout {
                        budget: config.timeout,
                        elapsed,
                    }));
                    return;
                }

                let prev = measurement.samples[measurement.samples.len() - 1];
                let n = predict_iterations(target_nanos, prev.iterations, prev.duration_nanos, last);
                if prev.iterations >= n {
                    tracing::debug!(bench = bencher.name(), n, "iteration count stalled");
                    break;
                }

                let projected = projected_nanos(prev.duration_nanos, prev.iterations, n);
                let budget = step_budget(Duration::from_nanos(projected), config.timeout);
                let Some(sample) = step(bencher, &mut workload, n, budget) else {
                    return;
                };
                measurement.push(sample);
            }
        }
    }

    tracing::debug!(
        bench = bencher.name(),
        iterations = measurement.iterations,
        steps = measurement.samples.len(),
        "benchmark complete"
    );
    bencher.complete(measurement);
}

/// One calibration step. Returns `None` once the bencher reached a terminal state.
///
/// A call that spawned sub-benchmarks turns the bencher into a grouping node,
/// whichever step it happened on, and drops whatever was measured so far.
fn step<F>(bencher: &mut Bencher, workload: &mut F, n: u64, budget: StepBudget) -> Option<Sample>
where
    F: FnMut(&mut Bencher) -> Outcome + Send,
{
    if bencher.state().is_terminal() {
        return None;
    }

    let config = bencher.config();
    if config.track_allocations && config.settle_heap {
        settle_heap();
    }

    tracing::trace!(bench = bencher.name(), n, hard = ?budget.hard, "measurement call");
    match run_isolated(bencher, workload, n, budget) {
        CallOutcome::Completed { .. } if bencher.has_children() => {
            bencher.finish_group();
            None
        }
        CallOutcome::Completed { reading, elapsed } => {
            let timed = Duration::from_nanos(reading.duration_nanos);
            if timed > budget.soft {
                tracing::warn!(
                    bench = bencher.name(),
                    n,
                    timed = ?timed,
                    wall = ?elapsed,
                    soft_budget = ?budget.soft,
                    "measurement call ran past its projected duration"
                );
            }
            Some(Sample {
                iterations: n,
                duration_nanos: reading.duration_nanos,
                net_bytes: reading.net_bytes,
                alloc_count: reading.alloc_count,
                bytes_per_iteration: bencher.bytes_per_iteration(),
            })
        }
        CallOutcome::Skipped(reason) => {
            tracing::debug!(bench = bencher.name(), ?reason, "benchmark skipped");
            bencher.finish(BenchState::Skipped(reason));
            None
        }
        CallOutcome::Failed(reason) => {
            bencher.finish(BenchState::Failed(Failure::Failed(reason)));
            None
        }
        CallOutcome::TimedOut { budget, elapsed } => {
            bencher.finish(BenchState::Failed(Failure::Timeout { budget, elapsed }));
            None
        }
        CallOutcome::Crashed(message) => {
            tracing::error!(bench = bencher.name(), %message, "benchmark crashed");
            bencher.finish(BenchState::Failed(Failure::Crashed(message)));
            None
        }
    }
}
