//! Isolated Worker
//!
//! Runs exactly one measurement call on a dedicated, scoped thread and joins
//! it before returning. The caller waits on a completion channel with the
//! call's hard budget; on expiry it raises the bencher's cancel flag and
//! still joins, so a second call is never in flight.
//!
//! Panics inside the workload are caught on the worker thread and come back
//! as [`CallOutcome::Crashed`], leaving the engine's own state intact.

use crate::bencher::Bencher;
use crate::error::{Abort, Outcome};
use crate::measure::{TimerReading, pin_to_cpu};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::Ordering;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

/// Time allowed for one measurement call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StepBudget {
    /// Overrunning this only logs a warning
    pub soft: Duration,
    /// Overrunning this fails the benchmark
    pub hard: Duration,
}

/// How a measurement call ended.
#[derive(Debug)]
pub(crate) enum CallOutcome {
    /// Workload returned normally
    Completed {
        reading: TimerReading,
        elapsed: Duration,
    },
    /// Workload asked to skip
    Skipped(Option<String>),
    /// Workload asked to fail
    Failed(Option<String>),
    /// Call overran its hard budget
    TimedOut { budget: Duration, elapsed: Duration },
    /// Worker panicked or could not be started
    Crashed(String),
}

/// Run `workload` once with `N = n` on an isolated thread.
pub(crate) fn run_isolated<F>(
    bencher: &mut Bencher,
    workload: &mut F,
    n: u64,
    budget: StepBudget,
) -> CallOutcome
where
    F: FnMut(&mut Bencher) -> Outcome + Send,
{
    bencher.prepare_call(n);
    let cancel = bencher.cancel_flag();
    let pin_cpu = bencher.config().pin_cpu;
    let started = Instant::now();

    let (timed_out, joined) = {
        let b = &mut *bencher;
        let w = &mut *workload;
        std::thread::scope(|scope| {
            let (done_tx, done_rx) = mpsc::channel::<()>();

            let spawned = std::thread::Builder::new()
                .name("calibench-worker".to_string())
                .spawn_scoped(scope, move || {
                    if let Some(cpu) = pin_cpu {
                        if let Err(e) = pin_to_cpu(cpu) {
                            tracing::debug!(cpu, error = %e, "failed to pin worker thread");
                        }
                    }
                    let result = catch_unwind(AssertUnwindSafe(|| {
                        b.start_timer();
                        let outcome = w(b);
                        b.stop_timer();
                        outcome
                    }));
                    let _ = done_tx.send(());
                    result
                });

            let handle = match spawned {
                Ok(handle) => handle,
                Err(e) => return (false, Err(format!("failed to spawn worker thread: {e}"))),
            };

            let timed_out = match done_rx.recv_timeout(budget.hard) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => false,
                Err(RecvTimeoutError::Timeout) => {
                    tracing::warn!(
                        n,
                        budget = ?budget.hard,
                        "measurement call exceeded its hard budget, cancelling"
                    );
                    cancel.store(true, Ordering::Relaxed);
                    true
                }
            };

            let joined = match handle.join() {
                Ok(Ok(outcome)) => Ok(outcome),
                Ok(Err(panic)) | Err(panic) => Err(panic_message(panic)),
            };
            (timed_out, joined)
        })
    };

    let elapsed = started.elapsed();
    let outcome = match joined {
        Ok(outcome) => outcome,
        Err(message) => return CallOutcome::Crashed(message),
    };

    // Grouping calls include their sub-benchmarks' full runs; each child has its own budget.
    let overran = timed_out || elapsed > budget.hard;
    if overran && !bencher.has_children() {
        return CallOutcome::TimedOut {
            budget: budget.hard,
            elapsed,
        };
    }

    // A skip/fail the workload requested but did not propagate still counts.
    let pending = bencher.take_pending_abort();
    match outcome.err().or(pending) {
        Some(Abort::Cancelled) => CallOutcome::TimedOut {
            budget: budget.hard,
            elapsed,
        },
        Some(Abort::Skip(reason)) => CallOutcome::Skipped(reason),
        Some(Abort::Fail(reason)) => CallOutcome::Failed(reason),
        None => CallOutcome::Completed {
            reading: bencher.timer.reading(),
            elapsed,
        },
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked with a non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;

    fn budget(hard_ms: u64) -> StepBudget {
        StepBudget {
            soft: Duration::from_millis(hard_ms / 2),
            hard: Duration::from_millis(hard_ms),
        }
    }

    #[test]
    fn test_completed_call_reports_reading() {
        let mut b = Bencher::new("w", RunConfig::default());
        let mut seen_n = 0;
        let mut workload = |b: &mut Bencher| {
            seen_n = b.n();
            std::thread::sleep(Duration::from_millis(2));
            Ok(())
        };

        let outcome = run_isolated(&mut b, &mut workload, 7, budget(5_000));
        match outcome {
            CallOutcome::Completed { reading, .. } => {
                assert!(reading.duration_nanos >= 1_000_000);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(seen_n, 7);
    }

    #[test]
    fn test_skip_is_distinguished() {
        let mut b = Bencher::new("w", RunConfig::default());
        let mut workload = |b: &mut Bencher| b.skip("not here");

        let outcome = run_isolated(&mut b, &mut workload, 1, budget(5_000));
        assert!(matches!(
            outcome,
            CallOutcome::Skipped(Some(ref r)) if r == "not here"
        ));
    }

    #[test]
    fn test_swallowed_fail_still_counts() {
        let mut b = Bencher::new("w", RunConfig::default());
        let mut workload = |b: &mut Bencher| {
            let _ = b.fail("ignored result");
            Ok(())
        };

        let outcome = run_isolated(&mut b, &mut workload, 1, budget(5_000));
        assert!(matches!(outcome, CallOutcome::Failed(_)));
    }

    #[test]
    fn test_panic_is_crash() {
        let mut b = Bencher::new("w", RunConfig::default());
        let mut workload = |_: &mut Bencher| -> Outcome { panic!("kaboom") };

        let outcome = run_isolated(&mut b, &mut workload, 1, budget(5_000));
        match outcome {
            CallOutcome::Crashed(message) => assert!(message.contains("kaboom")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_cooperative_cancellation() {
        let mut b = Bencher::new("w", RunConfig::default());
        let mut workload = |b: &mut Bencher| -> Outcome {
            loop {
                b.check_deadline()?;
                std::thread::sleep(Duration::from_millis(1));
            }
        };

        let outcome = run_isolated(&mut b, &mut workload, 1, budget(20));
        assert!(matches!(outcome, CallOutcome::TimedOut { .. }));
    }
}
