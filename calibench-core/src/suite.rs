//! Suite Driver
//!
//! Runs entry points one at a time on a shared root context. Before/after
//! triggers run once around the whole suite; their failures are counted and
//! logged but never stop the benchmarks.

use crate::bencher::{BenchNode, Bencher};
use crate::config::RunConfig;
use crate::error::Outcome;
use crate::sample::Measurement;
use crate::{BenchmarkDef, TriggerDef, TriggerPhase};
use std::time::{Duration, Instant};

/// Run a single top-level benchmark on a fresh context.
///
/// Returns the finished context and, for a passed leaf, its measurement.
pub fn run_suite<F>(name: &str, workload: F, config: &RunConfig) -> (Bencher, Option<Measurement>)
where
    F: FnMut(&mut Bencher) -> Outcome + Send,
{
    let mut bencher = Bencher::new(name, config.clone());
    crate::calibrate::run_bench(&mut bencher, workload);
    let measurement = bencher.measurement().cloned();
    (bencher, measurement)
}

/// Everything a finished suite produced.
#[derive(Debug, Clone)]
pub struct SuiteOutcome {
    /// Root node (empty name); top-level benchmarks are its children
    pub root: BenchNode,
    /// Number of before/after triggers that returned an error
    pub trigger_failures: usize,
    /// Wall-clock time for the whole suite
    pub duration: Duration,
}

impl SuiteOutcome {
    /// Whether any benchmark or trigger failed
    pub fn has_failures(&self) -> bool {
        self.trigger_failures > 0 || self.root.walk().iter().any(|(_, n)| n.is_failed())
    }
}

/// Sequential driver over a shared root context.
pub struct Suite {
    root: Bencher,
    trigger_failures: usize,
    started: Instant,
}

impl Suite {
    /// Create a suite with the given configuration
    pub fn new(config: RunConfig) -> Self {
        Self {
            root: Bencher::new("", config),
            trigger_failures: 0,
            started: Instant::now(),
        }
    }

    /// Configuration shared by every benchmark in the suite
    pub fn config(&self) -> &RunConfig {
        self.root.config()
    }

    /// Run one top-level benchmark. Returns `false` if it failed.
    pub fn run<F>(&mut self, name: &str, workload: F) -> bool
    where
        F: FnMut(&mut Bencher) -> Outcome + Send,
    {
        self.root.run(name, workload)
    }

    /// Run a registered benchmark, honouring its bench time override.
    pub fn run_def(&mut self, def: &BenchmarkDef) -> bool {
        let bench_time = def.bench_time().unwrap_or(self.root.config().bench_time);
        self.root.run_with(def.name, bench_time, def.runner_fn)
    }

    /// Run every trigger registered for `phase`, in order. Returns how many failed.
    pub fn run_triggers<'a>(
        &mut self,
        phase: TriggerPhase,
        triggers: impl IntoIterator<Item = &'a TriggerDef>,
    ) -> usize {
        let mut failed = 0;
        for trigger in triggers.into_iter().filter(|t| t.phase == phase) {
            tracing::debug!(trigger = trigger.name, ?phase, "running trigger");
            if let Err(e) = (trigger.hook)() {
                tracing::error!(trigger = trigger.name, ?phase, error = %e, "trigger failed");
                failed += 1;
            }
        }
        self.trigger_failures += failed;
        failed
    }

    /// Finished top-level benchmarks so far
    pub fn finished(&self) -> &[BenchNode] {
        self.root.children()
    }

    /// Close the suite and hand back the finished tree
    pub fn finish(mut self) -> SuiteOutcome {
        self.root.finish_group();
        SuiteOutcome {
            root: self.root.into_node(),
            trigger_failures: self.trigger_failures,
            duration: self.started.elapsed(),
        }
    }
}
