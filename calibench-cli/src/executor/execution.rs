//! Benchmark Execution
//!
//! Runs the planned benchmarks strictly one after another on a shared
//! [`Suite`]. Before/after triggers wrap the whole run.
//!
//! ## Data Flow
//!
//! ```text
//! BenchmarkDef (from inventory)
//!        │
//!        ▼
//!   RunConfig (file + flags)
//!        │
//!        ▼
//! ┌──────────────────┐
//! │  Executor        │  before triggers → each benchmark → after triggers
//! └────────┬─────────┘
//!          │
//!          ▼
//!  SuiteOutcome (finished tree, trigger failures, wall time)
//! ```

use calibench_core::{BenchmarkDef, RunConfig, Suite, SuiteOutcome, TriggerDef, TriggerPhase};
use indicatif::{ProgressBar, ProgressStyle};

/// Execute benchmarks sequentially and produce the finished tree
pub struct Executor {
    config: RunConfig,
    show_progress: bool,
}

impl Executor {
    /// Create an executor that runs every benchmark with `config`.
    ///
    /// The progress bar is on by default.
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            show_progress: true,
        }
    }

    /// Enable or disable the terminal progress bar
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Execute all provided benchmarks, wrapped in the given triggers
    pub fn execute(&self, benchmarks: &[&BenchmarkDef], triggers: &[&TriggerDef]) -> SuiteOutcome {
        let mut suite = Suite::new(self.config.clone());
        suite.run_triggers(TriggerPhase::Before, triggers.iter().copied());

        let pb = if self.show_progress {
            ProgressBar::new(benchmarks.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        for bench in benchmarks {
            pb.set_message(bench.name.to_string());
            tracing::debug!(bench = bench.name, file = bench.file, line = bench.line, "running");
            if !suite.run_def(bench) {
                tracing::warn!(bench = bench.name, "benchmark failed");
            }
            pb.inc(1);
        }
        pb.finish_with_message("Complete");

        suite.run_triggers(TriggerPhase::After, triggers.iter().copied());
        suite.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calibench_core::{Bencher, BenchTime, Outcome, TriggerResult};

    fn passes(b: &mut Bencher) -> Outcome {
        for _ in 0..b.n() {
            std::hint::black_box(1 + 1);
        }
        Ok(())
    }

    fn fails(b: &mut Bencher) -> Outcome {
        b.fail("broken fixture")
    }

    fn bad_hook() -> TriggerResult {
        Err("no fixture".into())
    }

    const fn def(name: &'static str, runner_fn: fn(&mut Bencher) -> Outcome) -> BenchmarkDef {
        BenchmarkDef {
            name,
            tags: &[],
            runner_fn,
            iterations: Some(20),
            target_ns: None,
            file: "",
            line: 0,
            module_path: "",
        }
    }

    static BROKEN: BenchmarkDef = def("broken", fails);
    static WORKING: BenchmarkDef = def("working", passes);
    static TEARDOWN: TriggerDef = TriggerDef {
        name: "teardown",
        phase: TriggerPhase::After,
        hook: bad_hook,
        file: "",
        line: 0,
    };

    #[test]
    fn test_runs_every_benchmark_in_order() {
        let config = RunConfig {
            bench_time: BenchTime::Target(std::time::Duration::from_millis(1)),
            settle_heap: false,
            ..RunConfig::default()
        };
        let executor = Executor::new(config).with_progress(false);
        let outcome = executor.execute(&[&BROKEN, &WORKING], &[&TEARDOWN]);

        let names: Vec<_> = outcome.root.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["broken", "working"]);
        assert!(outcome.root.children[0].is_failed());
        assert_eq!(
            outcome.root.children[1]
                .measurement
                .as_ref()
                .map(|m| m.iterations),
            Some(20)
        );
        assert_eq!(outcome.trigger_failures, 1);
    }
}
