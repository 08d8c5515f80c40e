#![warn(missing_docs)]
//! Calibench Core - Measurement Engine
//!
//! This crate provides the execution engine for benchmarks:
//! - `Bencher`, the context handed to workloads (N, skip/fail, sub-benchmarks)
//! - Adaptive iteration calibration toward a target duration
//! - Isolated, joinable worker threads with per-call budgets
//! - Global allocator interceptor for net-byte accounting
//! - A registry of benchmark entry points and suite triggers

mod allocator;
mod bencher;
mod calibrate;
mod config;
mod error;
mod measure;
mod sample;
mod suite;
mod worker;

pub use allocator::{
    AllocSnapshot, TrackingAllocator, current_allocation, settle_heap, tracking_active,
};
pub use bencher::{BenchNode, BenchState, Bencher};
pub use calibrate::{MAX_GROWTH, MAX_ITERATIONS, predict_iterations, projected_nanos};
pub use config::{BenchTime, RunConfig, parse_duration};
pub use error::{Abort, Failure, Outcome, ParseBenchTimeError};
pub use measure::{Timer, TimerReading, pin_to_cpu};
pub use sample::{Measurement, Sample};
pub use suite::{Suite, SuiteOutcome, run_suite};

use std::time::Duration;

/// Benchmark entry point registered via `#[bench]`
#[derive(Debug, Clone)]
pub struct BenchmarkDef {
    /// Top-level benchmark name
    pub name: &'static str,
    /// Tags for filtering
    pub tags: &'static [&'static str],
    /// Function pointer to the workload
    pub runner_fn: fn(&mut Bencher) -> Outcome,
    /// Fixed iteration count override
    pub iterations: Option<u64>,
    /// Target duration override (nanoseconds)
    pub target_ns: Option<u64>,
    /// Source file path
    pub file: &'static str,
    /// Source line number
    pub line: u32,
    /// Module path
    pub module_path: &'static str,
}

impl BenchmarkDef {
    /// Bench time override, if the definition carries one
    pub fn bench_time(&self) -> Option<BenchTime> {
        match (self.iterations, self.target_ns) {
            (Some(n), _) => Some(BenchTime::Iterations(n)),
            (None, Some(ns)) => Some(BenchTime::Target(Duration::from_nanos(ns))),
            (None, None) => None,
        }
    }
}

/// When a trigger runs relative to the suite
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerPhase {
    /// Once before the first benchmark
    Before,
    /// Once after the last benchmark
    After,
}

/// Result returned by trigger hooks
pub type TriggerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Suite trigger registered via `#[trigger]`
#[derive(Debug, Clone)]
pub struct TriggerDef {
    /// Trigger name (for logs)
    pub name: &'static str,
    /// Before or after the suite
    pub phase: TriggerPhase,
    /// The hook itself
    pub hook: fn() -> TriggerResult,
    /// Source file path
    pub file: &'static str,
    /// Source line number
    pub line: u32,
}

// Collect all registered entry points
inventory::collect!(BenchmarkDef);
inventory::collect!(TriggerDef);

/// Anchor to prevent LTO from stripping inventory entries
#[used]
#[doc(hidden)]
pub static REGISTRY_ANCHOR: fn() = || {
    for _ in inventory::iter::<BenchmarkDef> {}
    for _ in inventory::iter::<TriggerDef> {}
};

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut Bencher) -> Outcome {
        Ok(())
    }

    #[test]
    fn test_bench_time_override() {
        let mut def = BenchmarkDef {
            name: "noop",
            tags: &[],
            runner_fn: noop,
            iterations: None,
            target_ns: None,
            file: file!(),
            line: line!(),
            module_path: module_path!(),
        };
        assert_eq!(def.bench_time(), None);

        def.target_ns = Some(5_000_000);
        assert_eq!(
            def.bench_time(),
            Some(BenchTime::Target(Duration::from_millis(5)))
        );

        def.iterations = Some(3);
        assert_eq!(def.bench_time(), Some(BenchTime::Iterations(3)));
    }
}
