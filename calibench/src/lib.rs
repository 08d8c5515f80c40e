#![warn(missing_docs)]
//! # Calibench
//!
//! Micro-benchmark engine that calibrates its own iteration counts.
//!
//! - **Adaptive calibration**: the workload is re-run with growing `N` until
//!   the measured time reaches a target, or run once at a fixed count
//! - **Isolated measurement calls**: every call runs on its own joined worker
//!   thread with a time budget; panics and overruns fail only that benchmark
//! - **Sub-benchmarks**: `b.run("name", ...)` builds a tree of named results
//! - **Trimmed statistics**: 10% tails dropped before mean and deviation
//! - **Allocation tracking**: `TrackingAllocator` reports net bytes per op
//!
//! ## Quick Start
//!
//! ```ignore
//! use calibench::prelude::*;
//!
//! #[bench]
//! fn checksum(b: &mut Bencher) {
//!     let data = vec![7u8; 4096];
//!     b.set_bytes_per_iteration(data.len() as u64);
//!     for _ in 0..b.n() {
//!         black_box(data.iter().map(|&x| x as u64).sum::<u64>());
//!     }
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     calibench::run()
//! }
//! ```
//!
//! ## Skipping and Failing
//!
//! ```ignore
//! #[bench]
//! fn needs_fixture(b: &mut Bencher) -> Outcome {
//!     let Ok(input) = std::fs::read("fixtures/big.json") else {
//!         return b.skip("fixture not present");
//!     };
//!     for _ in 0..b.n() {
//!         if parse(&input).is_err() {
//!             return b.fail("parse error");
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Without the Harness
//!
//! ```ignore
//! let config = RunConfig::default().with_bench_time("200x".parse()?);
//! let (bencher, measurement) = calibench::run_suite("sum", |b: &mut Bencher| {
//!     for i in 0..b.n() { black_box(i); }
//!     Ok(())
//! }, &config);
//! ```

// Re-export core types
pub use calibench_core::{
    Abort, AllocSnapshot, BenchNode, BenchState, BenchTime, Bencher, BenchmarkDef, Failure,
    MAX_ITERATIONS, Measurement, Outcome, ParseBenchTimeError, RunConfig, Sample, Suite,
    SuiteOutcome, Timer, TrackingAllocator, TriggerDef, TriggerPhase, TriggerResult,
    current_allocation, parse_duration, run_suite,
};

// Re-export macros
pub use calibench_macros::{bench, trigger};

// Re-export stats
pub use calibench_stats::{
    Headline, Metric, StatSummary, compute_trimmed, megabytes_per_sec, pretty_bytes, summarize,
};

// Re-export report model
pub use calibench_report::{
    BenchmarkStatus, OutputFormat, Report, ReportEntry, generate_compact_json,
    generate_json_report,
};

// Re-export harness pieces usable without the CLI
pub use calibench_cli::{Executor, build_report, format_human_output};

pub use std::hint::black_box;

/// Internal re-exports for macro use
#[doc(hidden)]
pub mod internal {
    pub use inventory;
}

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BenchTime, Bencher, Outcome, RunConfig, TriggerResult, bench, black_box, trigger,
    };
}

/// Run the Calibench CLI harness.
///
/// Call this from your benchmark binary's `main()`:
/// ```ignore
/// fn main() {
///     if let Err(e) = calibench::run() {
///         eprintln!("Error: {e}");
///         std::process::exit(1);
///     }
/// }
/// ```
pub use calibench_cli::run;
