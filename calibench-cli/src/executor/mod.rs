//! Benchmark Executor
//!
//! Runs benchmarks and turns the finished tree into a report.
//!
//! ## Pipeline Overview
//!
//! ```text
//! BenchmarkDef (registered via #[bench])
//!       │
//!       ▼
//! ┌─────────────┐
//! │  execution  │  Run benchmarks one at a time, collect the tree
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │ statistics  │  Trimmed summaries per leaf (parallel)
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │   report    │  Build Report with metadata
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │ formatting  │  Human-readable output
//! └─────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`execution`] - Sequential execution with triggers and progress
//! - [`statistics`] - Parallel statistics computation
//! - [`report`] - Report building
//! - [`formatting`] - Human-readable output formatting
//! - [`metadata`] - System metadata collection

mod execution;
mod formatting;
mod metadata;
mod report;
mod statistics;

// Re-export public API
pub use execution::Executor;
pub use formatting::{format_duration, format_entry, format_human_output};
pub use metadata::{build_report_meta, format_preamble, system_info};
pub use report::{build_report, flatten};
pub use statistics::{compute_statistics, entry_metrics};
