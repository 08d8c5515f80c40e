//! Report Data Structures

use calibench_stats::{Headline, StatSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Complete benchmark report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub meta: ReportMeta,
    /// Every finished benchmark in execution order, parents before children
    pub entries: Vec<ReportEntry>,
    pub summary: ReportSummary,
}

impl Report {
    /// Look up an entry by its full name
    pub fn entry(&self, name: &str) -> Option<&ReportEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub git_commit: Option<String>,
    pub git_branch: Option<String>,
    pub system: SystemInfo,
    pub config: ReportConfig,
}

/// Run configuration captured in report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Bench time as given ("1s", "500x")
    pub bench_time: String,
    pub timeout_ns: u64,
    pub track_allocations: bool,
    pub settle_heap: bool,
    pub pin_cpu: Option<usize>,
}

/// System information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: String,
    pub arch: String,
    pub cpu: String,
    pub cpu_cores: u32,
    pub memory_gb: f64,
}

/// One finished benchmark
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Fully-qualified name (`parent:child`)
    pub name: String,
    pub status: BenchmarkStatus,
    /// Failure or skip reason
    pub reason: Option<String>,
    /// Nesting depth, 0 for top-level benchmarks
    pub depth: usize,
    pub is_group: bool,
    pub bench_time: String,
    /// Present only for passed leaves
    pub metrics: Option<EntryMetrics>,
}

/// Numbers for a passed leaf
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryMetrics {
    /// Calibration steps recorded
    pub samples: usize,
    pub headline: Headline,
    pub nanos_per_op: StatSummary,
    pub bytes_per_op: StatSummary,
    /// Only when the benchmark declared bytes per iteration
    pub megabytes_per_sec: Option<StatSummary>,
}

/// Benchmark execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BenchmarkStatus {
    Passed,
    Failed,
    Skipped,
}

/// Report summary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_benchmarks: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub trigger_failures: usize,
    pub total_duration_ms: f64,
}

impl ReportSummary {
    /// Whether the run should be reported as unsuccessful
    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.trigger_failures > 0
    }
}
