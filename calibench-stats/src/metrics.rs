//! Metric Extraction
//!
//! Per-sample extractors for the trimmed summaries, and headline numbers
//! computed from a measurement's untrimmed totals.

use crate::summary::{StatSummary, compute_trimmed};
use calibench_core::{Measurement, Sample};
use serde::{Deserialize, Serialize};

/// A per-operation metric that can be extracted from each calibration sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Nanoseconds per iteration
    NanosPerOp,
    /// Iterations per second
    OpsPerSec,
    /// Net allocated bytes per iteration
    BytesPerOp,
    /// Allocations per iteration
    AllocsPerOp,
    /// Declared payload bytes per iteration
    DeclaredBytesPerOp,
    /// Declared payload throughput
    MegabytesPerSec,
}

impl Metric {
    /// Every metric, in report order
    pub const ALL: [Metric; 6] = [
        Metric::NanosPerOp,
        Metric::OpsPerSec,
        Metric::BytesPerOp,
        Metric::AllocsPerOp,
        Metric::DeclaredBytesPerOp,
        Metric::MegabytesPerSec,
    ];

    /// Value of this metric for one sample
    pub fn extract(self, sample: &Sample) -> f64 {
        let n = sample.iterations.max(1) as f64;
        match self {
            Metric::NanosPerOp => sample.duration_nanos as f64 / n,
            Metric::OpsPerSec => {
                if sample.duration_nanos == 0 {
                    0.0
                } else {
                    sample.iterations as f64 * 1e9 / sample.duration_nanos as f64
                }
            }
            Metric::BytesPerOp => sample.net_bytes as f64 / n,
            Metric::AllocsPerOp => sample.alloc_count as f64 / n,
            Metric::DeclaredBytesPerOp => sample.bytes_per_iteration as f64,
            Metric::MegabytesPerSec => megabytes_per_sec(
                sample.bytes_per_iteration,
                sample.iterations,
                sample.duration_nanos,
            ),
        }
    }

    /// Short unit label
    pub fn unit(self) -> &'static str {
        match self {
            Metric::NanosPerOp => "ns/op",
            Metric::OpsPerSec => "ops/s",
            Metric::BytesPerOp => "B/op",
            Metric::AllocsPerOp => "allocs/op",
            Metric::DeclaredBytesPerOp => "B/iter",
            Metric::MegabytesPerSec => "MB/s",
        }
    }
}

/// Trimmed summary of `metric` across the measurement's samples
pub fn summarize(measurement: &Measurement, metric: Metric) -> StatSummary {
    let values: Vec<f64> = measurement
        .samples
        .iter()
        .map(|s| metric.extract(s))
        .collect();
    compute_trimmed(&values)
}

/// Declared throughput in MB/s (10^6 bytes), 0 when either side is non-positive.
pub fn megabytes_per_sec(bytes_per_iteration: u64, iterations: u64, duration_nanos: u64) -> f64 {
    let megabytes = bytes_per_iteration as f64 * iterations as f64 / 1e6;
    let seconds = duration_nanos as f64 / 1e9;
    if megabytes <= 0.0 || seconds <= 0.0 {
        return 0.0;
    }
    megabytes / seconds
}

/// Headline numbers for a passed leaf, from its untrimmed totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    pub iterations: u64,
    pub total_nanos: u64,
    pub nanos_per_op: f64,
    pub ops_per_sec: f64,
    pub bytes_per_op: f64,
    pub allocs_per_op: f64,
    pub net_bytes: i64,
    pub net_bytes_pretty: String,
    pub megabytes_per_sec: f64,
}

impl Headline {
    /// Compute the headline from a measurement
    pub fn from_measurement(m: &Measurement) -> Self {
        let n = m.iterations.max(1) as f64;
        let ops_per_sec = if m.duration_nanos == 0 {
            0.0
        } else {
            m.iterations as f64 * 1e9 / m.duration_nanos as f64
        };

        Self {
            iterations: m.iterations,
            total_nanos: m.duration_nanos,
            nanos_per_op: m.duration_nanos as f64 / n,
            ops_per_sec,
            bytes_per_op: m.net_bytes as f64 / n,
            allocs_per_op: m.alloc_count as f64 / n,
            net_bytes: m.net_bytes,
            net_bytes_pretty: pretty_bytes(m.net_bytes),
            megabytes_per_sec: megabytes_per_sec(
                m.bytes_per_iteration,
                m.iterations,
                m.duration_nanos,
            ),
        }
    }
}

/// Scale a signed byte count to B/KB/MB/GB (binary multiples).
pub fn pretty_bytes(bytes: i64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let sign = if bytes < 0 { "-" } else { "" };
    let mut value = bytes.unsigned_abs() as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{sign}{value:.0} {}", UNITS[unit])
    } else {
        format!("{sign}{value:.2} {}", UNITS[unit])
    }
}
