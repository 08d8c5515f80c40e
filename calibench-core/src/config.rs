//! Run configuration
//!
//! [`RunConfig`] is built once and threaded through every benchmark,
//! sub-benchmark and measurement call. Nothing in the engine reads global
//! settings.

use crate::error::ParseBenchTimeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default per-benchmark target duration
pub const DEFAULT_TARGET: Duration = Duration::from_secs(1);

/// Default global budget for one benchmark
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// How long a benchmark should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchTime {
    /// Run exactly this many iterations
    Iterations(u64),
    /// Calibrate until the accumulated measured time reaches this target
    Target(Duration),
}

impl Default for BenchTime {
    fn default() -> Self {
        BenchTime::Target(DEFAULT_TARGET)
    }
}

impl fmt::Display for BenchTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BenchTime::Iterations(n) => write!(f, "{n}x"),
            BenchTime::Target(d) => write!(f, "{d:?}"),
        }
    }
}

impl FromStr for BenchTime {
    type Err = ParseBenchTimeError;

    /// Parse `"500x"` as a fixed count, anything else as a duration.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(count) = s.strip_suffix('x') {
            let n: u64 = count
                .trim()
                .parse()
                .map_err(|_| ParseBenchTimeError::InvalidNumber(count.to_string()))?;
            if n == 0 {
                return Err(ParseBenchTimeError::NotPositive(s.to_string()));
            }
            return Ok(BenchTime::Iterations(n));
        }
        let nanos = parse_duration(s)?;
        if nanos == 0 {
            return Err(ParseBenchTimeError::NotPositive(s.to_string()));
        }
        Ok(BenchTime::Target(Duration::from_nanos(nanos)))
    }
}

/// Parse a duration string (e.g. "3s", "500ms", "2m") to nanoseconds.
///
/// A bare number is taken as seconds.
pub fn parse_duration(s: &str) -> Result<u64, ParseBenchTimeError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ParseBenchTimeError::Empty);
    }

    let (num_part, unit_part) = s
        .char_indices()
        .find(|(_, c)| c.is_alphabetic() || *c == 'µ')
        .map(|(i, _)| s.split_at(i))
        .unwrap_or((s, "s"));

    let value: f64 = num_part
        .trim()
        .parse()
        .map_err(|_| ParseBenchTimeError::InvalidNumber(num_part.to_string()))?;
    if value < 0.0 || !value.is_finite() {
        return Err(ParseBenchTimeError::NotPositive(s.to_string()));
    }

    let multiplier: u64 = match unit_part.to_lowercase().as_str() {
        "ns" => 1,
        "us" | "µs" => 1_000,
        "ms" => 1_000_000,
        "s" | "" => 1_000_000_000,
        "m" | "min" => 60_000_000_000,
        other => return Err(ParseBenchTimeError::UnknownUnit(other.to_string())),
    };

    Ok((value * multiplier as f64) as u64)
}

/// Immutable settings for a benchmark run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Fixed count or calibration target; inherited by sub-benchmarks
    pub bench_time: BenchTime,
    /// Global budget for one benchmark; per-step hard budgets never drop below half of it
    pub timeout: Duration,
    /// Record allocation deltas while the timer runs
    pub track_allocations: bool,
    /// Wait for the live heap to settle before each step
    pub settle_heap: bool,
    /// Pin measurement threads to this core (Linux only)
    pub pin_cpu: Option<usize>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            bench_time: BenchTime::default(),
            timeout: DEFAULT_TIMEOUT,
            track_allocations: true,
            settle_heap: true,
            pin_cpu: None,
        }
    }
}

impl RunConfig {
    /// Same configuration with a different bench time
    pub fn with_bench_time(&self, bench_time: BenchTime) -> Self {
        Self {
            bench_time,
            ..self.clone()
        }
    }

    /// Same configuration with a different global timeout
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            timeout,
            ..self.clone()
        }
    }
}
