//! Trimmed Summary Statistics
//!
//! Values are sorted and the extreme 10% is dropped from each end (ceiling
//! rounding) before min, max, mean and population standard deviation are
//! computed over what remains.

use serde::{Deserialize, Serialize};

/// Fraction trimmed from each tail
pub const TRIM_FRACTION: f64 = 0.10;

/// Summary of one metric across a measurement's calibration samples
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatSummary {
    pub min: f64,
    pub max: f64,
    pub average: f64,
    pub stdev: f64,
    /// `stdev / average * 100`, 0 when the average is 0
    pub stdev_percent: f64,
    /// Retained values, ascending
    pub values: Vec<f64>,
}

impl StatSummary {
    /// Whether the summary was computed from no values at all
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Number of values dropped from each end for a set of `len` values.
pub fn trim_count(len: usize) -> usize {
    (len as f64 * TRIM_FRACTION).ceil() as usize
}

/// Compute a trimmed summary.
///
/// When trimming would leave nothing (two or fewer values), the untrimmed
/// values are summarised instead. An empty input gives an all-zero summary.
pub fn compute_trimmed(values: &[f64]) -> StatSummary {
    if values.is_empty() {
        return StatSummary::default();
    }

    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let k = trim_count(sorted.len());
    let retained = if 2 * k >= sorted.len() {
        sorted
    } else {
        sorted[k..sorted.len() - k].to_vec()
    };

    let count = retained.len() as f64;
    let average = retained.iter().sum::<f64>() / count;
    let variance = retained.iter().map(|x| (x - average).powi(2)).sum::<f64>() / count;
    let stdev = variance.sqrt();
    let stdev_percent = if average == 0.0 {
        0.0
    } else {
        stdev / average * 100.0
    };

    StatSummary {
        min: retained[0],
        max: retained[retained.len() - 1],
        average,
        stdev,
        stdev_percent,
        values: retained,
    }
}
