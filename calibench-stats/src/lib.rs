//! Calibench Statistics
//!
//! Turns a measurement's calibration samples into reportable numbers:
//! - Trimmed summaries (10% from each tail) of any per-sample metric
//! - Headline metrics from the untrimmed totals (ns/op, ops/s, B/op, MB/s)

mod metrics;
mod summary;

pub use metrics::{Headline, Metric, megabytes_per_sec, pretty_bytes, summarize};
pub use summary::{StatSummary, TRIM_FRACTION, compute_trimmed, trim_count};
