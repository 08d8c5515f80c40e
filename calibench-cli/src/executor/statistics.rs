//! Statistics Computation
//!
//! Parallel computation of per-benchmark metrics over a finished tree.
//! Each passed leaf is processed independently, so Rayon spreads the work
//! across cores; groups, failures and skips carry no metrics.

use calibench_core::BenchNode;
use calibench_report::EntryMetrics;
use calibench_stats::{Headline, Metric, summarize};
use rayon::prelude::*;

/// Metrics for one node, `None` unless it is a passed leaf
pub fn entry_metrics(node: &BenchNode) -> Option<EntryMetrics> {
    let m = node.measurement.as_ref()?;
    let megabytes_per_sec =
        (m.bytes_per_iteration > 0).then(|| summarize(m, Metric::MegabytesPerSec));

    Some(EntryMetrics {
        samples: m.samples.len(),
        headline: Headline::from_measurement(m),
        nanos_per_op: summarize(m, Metric::NanosPerOp),
        bytes_per_op: summarize(m, Metric::BytesPerOp),
        megabytes_per_sec,
    })
}

/// Compute metrics for every node (parallelized with Rayon), preserving order
pub fn compute_statistics(nodes: &[(usize, &BenchNode)]) -> Vec<Option<EntryMetrics>> {
    nodes
        .par_iter()
        .map(|(_, node)| entry_metrics(node))
        .collect()
}
