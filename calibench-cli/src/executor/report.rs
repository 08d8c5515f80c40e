//! Report Building
//!
//! Flattens a finished suite tree into a [`Report`]: one entry per node in
//! execution order (parents before their children), metrics attached to
//! passed leaves only. Nothing is re-run; the same report feeds every
//! output format.
//!
//! ```text
//!   SuiteOutcome (tree)
//!          │  pre-order walk
//!          ▼
//!   (depth, &BenchNode) list
//!          │  parallel metrics
//!          ▼
//!       Report
//! ```

use super::metadata::build_report_meta;
use super::statistics::compute_statistics;
use calibench_core::{BenchNode, BenchState, RunConfig, SuiteOutcome};
use calibench_report::{BenchmarkStatus, Report, ReportEntry, ReportSummary};

/// Flatten the tree below the suite root as `(depth, node)`.
///
/// The unnamed suite root itself is not an entry; its children sit at depth 0.
pub fn flatten(root: &BenchNode) -> Vec<(usize, &BenchNode)> {
    if root.name.is_empty() {
        root.walk()
            .into_iter()
            .skip(1)
            .map(|(depth, node)| (depth - 1, node))
            .collect()
    } else {
        root.walk()
    }
}

fn status_of(state: &BenchState) -> BenchmarkStatus {
    match state {
        BenchState::Failed(_) => BenchmarkStatus::Failed,
        BenchState::Skipped(_) => BenchmarkStatus::Skipped,
        // A node still running after the suite finished never produced a result.
        BenchState::Running => BenchmarkStatus::Failed,
        BenchState::Passed => BenchmarkStatus::Passed,
    }
}

/// Build a complete Report from a finished suite
pub fn build_report(outcome: &SuiteOutcome, config: &RunConfig) -> Report {
    let nodes = flatten(&outcome.root);
    let metrics = compute_statistics(&nodes);

    let mut summary = ReportSummary {
        total_benchmarks: nodes.len(),
        trigger_failures: outcome.trigger_failures,
        total_duration_ms: outcome.duration.as_secs_f64() * 1_000.0,
        ..Default::default()
    };

    let mut entries = Vec::with_capacity(nodes.len());
    for ((depth, node), metrics) in nodes.into_iter().zip(metrics) {
        let status = status_of(&node.state);
        match status {
            BenchmarkStatus::Passed => summary.passed += 1,
            BenchmarkStatus::Failed => summary.failed += 1,
            BenchmarkStatus::Skipped => summary.skipped += 1,
        }

        entries.push(ReportEntry {
            name: node.name.clone(),
            status,
            reason: node.reason(),
            depth,
            is_group: node.is_group(),
            bench_time: node.bench_time.to_string(),
            metrics,
        });
    }

    Report {
        meta: build_report_meta(config),
        entries,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calibench_core::{BenchTime, Bencher, Suite};

    #[test]
    fn test_report_flattens_tree_in_execution_order() {
        let config = RunConfig {
            bench_time: BenchTime::Iterations(5),
            settle_heap: false,
            ..RunConfig::default()
        };
        let mut suite = Suite::new(config.clone());
        suite.run("codec", |b: &mut Bencher| {
            b.run("encode", |_: &mut Bencher| Ok(()));
            b.run("decode", |b: &mut Bencher| b.skip("no fixture"));
            Ok(())
        });
        suite.run("hash", |b: &mut Bencher| b.fail("bad seed"));
        let outcome = suite.finish();

        let report = build_report(&outcome, &config);
        let rows: Vec<_> = report
            .entries
            .iter()
            .map(|e| (e.name.as_str(), e.depth, e.status))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("codec", 0, BenchmarkStatus::Passed),
                ("codec:encode", 1, BenchmarkStatus::Passed),
                ("codec:decode", 1, BenchmarkStatus::Skipped),
                ("hash", 0, BenchmarkStatus::Failed),
            ]
        );

        let codec = report.entry("codec").expect("codec");
        assert!(codec.is_group);
        assert!(codec.metrics.is_none());
        assert!(report.entry("codec:encode").and_then(|e| e.metrics.as_ref()).is_some());
        assert_eq!(report.entry("hash").and_then(|e| e.reason.as_deref()), Some("bad seed"));

        assert_eq!(report.summary.total_benchmarks, 4);
        assert_eq!(report.summary.passed, 2);
        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.summary.skipped, 1);
        assert!(report.summary.has_failures());
    }
}
