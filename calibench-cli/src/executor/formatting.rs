//! Output Formatting
//!
//! Human-readable output formatting for benchmark reports.
//!
//! One line per benchmark, indented by nesting depth, with a status icon
//! (✓/✗/⊘). Passed leaves show iterations, time per op, declared
//! throughput, allocations, and the spread across calibration steps.

use calibench_report::{BenchmarkStatus, Report, ReportEntry};

/// Format a report for human-readable terminal display
pub fn format_human_output(report: &Report) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str("Calibench Results\n");
    output.push_str(&"=".repeat(60));
    output.push_str("\n\n");

    for entry in &report.entries {
        output.push_str(&format_entry(entry));
        output.push('\n');
    }

    let s = &report.summary;
    output.push('\n');
    output.push_str(&"-".repeat(60));
    output.push('\n');
    output.push_str(&format!(
        "{} benchmarks: {} passed, {} failed, {} skipped in {}\n",
        s.total_benchmarks,
        s.passed,
        s.failed,
        s.skipped,
        format_duration(s.total_duration_ms * 1e6)
    ));
    if s.trigger_failures > 0 {
        output.push_str(&format!("{} trigger(s) failed\n", s.trigger_failures));
    }

    output
}

/// One result line
pub fn format_entry(entry: &ReportEntry) -> String {
    let icon = match entry.status {
        BenchmarkStatus::Passed => "✓",
        BenchmarkStatus::Failed => "✗",
        BenchmarkStatus::Skipped => "⊘",
    };
    let mut line = format!("{}{} {}", "  ".repeat(entry.depth), icon, entry.name);

    if let Some(m) = &entry.metrics {
        let h = &m.headline;
        line.push_str(&format!(
            "  {:>12} iters  {:>12}/op",
            h.iterations,
            format_duration(h.nanos_per_op)
        ));
        if h.megabytes_per_sec > 0.0 {
            line.push_str(&format!("  {:>10.2} MB/s", h.megabytes_per_sec));
        }
        line.push_str(&format!(
            "  {:>8.0} B/op  {:>6.1} allocs/op",
            h.bytes_per_op, h.allocs_per_op
        ));
        if !m.nanos_per_op.is_empty() {
            line.push_str(&format!("  ±{:.2}%", m.nanos_per_op.stdev_percent));
        }
    } else if let Some(reason) = &entry.reason {
        line.push_str(&format!("  ({reason})"));
    }

    line
}

/// Scale nanoseconds to ns/µs/ms/s
pub fn format_duration(nanos: f64) -> String {
    if nanos < 1_000.0 {
        format!("{nanos:.2} ns")
    } else if nanos < 1_000_000.0 {
        format!("{:.2} µs", nanos / 1_000.0)
    } else if nanos < 1_000_000_000.0 {
        format!("{:.2} ms", nanos / 1_000_000.0)
    } else {
        format!("{:.2} s", nanos / 1_000_000_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calibench_report::EntryMetrics;
    use calibench_stats::{Headline, compute_trimmed};

    fn entry(name: &str, depth: usize, status: BenchmarkStatus) -> ReportEntry {
        ReportEntry {
            name: name.to_string(),
            status,
            reason: None,
            depth,
            is_group: false,
            bench_time: "1s".to_string(),
            metrics: None,
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(12.0), "12.00 ns");
        assert_eq!(format_duration(1_500.0), "1.50 µs");
        assert_eq!(format_duration(2_500_000.0), "2.50 ms");
        assert_eq!(format_duration(3e9), "3.00 s");
    }

    #[test]
    fn test_skipped_line_shows_reason_and_indent() {
        let mut e = entry("codec:decode", 1, BenchmarkStatus::Skipped);
        e.reason = Some("no fixture".to_string());
        assert_eq!(format_entry(&e), "  ⊘ codec:decode  (no fixture)");
    }

    #[test]
    fn test_passed_line_shows_metrics() {
        let mut e = entry("copy", 0, BenchmarkStatus::Passed);
        e.metrics = Some(EntryMetrics {
            samples: 3,
            headline: Headline {
                iterations: 1_000,
                total_nanos: 100_000_000,
                nanos_per_op: 100_000.0,
                ops_per_sec: 10_000.0,
                bytes_per_op: 0.0,
                allocs_per_op: 0.0,
                net_bytes: 0,
                net_bytes_pretty: "0 B".to_string(),
                megabytes_per_sec: 1.0,
            },
            nanos_per_op: compute_trimmed(&[100_000.0]),
            bytes_per_op: compute_trimmed(&[0.0]),
            megabytes_per_sec: None,
        });

        let line = format_entry(&e);
        assert!(line.starts_with("✓ copy"));
        assert!(line.contains("100.00 µs/op"));
        assert!(line.contains("1.00 MB/s"));
        assert!(line.contains("±0.00%"));
    }
}
