//! JSON Output

use crate::report::Report;
use calibench_stats::Headline;
use std::collections::BTreeMap;

/// Generate a prettified JSON report.
pub fn generate_json_report(report: &Report) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Headline numbers of every passed leaf, keyed by full benchmark name.
pub fn compact_metrics(report: &Report) -> BTreeMap<&str, &Headline> {
    report
        .entries
        .iter()
        .filter_map(|e| e.metrics.as_ref().map(|m| (e.name.as_str(), &m.headline)))
        .collect()
}

/// Generate the compact `{name: headline}` JSON map.
pub fn generate_compact_json(report: &Report) -> Result<String, serde_json::Error> {
    serde_json::to_string(&compact_metrics(report))
}
