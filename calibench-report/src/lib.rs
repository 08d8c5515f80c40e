#![warn(missing_docs)]
//! Calibench Report - Reporting Model
//!
//! Serialisable description of a finished suite, built once and rendered
//! as many ways as needed without re-running anything:
//! - JSON (full report)
//! - Compact JSON (`{name: headline}` for machine ingestion)
//! - Human-readable terminal output (rendered by the CLI)

mod json;
mod report;

pub use json::{compact_metrics, generate_compact_json, generate_json_report};
pub use report::{
    BenchmarkStatus, EntryMetrics, Report, ReportConfig, ReportEntry, ReportMeta, ReportSummary,
    SystemInfo,
};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable terminal output
    Human,
    /// JSON with the full report
    Json,
    /// Compact JSON map keyed by benchmark name
    Compact,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "text" => Ok(OutputFormat::Human),
            "json" => Ok(OutputFormat::Json),
            "compact" | "json-compact" => Ok(OutputFormat::Compact),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}
