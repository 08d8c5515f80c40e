//! Error and termination types

use std::time::Duration;
use thiserror::Error;

/// Result type returned by workloads.
///
/// `Err` carries a skip or fail request out of the workload; the isolated
/// worker turns it into the benchmark's terminal state.
pub type Outcome = Result<(), Abort>;

/// Early exit requested by a workload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Abort {
    /// The benchmark does not apply here.
    #[error("skipped{}", fmt_reason(.0))]
    Skip(Option<String>),
    /// The run is broken.
    #[error("failed{}", fmt_reason(.0))]
    Fail(Option<String>),
    /// The controller cancelled the call and the workload noticed.
    #[error("cancelled after exceeding its time budget")]
    Cancelled,
}

impl Abort {
    /// Skip with an optional reason (empty means none)
    pub fn skip(reason: impl Into<String>) -> Self {
        Abort::Skip(non_empty(reason.into()))
    }

    /// Fail with an optional reason (empty means none)
    pub fn fail(reason: impl Into<String>) -> Self {
        Abort::Fail(non_empty(reason.into()))
    }
}

/// Why a benchmark failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Failure {
    /// The workload called `fail()`, or a sub-benchmark failed.
    #[error("{}", .0.as_deref().unwrap_or("failed"))]
    Failed(Option<String>),

    /// A measurement call overran its hard budget.
    #[error("timed out: step took {elapsed:?}, budget was {budget:?}")]
    Timeout {
        /// Hard budget in effect for the call
        budget: Duration,
        /// Time the call actually took
        elapsed: Duration,
    },

    /// The worker terminated abnormally (panic or spawn failure).
    #[error("crashed: {0}")]
    Crashed(String),
}

/// Error parsing a bench time such as `"1s"` or `"500x"`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseBenchTimeError {
    /// Input was blank
    #[error("empty bench time")]
    Empty,
    /// Number part did not parse
    #[error("invalid number in bench time: {0:?}")]
    InvalidNumber(String),
    /// Unit suffix not recognised
    #[error("unknown bench time unit: {0:?}")]
    UnknownUnit(String),
    /// Zero or negative value
    #[error("bench time must be positive: {0:?}")]
    NotPositive(String),
}

fn non_empty(reason: String) -> Option<String> {
    if reason.trim().is_empty() {
        None
    } else {
        Some(reason)
    }
}

fn fmt_reason(reason: &Option<String>) -> String {
    reason
        .as_deref()
        .map(|r| format!(": {r}"))
        .unwrap_or_default()
}
