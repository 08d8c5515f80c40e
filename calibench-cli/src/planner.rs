//! Benchmark Planner
//!
//! Builds execution plan by filtering and ordering benchmarks.
//!
//! Filtering options:
//! - Regex pattern matching on benchmark name
//! - Tag inclusion/exclusion
//!
//! Ordering: Benchmarks are sorted alphabetically by name for deterministic execution.

use calibench_core::BenchmarkDef;

/// Execution plan for benchmarks
pub struct ExecutionPlan {
    /// Ordered list of benchmarks to run
    pub benchmarks: Vec<&'static BenchmarkDef>,
}

impl ExecutionPlan {
    /// Number of planned benchmarks
    pub fn len(&self) -> usize {
        self.benchmarks.len()
    }

    /// Whether nothing matched
    pub fn is_empty(&self) -> bool {
        self.benchmarks.is_empty()
    }
}

/// Build execution plan from discovered benchmarks
///
/// Filters benchmarks based on CLI options and returns them in deterministic order.
pub fn build_plan(
    benchmarks: impl IntoIterator<Item = &'static BenchmarkDef>,
    filter: Option<&regex::Regex>,
    tag: Option<&str>,
    skip_tag: Option<&str>,
) -> ExecutionPlan {
    let mut selected: Vec<_> = benchmarks
        .into_iter()
        .filter(|b| filter.is_none_or(|re| re.is_match(b.name)))
        .filter(|b| tag.is_none_or(|t| b.tags.contains(&t)))
        .filter(|b| skip_tag.is_none_or(|t| !b.tags.contains(&t)))
        .collect();

    selected.sort_by_key(|b| b.name);

    ExecutionPlan {
        benchmarks: selected,
    }
}
