#![warn(missing_docs)]
//! Calibench CLI Library
//!
//! This module provides the CLI infrastructure for benchmark binaries.
//! Call `calibench::run()` (or `calibench_cli::run()`) in your main function to get the full
//! calibench CLI experience with your registered benchmarks.
//!
//! # Example
//!
//! ```ignore
//! use calibench::prelude::*;
//!
//! #[bench]
//! fn sum(b: &mut Bencher) {
//!     for i in 0..b.n() {
//!         black_box(i + 1);
//!     }
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     calibench::run()
//! }
//! ```

mod config;
mod executor;
mod planner;

pub use config::*;
pub use executor::{
    Executor, build_report, build_report_meta, compute_statistics, entry_metrics, flatten,
    format_duration, format_entry, format_human_output, format_preamble, system_info,
};
pub use planner::{ExecutionPlan, build_plan};

use anyhow::Context;
use calibench_core::{BenchTime, BenchmarkDef, RunConfig, TriggerDef, parse_duration};
use calibench_report::{OutputFormat, Report, generate_compact_json, generate_json_report};
use clap::Parser;
use rayon::ThreadPoolBuilder;
use regex::Regex;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Calibench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "calibench")]
#[command(author, version, about = "Calibench - self-calibrating micro-benchmarks")]
pub struct Cli {
    /// Filter benchmarks by regex pattern
    #[arg(default_value = ".*")]
    pub filter: String,

    /// Output format: human, json, compact
    #[arg(long)]
    pub format: Option<String>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Target measured time ("2s", "250ms") or fixed iteration count ("1000x")
    #[arg(long)]
    pub bench_time: Option<String>,

    /// Timeout for a single benchmark (e.g. "60s", "5m")
    #[arg(long)]
    pub timeout: Option<String>,

    /// Explicit config file instead of discovering calibench.toml
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Filter by tag
    #[arg(long)]
    pub tag: Option<String>,

    /// Skip benchmarks with this tag
    #[arg(long)]
    pub skip_tag: Option<String>,

    /// List benchmarks without executing
    #[arg(long, alias = "dry-run")]
    pub list: bool,

    /// Disable allocation tracking
    #[arg(long)]
    pub no_alloc: bool,

    /// Do not print system information before results
    #[arg(long)]
    pub no_preamble: bool,

    /// Number of threads for parallel statistics computation
    /// 0 = use all available cores (default), 1 = single-threaded
    #[arg(long, short = 'j', default_value = "0")]
    pub threads: usize,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Internal: Absorb cargo bench's --bench flag
    #[arg(long, hide = true)]
    pub bench: bool,
}

/// Run the Calibench CLI with the process arguments.
/// This is the main entry point for benchmark binaries.
///
/// Exits the process with status 1 when any benchmark or trigger failed.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the Calibench CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    init_tracing(cli.verbose);

    let file_config = match &cli.config {
        Some(path) => CalibenchConfig::load(path)?,
        None => CalibenchConfig::discover()?.unwrap_or_default(),
    };

    if cli.list {
        return list_benchmarks(&cli);
    }

    let run_config = resolve_run_config(&cli, &file_config)?;
    let format = match &cli.format {
        Some(f) => f
            .parse()
            .map_err(|e: String| anyhow::anyhow!("invalid --format: {e}"))?,
        None => file_config.output_format()?,
    };
    let preamble = file_config.output.preamble && !cli.no_preamble;

    let report = run_benchmarks(&cli, &run_config)?;
    let Some(report) = report else {
        return Ok(());
    };

    let mut output = String::new();
    if format == OutputFormat::Human && preamble {
        output.push_str(&format_preamble(&report.meta));
    }
    output.push_str(&match format {
        OutputFormat::Human => format_human_output(&report),
        OutputFormat::Json => generate_json_report(&report)?,
        OutputFormat::Compact => generate_compact_json(&report)?,
    });

    if let Some(ref path) = cli.output {
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        file.write_all(output.as_bytes())?;
        println!("Report written to: {}", path.display());
    } else {
        print!("{}", output);
        if !output.ends_with('\n') {
            println!();
        }
    }

    if report.summary.has_failures() {
        eprintln!(
            "\n{} benchmark(s) failed, {} trigger(s) failed",
            report.summary.failed, report.summary.trigger_failures
        );
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "calibench=debug"
    } else {
        "calibench=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A host binary may already have installed a subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Layer calibench.toml values under CLI overrides.
pub fn resolve_run_config(cli: &Cli, file: &CalibenchConfig) -> anyhow::Result<RunConfig> {
    let mut config = file.run_config()?;

    if let Some(bench_time) = &cli.bench_time {
        config.bench_time = bench_time
            .parse::<BenchTime>()
            .with_context(|| format!("invalid --bench-time {bench_time:?}"))?;
    }
    if let Some(timeout) = &cli.timeout {
        let nanos =
            parse_duration(timeout).with_context(|| format!("invalid --timeout {timeout:?}"))?;
        config.timeout = Duration::from_nanos(nanos);
    }
    if cli.no_alloc {
        config.track_allocations = false;
    }

    Ok(config)
}

/// Filter benchmarks based on CLI options using the planner module.
///
/// Returns benchmarks sorted alphabetically by name for deterministic execution.
fn plan_benchmarks(cli: &Cli) -> anyhow::Result<ExecutionPlan> {
    let filter_re =
        Regex::new(&cli.filter).with_context(|| format!("invalid filter {:?}", cli.filter))?;

    Ok(build_plan(
        inventory::iter::<BenchmarkDef>,
        Some(&filter_re),
        cli.tag.as_deref(),
        cli.skip_tag.as_deref(),
    ))
}

fn list_benchmarks(cli: &Cli) -> anyhow::Result<()> {
    println!("Calibench Plan:");

    let plan = plan_benchmarks(cli)?;
    for bench in &plan.benchmarks {
        let tags = if bench.tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", bench.tags.join(", "))
        };
        let bench_time = bench
            .bench_time()
            .map(|t| format!(" ({t})"))
            .unwrap_or_default();
        println!(
            "├── {}{}{} ({}:{})",
            bench.name, bench_time, tags, bench.file, bench.line
        );
    }
    println!("{} benchmarks found.", plan.len());

    let triggers: Vec<_> = inventory::iter::<TriggerDef>.into_iter().collect();
    for trigger in &triggers {
        println!("trigger {:?}: {} ({}:{})", trigger.phase, trigger.name, trigger.file, trigger.line);
    }

    Ok(())
}

fn run_benchmarks(cli: &Cli, config: &RunConfig) -> anyhow::Result<Option<Report>> {
    // Configure Rayon thread pool for statistics computation
    if cli.threads > 0 {
        ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .ok();
    }

    let plan = plan_benchmarks(cli)?;
    if plan.is_empty() {
        println!("No benchmarks found.");
        return Ok(None);
    }

    eprintln!(
        "Running {} benchmarks, bench time {}, timeout {:?}...\n",
        plan.len(),
        config.bench_time,
        config.timeout
    );

    let triggers: Vec<&TriggerDef> = inventory::iter::<TriggerDef>.into_iter().collect();
    let outcome = Executor::new(config.clone()).execute(&plan.benchmarks, &triggers);

    if config.track_allocations && !calibench_core::tracking_active() {
        eprintln!(
            "Warning: allocation tracking enabled but nothing was recorded.\n\
             Ensure TrackingAllocator is set as #[global_allocator] in your benchmark binary."
        );
    }

    Ok(Some(build_report(&outcome, config)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_file() {
        let cli = Cli::parse_from([
            "calibench",
            "parse_.*",
            "--bench-time",
            "200x",
            "--timeout",
            "5s",
            "--no-alloc",
        ]);
        assert_eq!(cli.filter, "parse_.*");

        let config = resolve_run_config(&cli, &CalibenchConfig::default()).unwrap();
        assert_eq!(config.bench_time, BenchTime::Iterations(200));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(!config.track_allocations);
        assert!(config.settle_heap);
    }

    #[test]
    fn test_file_values_used_without_flags() {
        let cli = Cli::parse_from(["calibench", "--bench"]);
        let mut file = CalibenchConfig::default();
        file.runner.bench_time = "250ms".to_string();

        let config = resolve_run_config(&cli, &file).unwrap();
        assert_eq!(config.bench_time, BenchTime::Target(Duration::from_millis(250)));
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_bad_bench_time_flag_is_error() {
        let cli = Cli::parse_from(["calibench", "--bench-time", "0x"]);
        assert!(resolve_run_config(&cli, &CalibenchConfig::default()).is_err());
    }
}
