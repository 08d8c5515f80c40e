//! System Metadata Collection
//!
//! Collects system information for report metadata and the preamble printed
//! before human-readable results.
//!
//! ## Collected Data
//!
//! - **Git**: Current commit hash and branch name
//! - **OS**: Operating system name and architecture
//! - **CPU**: Model name and core count
//! - **Memory**: Total system RAM in GB
//! - **Timestamp**: UTC time of report generation
//!
//! Linux-specific data (CPU model, memory) gracefully degrades on other
//! platforms, returning "Unknown" or 0 values.

use calibench_core::RunConfig;
use calibench_report::{ReportConfig, ReportMeta, SystemInfo};
use chrono::Utc;

/// Build report metadata including system info and git details
pub fn build_report_meta(config: &RunConfig) -> ReportMeta {
    ReportMeta {
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        git_commit: git(&["rev-parse", "HEAD"]),
        git_branch: git(&["rev-parse", "--abbrev-ref", "HEAD"]),
        system: system_info(),
        config: ReportConfig {
            bench_time: config.bench_time.to_string(),
            timeout_ns: config.timeout.as_nanos().min(u64::MAX as u128) as u64,
            track_allocations: config.track_allocations,
            settle_heap: config.settle_heap,
            pin_cpu: config.pin_cpu,
        },
    }
}

/// Describe the machine running the benchmarks
pub fn system_info() -> SystemInfo {
    SystemInfo {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        cpu: get_cpu_model().unwrap_or_else(|| "Unknown".to_string()),
        cpu_cores: num_cpus(),
        memory_gb: get_memory_gb().unwrap_or(0.0),
    }
}

/// Preamble lines printed before human-readable results
pub fn format_preamble(meta: &ReportMeta) -> String {
    let sys = &meta.system;
    let mut out = format!("calibench {}\n", meta.version);
    out.push_str(&format!("os: {}/{}\n", sys.os, sys.arch));
    out.push_str(&format!("cpu: {} ({} cores)\n", sys.cpu, sys.cpu_cores));
    if sys.memory_gb > 0.0 {
        out.push_str(&format!("memory: {:.1} GB\n", sys.memory_gb));
    }
    if let Some(commit) = &meta.git_commit {
        let short = commit.get(..12).unwrap_or(commit);
        match &meta.git_branch {
            Some(branch) => out.push_str(&format!("git: {short} ({branch})\n")),
            None => out.push_str(&format!("git: {short}\n")),
        }
    }
    out.push_str(&format!(
        "bench time: {}  timeout: {:?}\n",
        meta.config.bench_time,
        std::time::Duration::from_nanos(meta.config.timeout_ns)
    ));
    out
}

fn git(args: &[&str]) -> Option<String> {
    std::process::Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Get CPU model name from /proc/cpuinfo (Linux only)
fn get_cpu_model() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/cpuinfo")
            .ok()
            .and_then(|content| {
                content
                    .lines()
                    .find(|l| l.starts_with("model name"))
                    .and_then(|l| l.split(':').nth(1))
                    .map(|s| s.trim().to_string())
            })
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

/// Get number of available CPU cores
fn num_cpus() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1)
}

/// Get total system memory in GB (Linux only)
fn get_memory_gb() -> Option<f64> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/meminfo")
            .ok()
            .and_then(|content| {
                content
                    .lines()
                    .find(|l| l.starts_with("MemTotal"))
                    .and_then(|l| {
                        l.split_whitespace()
                            .nth(1)
                            .and_then(|s| s.parse::<u64>().ok())
                    })
                    .map(|kb| kb as f64 / 1024.0 / 1024.0)
            })
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preamble_mentions_system() {
        let meta = build_report_meta(&RunConfig::default());
        let preamble = format_preamble(&meta);
        assert!(preamble.contains(std::env::consts::OS));
        assert!(preamble.contains("bench time: 1s"));
        assert!(meta.system.cpu_cores >= 1);
    }
}
