//! Configuration loading from calibench.toml
//!
//! Calibench configuration can be specified in a `calibench.toml` file in the project root.
//! The configuration is automatically discovered by walking up from the current directory.
//! Command-line flags override whatever the file sets.

use anyhow::Context;
use calibench_core::{BenchTime, RunConfig, parse_duration};
use calibench_report::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name looked up by [`CalibenchConfig::discover`]
pub const CONFIG_FILE: &str = "calibench.toml";

/// Calibench configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CalibenchConfig {
    /// Runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Allocator tracking configuration
    #[serde(default)]
    pub allocator: AllocatorConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// Runner configuration for benchmark execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Target duration ("1s") or fixed iteration count ("500x")
    #[serde(default = "default_bench_time")]
    pub bench_time: String,
    /// Timeout for a single benchmark (e.g., "60s", "5m")
    #[serde(default = "default_timeout")]
    pub timeout: String,
    /// Pin measurement threads to this CPU (Linux only)
    #[serde(default)]
    pub pin_cpu: Option<usize>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            bench_time: default_bench_time(),
            timeout: default_timeout(),
            pin_cpu: None,
        }
    }
}

fn default_bench_time() -> String {
    "1s".to_string()
}
fn default_timeout() -> String {
    "60s".to_string()
}

/// Allocator tracking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocatorConfig {
    /// Record net bytes and allocation counts while timed
    #[serde(default = "default_true")]
    pub track: bool,
    /// Wait for the live heap to settle before each measurement call
    #[serde(default = "default_true")]
    pub settle: bool,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            track: true,
            settle: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output format: "human", "json", "compact"
    #[serde(default = "default_format")]
    pub format: String,
    /// Print system information before human output
    #[serde(default = "default_true")]
    pub preamble: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            preamble: true,
        }
    }
}

fn default_format() -> String {
    "human".to_string()
}

impl CalibenchConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("invalid {}", path.display()))?;
        Ok(config)
    }

    /// Find the nearest `calibench.toml`, walking up from `start`
    pub fn find(start: impl Into<PathBuf>) -> Option<PathBuf> {
        let mut dir = start.into();
        loop {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                return Some(config_path);
            }
            if !dir.pop() {
                return None;
            }
        }
    }

    /// Discover and load configuration from the current directory upward.
    ///
    /// A missing file gives `Ok(None)`; a file that fails to parse is an error.
    pub fn discover() -> anyhow::Result<Option<Self>> {
        let cwd = std::env::current_dir().context("failed to read current directory")?;
        match Self::find(cwd) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading configuration");
                Self::load(path).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Build the engine configuration
    pub fn run_config(&self) -> anyhow::Result<RunConfig> {
        let bench_time: BenchTime = self
            .runner
            .bench_time
            .parse()
            .with_context(|| format!("invalid runner.bench_time {:?}", self.runner.bench_time))?;
        let timeout = parse_duration(&self.runner.timeout)
            .with_context(|| format!("invalid runner.timeout {:?}", self.runner.timeout))?;

        Ok(RunConfig {
            bench_time,
            timeout: Duration::from_nanos(timeout),
            track_allocations: self.allocator.track,
            settle_heap: self.allocator.settle,
            pin_cpu: self.runner.pin_cpu,
        })
    }

    /// Output format named in the file
    pub fn output_format(&self) -> anyhow::Result<OutputFormat> {
        self.output
            .format
            .parse()
            .map_err(|e: String| anyhow::anyhow!("invalid output.format: {e}"))
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# Calibench Configuration

[runner]
# Target measured time per benchmark ("1s"), or a fixed iteration count ("500x")
bench_time = "1s"
# Timeout for a single benchmark
timeout = "60s"
# Pin measurement threads to a CPU, Linux only (uncomment to enable)
# pin_cpu = 2

[allocator]
# Track net bytes and allocation counts during measurement
track = true
# Let the live heap settle before each measurement call
settle = true

[output]
# Default output format: human, json, compact
format = "human"
# Print system information before results
preamble = true
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CalibenchConfig::default();
        assert_eq!(config.runner.bench_time, "1s");
        assert_eq!(config.runner.timeout, "60s");
        assert!(config.allocator.track);
        assert!(config.allocator.settle);
        assert!(config.output.preamble);
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [runner]
            bench_time = "250x"
            timeout = "5s"

            [allocator]
            track = false
        "#;

        let config: CalibenchConfig = toml::from_str(toml_str).unwrap();
        let run = config.run_config().unwrap();
        assert_eq!(run.bench_time, BenchTime::Iterations(250));
        assert_eq!(run.timeout, Duration::from_secs(5));
        assert!(!run.track_allocations);
        // Defaults should still apply
        assert!(run.settle_heap);
        assert_eq!(config.output.format, "human");
    }

    #[test]
    fn test_invalid_values_are_errors() {
        let mut config = CalibenchConfig::default();
        config.runner.bench_time = "soon".to_string();
        assert!(config.run_config().is_err());

        let mut config = CalibenchConfig::default();
        config.output.format = "html".to_string();
        assert!(config.output_format().is_err());
    }

    #[test]
    fn test_default_toml_parses() {
        let default_toml = CalibenchConfig::default_toml();
        let config: CalibenchConfig = toml::from_str(&default_toml).unwrap();
        let run = config.run_config().unwrap();
        assert_eq!(run.bench_time, BenchTime::Target(Duration::from_secs(1)));
        assert_eq!(config.output_format().unwrap(), OutputFormat::Human);
    }

    #[test]
    fn test_find_walks_up() {
        let root = std::env::temp_dir().join(format!("calibench-find-{}", std::process::id()));
        let nested = root.join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.join(CONFIG_FILE), CalibenchConfig::default_toml()).unwrap();

        assert_eq!(CalibenchConfig::find(&nested), Some(root.join(CONFIG_FILE)));

        std::fs::remove_dir_all(&root).unwrap();
    }
}
