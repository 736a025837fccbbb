//! Command-line options and configuration layering.

use std::path::{Path, PathBuf};

use anyhow::Context;
use barista_core::{LogLevel, RunConfig};
use clap::Parser;
use tracing::debug;

/// Configuration file picked up from the working directory
pub const DEFAULT_CONFIG_FILE: &str = "barista.toml";

/// Searched when no path is given
pub const DEFAULT_SPEC_DIR: &str = "test";

/// Barista test runner
///
/// Runs TOML and JSON spec files, several at a time, and reports the results.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
pub struct Cli {
    /// Spec files or directories containing `*.test.toml` / `*.test.json` files
    pub paths: Vec<PathBuf>,

    /// Configuration file (defaults to ./barista.toml when present)
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Number of spec files run at the same time
    #[clap(long)]
    pub concurrency: Option<usize>,

    /// Run spec files one at a time
    #[clap(long)]
    pub no_parallel: bool,

    /// Keep running siblings after a failure
    #[clap(long)]
    pub no_fast_fail: bool,

    /// Default deadline in milliseconds; 0 disables it
    #[clap(long)]
    pub timeout: Option<u64>,

    /// Delay between retry attempts in milliseconds
    #[clap(long)]
    pub retry_delay: Option<u64>,

    /// Maximum number of retry attempts
    #[clap(long)]
    pub retry_maximum: Option<u32>,

    /// Error category that is never retried (repeatable)
    #[clap(long = "non-retryable")]
    pub non_retryable: Vec<String>,

    /// Spec file evaluated into every spec before the spec itself
    #[clap(long)]
    pub preload: Option<PathBuf>,

    /// Print the result tree as JSON instead of the terminal report
    #[clap(long)]
    pub json: bool,

    /// Logging level (trace, debug, info, warn, error)
    #[clap(long)]
    pub log_level: Option<LogLevel>,
}

impl Cli {
    /// Build the run configuration: defaults, then the configuration file,
    /// then the flags given on the command line.
    pub fn resolve_config(&self) -> anyhow::Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                RunConfig::load(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => RunConfig::default(),
        };

        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if self.no_parallel {
            config.parallel = false;
        }
        if self.no_fast_fail {
            config.fast_fail = false;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(delay) = self.retry_delay {
            config.retries.delay = delay;
        }
        if let Some(maximum) = self.retry_maximum {
            config.retries.maximum = maximum;
        }
        if !self.non_retryable.is_empty() {
            config.retries.non_retryable = self.non_retryable.clone();
        }
        if let Some(preload) = &self.preload {
            config.preload = Some(preload.clone());
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }

        config.validate()?;
        debug!(?config, "configuration resolved");
        Ok(config)
    }

    /// The paths to search, or the default spec directory.
    pub fn spec_paths(&self) -> Vec<PathBuf> {
        if self.paths.is_empty() {
            vec![PathBuf::from(DEFAULT_SPEC_DIR)]
        } else {
            self.paths.clone()
        }
    }
}
