//! Run configuration.
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then whatever overrides the caller applies (usually command-line flags).
//! Both `snake_case` and the `camelCase` spellings of the option names are
//! accepted in files.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{category, ConfigError};
use crate::utils::logging::LogLevel;

/// Retry settings for retry-capable tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Delay between attempts, in milliseconds
    pub delay: u64,

    /// Maximum number of attempts, counting the first one
    pub maximum: u32,

    /// Error categories that always fail immediately
    #[serde(alias = "nonRetryable")]
    pub non_retryable: Vec<String>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            delay: 100,
            maximum: 10,
            non_retryable: vec![
                category::REFERENCE.to_string(),
                category::TYPE.to_string(),
                category::RESOLUTION.to_string(),
            ],
        }
    }
}

impl RetryConfig {
    /// The delay between attempts.
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay)
    }
}

/// Configuration for a test run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Number of spec files executed concurrently
    pub concurrency: usize,

    /// When false, spec files run one at a time regardless of `concurrency`
    pub parallel: bool,

    /// Skip not-yet-started siblings once one has failed
    #[serde(alias = "fastFail")]
    pub fast_fail: bool,

    /// Default deadline in milliseconds; zero disables the deadline
    pub timeout: u64,

    /// Retry settings
    pub retries: RetryConfig,

    /// Spec file evaluated into every spec before the spec itself
    pub preload: Option<PathBuf>,

    /// Logging level
    #[serde(alias = "logLevel")]
    pub log_level: LogLevel,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            parallel: true,
            fast_fail: true,
            timeout: 5000,
            retries: RetryConfig::default(),
            preload: None,
            log_level: LogLevel::Warning,
        }
    }
}

impl RunConfig {
    /// Parse a configuration from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        info!("Loading configuration from {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config = Self::from_toml_str(&content)?;
        config.validate()?;

        debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid(
                "concurrency must be a positive integer".to_string(),
            ));
        }

        if self.retries.maximum == 0 {
            return Err(ConfigError::Invalid(
                "retries.maximum must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Number of workers actually used: `parallel = false` forces one.
    pub fn effective_concurrency(&self) -> usize {
        if self.parallel {
            self.concurrency.max(1)
        } else {
            1
        }
    }

    /// The default deadline. `Duration::ZERO` means unbounded.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }
}
