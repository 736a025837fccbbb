//! Error types for the Barista test runner.
//!
//! Two families of errors live here. The first is the usual library
//! hierarchy: each subsystem has its own error enum, and the root `Error`
//! can wrap any of them for uniform handling at the top level.
//!
//! The second is `TestError`, the value a test, hook or generator callback
//! fails with. It is not a library failure: it is recorded on the result
//! tree and carries a category name that the retry envelope inspects.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Well-known error category names.
pub mod category {
    /// An expectation did not hold.
    pub const ASSERTION: &str = "AssertionError";
    /// A callback did not settle before its deadline.
    pub const TIMEOUT: &str = "TimeoutError";
    /// A required file or module could not be found.
    pub const RESOLUTION: &str = "ResolutionError";
    /// A name did not resolve to anything (programmer mistake).
    pub const REFERENCE: &str = "ReferenceError";
    /// A value was used in a way its type does not allow (programmer mistake).
    pub const TYPE: &str = "TypeError";
    /// Any other failure raised by user code.
    pub const RUNTIME: &str = "RuntimeError";
}

/// Root error type for Barista.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Sandbox (spec evaluation) errors
    #[error("Sandbox error: {0}")]
    Sandbox(#[from] SandboxError),

    /// Scheduler errors
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Logging setup errors
    #[error("Logging error: {0}")]
    Logging(String),
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to load configuration from {path}: {reason}")]
    LoadFailed {
        /// Path of the configuration file
        path: PathBuf,
        /// Underlying failure
        reason: String,
    },

    /// The configuration file is not valid TOML or has the wrong shape
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised by a sandbox collaborator while evaluating a spec file.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// The spec file (or a required module) could not be read
    #[error("Failed to read {path}: {reason}")]
    Read {
        /// Path that was being read
        path: PathBuf,
        /// Underlying failure
        reason: String,
    },

    /// The spec file could not be parsed
    #[error("Failed to parse {path}: {reason}")]
    Parse {
        /// Path that was being parsed
        path: PathBuf,
        /// Underlying failure
        reason: String,
    },

    /// No candidate file exists for a specifier
    #[error("No such file {0}")]
    Resolution(String),

    /// Evaluation failed for another reason
    #[error("Evaluation failed: {0}")]
    Evaluation(String),
}

impl SandboxError {
    /// The error category used when this error is recorded on a node.
    pub fn category(&self) -> &'static str {
        match self {
            SandboxError::Resolution(_) => category::RESOLUTION,
            SandboxError::Parse { .. } => category::TYPE,
            SandboxError::Read { .. } | SandboxError::Evaluation(_) => category::RUNTIME,
        }
    }
}

/// Errors raised by the spec scheduler itself.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The scheduler was configured with invalid settings
    #[error("Invalid scheduler configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

/// Result type used throughout Barista.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure value produced by a test, hook or generator callback.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{category}: {message}")]
pub struct TestError {
    /// Category name, compared against the non-retryable set
    pub category: String,

    /// Human-readable message
    pub message: String,
}

/// Outcome of a single callback invocation.
pub type TestResult = std::result::Result<(), TestError>;

impl TestError {
    /// Create an error with an explicit category.
    pub fn new(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            message: message.into(),
        }
    }

    /// An expectation did not hold.
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::new(category::ASSERTION, message)
    }

    /// Generic runtime failure.
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(category::RUNTIME, message)
    }

    /// A name did not resolve.
    pub fn reference(message: impl Into<String>) -> Self {
        Self::new(category::REFERENCE, message)
    }

    /// A value was misused.
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(category::TYPE, message)
    }

    /// A required file or module was not found.
    pub fn resolution(message: impl Into<String>) -> Self {
        Self::new(category::RESOLUTION, message)
    }

    /// A callback exceeded its deadline.
    pub fn timeout(limit: Duration) -> Self {
        Self::new(
            category::TIMEOUT,
            format!(
                "Async callback not called within timeout of {}ms",
                limit.as_millis()
            ),
        )
    }

    /// Check whether this error belongs to the given category.
    pub fn is(&self, category: &str) -> bool {
        self.category == category
    }
}

impl From<anyhow::Error> for TestError {
    fn from(error: anyhow::Error) -> Self {
        TestError::runtime(format!("{:#}", error))
    }
}

impl From<std::io::Error> for TestError {
    fn from(error: std::io::Error) -> Self {
        TestError::runtime(error.to_string())
    }
}

impl From<SandboxError> for TestError {
    fn from(error: SandboxError) -> Self {
        TestError::new(error.category(), error.to_string())
    }
}
