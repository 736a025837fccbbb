//! # Barista Core
//!
//! `barista_core` provides the building blocks shared by every Barista crate:
//! the error hierarchy, node and subscription identifiers, the run
//! configuration and logging setup.
//!
//! ## Crate Structure
//!
//! - **error**: Error types for all Barista components, plus the `TestError`
//!   value returned by user callbacks
//! - **id**: Strongly-typed identifier types
//! - **utils**: Configuration, logging and timestamp helpers

pub mod error;
pub mod id;
pub mod utils;

// Re-export key types for convenience
pub use error::{
    ConfigError, Error, Result, SandboxError, SchedulerError, TestError, TestResult,
};
pub use id::{NodeId, SubscriptionId};
pub use utils::{timestamp, LogLevel, RetryConfig, RunConfig};
