//! Utility modules for configuration, logging and time.

pub mod config;
pub mod logging;

pub use config::{RetryConfig, RunConfig};
pub use logging::{init_logging, LogLevel};

/// Milliseconds since the Unix epoch.
pub fn timestamp() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
