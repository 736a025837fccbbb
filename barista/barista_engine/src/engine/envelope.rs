//! Timeout and retry envelope for user callbacks.

use std::future::Future;
use std::time::Duration;

use barista_core::{RetryConfig, TestError, TestResult};
use tracing::debug;

/// Race `fut` against `limit`. A zero limit waits without a deadline.
pub async fn within<T, F>(limit: Duration, fut: F) -> Result<T, TestError>
where
    F: Future<Output = Result<T, TestError>>,
{
    if limit.is_zero() {
        return fut.await;
    }

    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(TestError::timeout(limit)),
    }
}

/// Retry settings applied to retry-capable tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Wait between attempts
    pub delay: Duration,

    /// Maximum attempts, the first one included
    pub maximum: u32,

    /// Categories that fail without another attempt
    pub non_retryable: Vec<String>,
}

impl RetryPolicy {
    pub fn is_retryable(&self, error: &TestError) -> bool {
        !self.non_retryable.iter().any(|name| error.is(name))
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        RetryPolicy {
            delay: config.delay(),
            maximum: config.maximum.max(1),
            non_retryable: config.non_retryable.clone(),
        }
    }
}

/// Result of a retried callback and how many attempts it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempted {
    pub outcome: TestResult,
    pub attempts: u32,
}

/// Invoke `attempt` until it succeeds, fails with a non-retryable category,
/// or the maximum number of attempts is reached. Each attempt runs under
/// its own `limit`.
pub async fn retry<F, Fut>(policy: &RetryPolicy, limit: Duration, mut attempt: F) -> Attempted
where
    F: FnMut() -> Fut,
    Fut: Future<Output = TestResult>,
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        let error = match within(limit, attempt()).await {
            Ok(()) => {
                return Attempted {
                    outcome: Ok(()),
                    attempts,
                }
            }
            Err(error) => error,
        };

        if !policy.is_retryable(&error) || attempts >= policy.maximum {
            return Attempted {
                outcome: Err(error),
                attempts,
            };
        }

        debug!(attempts, %error, "attempt failed, retrying");
        tokio::time::sleep(policy.delay).await;
    }
}
