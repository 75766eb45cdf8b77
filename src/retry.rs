//! Fixed-wait retry for transient request failures
//!
//! Network hiccups and 5xx responses are retried a fixed number of times
//! with a constant wait between attempts. Rate limiting is excluded:
//! hammering a throttled API only extends the penalty, so those errors
//! abort the cycle immediately.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

use crate::constants::{DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_WAIT_SECS};
use crate::error::FetchError;

/// Retry schedule for a single logical request
///
/// `attempts` counts total tries including the first; it is clamped to at
/// least one so a policy can never silently do nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    wait: Duration,
}

impl RetryPolicy {
    /// Creates a policy with the given total attempts and wait between them.
    pub fn new(attempts: u32, wait: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            wait,
        }
    }

    /// Total attempts per request, including the first.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Wait between consecutive attempts.
    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// Runs `operation` until it succeeds, exhausts the attempt budget, or
    /// fails with a non-retryable error. Returns the last error observed.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut last_error = None;

        for attempt in 1..=self.attempts {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_retryable() => {
                    tracing::warn!(attempt, error = %err, "aborting retry cycle");
                    return Err(err);
                }
                Err(err) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = self.attempts,
                        error = %err,
                        "request attempt failed"
                    );
                    last_error = Some(err);
                    if attempt < self.attempts {
                        sleep(self.wait).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            FetchError::InvalidResponse("retry policy allowed no attempts".to_string())
        }))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_RETRY_ATTEMPTS,
            Duration::from_secs(DEFAULT_RETRY_WAIT_SECS),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts(), 3);
        assert_eq!(policy.wait(), Duration::from_secs(5));
    }

    #[test]
    fn test_zero_attempts_clamps_to_one() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        assert_eq!(policy.attempts(), 1);
    }

    #[tokio::test]
    async fn test_first_attempt_success_skips_retries() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let calls = AtomicU32::new(0);

        let result = policy
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(42u64) }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried_until_success() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let calls = AtomicU32::new(0);

        let result = policy
            .run(|| {
                let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if call < 3 {
                        Err(FetchError::Api {
                            status: 503,
                            body: format!("attempt {call}"),
                        })
                    } else {
                        Ok(call)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_attempts_return_last_error() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = policy
            .run(|| {
                let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    Err(FetchError::Api {
                        status: 503,
                        body: format!("attempt {call}"),
                    })
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(FetchError::Api { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "attempt 3");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rate_limit_aborts_immediately() {
        let policy = RetryPolicy::new(5, Duration::from_millis(1));
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = policy
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(FetchError::RateLimited("HTTP 429".to_string())) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(FetchError::RateLimited(_))));
    }
}
