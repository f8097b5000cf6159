//! Generic retry wrapper with exponential backoff
//!
//! Wraps any single async operation and retries it on transient failures.
//! The wrapper knows nothing about record kinds; classification is
//! delegated to the error type through [`Retryable`].
//!
//! ## Backoff schedule
//!
//! `delay(n) = min(initial * 2^n, max)`, then symmetric ±25% jitter to
//! spread out devices that come back online together, clamped again to
//! the ceiling. Defaults: 1s base, 30s ceiling, 3 retries — attempts at
//! roughly 0s, 1s, 2s, 4s.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{info, warn};

use shiftlog_core::config::RetryConfig;
use shiftlog_core::ports::remote_backend::RemoteError;

/// Jitter fraction applied around the exponential delay
const JITTER_FACTOR: f64 = 0.25;

// ============================================================================
// Retryable
// ============================================================================

/// Classifies an error as transient (worth retrying) or terminal
pub trait Retryable {
    /// Whether a retry has a chance of succeeding
    fn is_retryable(&self) -> bool;
}

impl Retryable for RemoteError {
    fn is_retryable(&self) -> bool {
        RemoteError::is_retryable(self)
    }
}

// ============================================================================
// RetryPolicy
// ============================================================================

/// Backoff parameters for [`with_retry`]
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt (total attempts = max_retries + 1)
    pub max_retries: u32,
    /// Base delay before the first retry
    pub initial_delay: Duration,
    /// Ceiling on any single delay, jitter included
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30000),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// Pre-jitter delay for attempt `n`: `min(initial * 2^n, max)`
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let millis = self
            .initial_delay
            .as_millis()
            .saturating_mul(1u128 << attempt.min(63));
        Duration::from_millis(millis.min(self.max_delay.as_millis()) as u64)
    }

    /// Jittered delay for attempt `n`, clamped to the ceiling
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt).as_millis() as f64;
        let jitter = base * JITTER_FACTOR * rand::thread_rng().gen_range(-1.0..=1.0);
        let delayed = (base + jitter).max(0.0) as u64;
        Duration::from_millis(delayed.min(self.max_delay.as_millis() as u64))
    }
}

// ============================================================================
// with_retry
// ============================================================================

/// Executes an async operation, retrying transient failures with backoff
///
/// Invokes `operation` at most `max_retries + 1` times. Between attempts
/// the task sleeps for the jittered backoff delay; the sleep has no side
/// effects and attempts within one call are strictly sequential. On a
/// terminal error, or once the ceiling is reached, the last error is
/// propagated — the caller decides whether that aborts anything larger.
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    operation: F,
) -> Result<T, E>
where
    E: Retryable + std::fmt::Display,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut last_error: Option<E> = None;

    for attempt in 0..=policy.max_retries {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    info!(operation = label, attempt, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => {
                if attempt < policy.max_retries && err.is_retryable() {
                    let delay = policy.backoff_delay(attempt);
                    warn!(
                        operation = label,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(err);
                } else {
                    return Err(err);
                }
            }
        }
    }

    // Only reachable when the final attempt returned a retryable error.
    Err(last_error.expect("retry loop exited without an error"))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn tight_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        }
    }

    fn server_error() -> RemoteError {
        RemoteError::Server {
            status: 500,
            message: "boom".to_string(),
        }
    }

    fn validation_error() -> RemoteError {
        RemoteError::Rejected {
            status: 400,
            message: "bad row".to_string(),
        }
    }

    #[test]
    fn test_base_delay_doubles_then_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.base_delay(0), Duration::from_millis(1000));
        assert_eq!(policy.base_delay(1), Duration::from_millis(2000));
        assert_eq!(policy.base_delay(2), Duration::from_millis(4000));
        assert_eq!(policy.base_delay(4), Duration::from_millis(16000));
        // 2^5 * 1000 = 32000 > ceiling
        assert_eq!(policy.base_delay(5), Duration::from_millis(30000));
        assert_eq!(policy.base_delay(20), Duration::from_millis(30000));
    }

    #[test]
    fn test_backoff_delay_within_jitter_band() {
        let policy = RetryPolicy::default();
        for attempt in 0..8 {
            let base = policy.base_delay(attempt).as_millis() as f64;
            for _ in 0..200 {
                let delay = policy.backoff_delay(attempt).as_millis() as f64;
                assert!(delay >= (base * 0.75).floor() - 1.0, "delay {delay} below band");
                assert!(delay <= base * 1.25 + 1.0, "delay {delay} above band");
                assert!(delay <= policy.max_delay.as_millis() as f64);
            }
        }
    }

    #[test]
    fn test_backoff_delay_never_exceeds_ceiling() {
        let policy = RetryPolicy::default();
        for _ in 0..500 {
            assert!(policy.backoff_delay(30) <= policy.max_delay);
        }
    }

    #[tokio::test]
    async fn test_retry_ceiling_is_max_retries_plus_one() {
        let calls = AtomicU32::new(0);
        let policy = tight_policy();

        let result: Result<(), RemoteError> = with_retry(&policy, "always-fails", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(server_error()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), policy.max_retries + 1);
    }

    #[tokio::test]
    async fn test_terminal_error_fails_fast() {
        let calls = AtomicU32::new(0);

        let result: Result<(), RemoteError> = with_retry(&tight_policy(), "rejected", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(validation_error()) }
        })
        .await;

        assert!(matches!(result, Err(RemoteError::Rejected { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_succeeds_within_ceiling() {
        // Fails three times with a 500, then succeeds on the fourth attempt.
        let calls = AtomicU32::new(0);

        let result: Result<u32, RemoteError> = with_retry(&tight_policy(), "flaky", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 3 {
                    Err(server_error())
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_immediate_success_single_call() {
        let calls = AtomicU32::new(0);

        let result: Result<(), RemoteError> = with_retry(&tight_policy(), "fine", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_policy_from_config() {
        let config = RetryConfig {
            max_retries: 5,
            initial_delay_ms: 250,
            max_delay_ms: 8000,
        };
        let policy = RetryPolicy::from(&config);
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.initial_delay, Duration::from_millis(250));
        assert_eq!(policy.max_delay, Duration::from_millis(8000));
    }
}
