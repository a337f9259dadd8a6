//! Retry with exponential backoff for flaky RPC reads
//!
//! Many chains are polled one after another, so transient RPC failures and
//! rate limits are expected. Reads are retried with a capped exponential
//! backoff plus random jitter instead of aborting the whole run.

use eyre::Result;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Backoff configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt (total attempts = max_retries + 1)
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Cap on the exponential part of the delay
    pub max_delay: Duration,
    /// Upper bound (exclusive) of the random jitter added to each delay
    pub max_jitter: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_millis(5000),
            max_delay: Duration::from_millis(10_000),
            max_jitter: Duration::from_millis(1000),
        }
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            ..Default::default()
        }
    }

    /// Deterministic part of the backoff for a given attempt (0-indexed)
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u128.saturating_pow(attempt);
        let backoff_ms = self.base_delay.as_millis().saturating_mul(factor);
        Duration::from_millis(backoff_ms.min(self.max_delay.as_millis()) as u64)
    }

    /// Backoff plus uniform jitter in `[0, max_jitter)`
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..jitter_ms)
        };
        self.backoff_for_attempt(attempt) + Duration::from_millis(jitter)
    }
}

/// Run `operation` until it succeeds or `config.max_retries` retries are used up.
///
/// On exhaustion the error from the last attempt is returned unchanged.
pub async fn retry_with_exponential_backoff<F, Fut, T>(
    config: &RetryConfig,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < config.max_retries => {
                let delay = config.delay_for_attempt(attempt);
                warn!(
                    attempt = attempt + 1,
                    max = config.max_retries,
                    ?delay,
                    error = %e,
                    "Retrying after backoff"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                debug!(attempts = attempt + 1, "Retries exhausted");
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyre::eyre;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_calculation() {
        let config = RetryConfig::new(5, Duration::from_millis(1000));

        assert_eq!(config.backoff_for_attempt(0), Duration::from_millis(1000));
        assert_eq!(config.backoff_for_attempt(1), Duration::from_millis(2000));
        assert_eq!(config.backoff_for_attempt(3), Duration::from_millis(8000));
        assert_eq!(config.backoff_for_attempt(4), Duration::from_millis(10_000)); // capped
        assert_eq!(config.backoff_for_attempt(60), Duration::from_millis(10_000));
    }

    #[test]
    fn test_jitter_bounds() {
        let config = RetryConfig::new(3, Duration::from_millis(100));
        for _ in 0..50 {
            let delay = config.delay_for_attempt(0);
            assert!(delay >= Duration::from_millis(100));
            assert!(delay < Duration::from_millis(1100));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_operation_runs_max_retries_plus_one() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig::new(2, Duration::from_millis(10));

        let result: Result<()> = retry_with_exponential_backoff(&config, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { Err(eyre!("boom {}", n)) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(result.unwrap_err().to_string(), "boom 2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig::new(5, Duration::from_millis(10));

        let result = retry_with_exponential_backoff(&config, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(eyre!("rate limited"))
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_zero_retries_calls_once() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig::new(0, Duration::from_millis(10));
        let result: Result<()> = retry_with_exponential_backoff(&config, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(eyre!("nope")) }
        })
        .await;
        tokio_test::assert_err!(result);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
