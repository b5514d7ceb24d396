use crate::{Result, ScrapeError};
use std::future::Future;
use std::time::Duration;

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Base delay for exponential backoff (in milliseconds)
    pub base_delay_ms: u64,
    /// Maximum delay cap (in milliseconds)
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `retry` (0-based) after `error`.
    ///
    /// Rate limits wait at least as long as the site asked for.
    pub fn delay_for(&self, retry: u32, error: &ScrapeError) -> Duration {
        let backoff = self
            .base_delay_ms
            .saturating_mul(2_u64.saturating_pow(retry));
        let wanted = match error {
            ScrapeError::RateLimit { retry_after } => backoff.max(retry_after.saturating_mul(1000)),
            _ => backoff,
        };
        Duration::from_millis(wanted.min(self.max_delay_ms))
    }
}

/// Result of a retry operation with context
#[derive(Debug)]
pub struct RetryResult<T> {
    /// The successful result
    pub result: T,
    /// Number of retry attempts made
    pub attempts_made: u32,
    /// Total time spent waiting between attempts
    pub total_retry_time: Duration,
}

/// Execute an async operation, retrying retryable failures with
/// exponential backoff.
///
/// Errors for which [`ScrapeError::is_retryable`] is false are returned
/// immediately. After `max_retries` retries the last error is returned.
///
/// # Arguments
/// * `config` - Retry configuration
/// * `operation_name` - Name of the operation for logging
/// * `operation` - Async function that returns a Result
/// * `on_retry` - Callback invoked before each wait with the delay and error
pub async fn retry_with_backoff<T, F, Fut, OnRetry>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
    mut on_retry: OnRetry,
) -> Result<RetryResult<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    OnRetry: FnMut(Duration, &ScrapeError),
{
    let mut retries = 0;
    let mut total_retry_time = Duration::ZERO;

    loop {
        match operation().await {
            Ok(result) => {
                return Ok(RetryResult {
                    result,
                    attempts_made: retries,
                    total_retry_time,
                });
            }
            Err(error) if error.is_retryable() => {
                if retries >= config.max_retries {
                    log::warn!(
                        "Max retries ({}) exceeded for {}: {}",
                        config.max_retries,
                        operation_name,
                        error
                    );
                    return Err(error);
                }

                let delay = config.delay_for(retries, &error);
                log::info!(
                    "{} failed ({}). Waiting {}ms before retry {} of {}",
                    operation_name,
                    error,
                    delay.as_millis(),
                    retries + 1,
                    config.max_retries
                );
                on_retry(delay, &error);

                tokio::time::sleep(delay).await;
                retries += 1;
                total_retry_time += delay;
            }
            Err(other_error) => {
                return Err(other_error);
            }
        }
    }
}

/// Simplified retry function that only logs retries
pub async fn retry_operation<T, F, Fut>(
    config: &RetryConfig,
    operation_name: &str,
    operation: F,
) -> Result<RetryResult<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    retry_with_backoff(config, operation_name, operation, |delay, error| {
        log::debug!("Retrying {operation_name} in {}ms after: {error}", delay.as_millis());
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast() -> RetryConfig {
        RetryConfig {
            max_retries: 2,
            base_delay_ms: 1,
            max_delay_ms: 10,
        }
    }

    #[tokio::test]
    async fn test_successful_operation() {
        let result = retry_operation(&fast(), "test", || async { Ok::<i32, ScrapeError>(42) }).await;

        let retry_result = result.unwrap();
        assert_eq!(retry_result.result, 42);
        assert_eq!(retry_result.attempts_made, 0);
        assert_eq!(retry_result.total_retry_time, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_retry_on_http_error() {
        let call_count = Arc::new(AtomicU32::new(0));
        let call_count_clone = call_count.clone();

        let result = retry_operation(&fast(), "test", move || {
            let count = call_count_clone.fetch_add(1, Ordering::SeqCst);
            async move {
                if count < 2 {
                    Err(ScrapeError::Http("connection reset".to_string()))
                } else {
                    Ok::<i32, ScrapeError>(42)
                }
            }
        })
        .await;

        let retry_result = result.unwrap();
        assert_eq!(retry_result.result, 42);
        assert_eq!(retry_result.attempts_made, 2);
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_max_retries_exceeded() {
        let call_count = Arc::new(AtomicU32::new(0));
        let call_count_clone = call_count.clone();

        let result = retry_operation(&fast(), "test", move || {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
            async { Err::<i32, ScrapeError>(ScrapeError::RateLimit { retry_after: 0 }) }
        })
        .await;

        match result.unwrap_err() {
            ScrapeError::RateLimit { .. } => {}
            other => panic!("Expected rate limit error, got: {other:?}"),
        }
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_error_is_immediate() {
        let call_count = Arc::new(AtomicU32::new(0));
        let call_count_clone = call_count.clone();

        let result = retry_operation(&fast(), "test", move || {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
            async { Err::<i32, ScrapeError>(ScrapeError::InvalidRequest("bad".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(ScrapeError::InvalidRequest(_))));
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_delay_growth_and_cap() {
        let config = RetryConfig::default();
        let http = ScrapeError::Http("x".to_string());
        assert_eq!(config.delay_for(0, &http), Duration::from_millis(1000));
        assert_eq!(config.delay_for(2, &http), Duration::from_millis(4000));
        assert_eq!(config.delay_for(10, &http), Duration::from_millis(30_000));

        let limited = ScrapeError::RateLimit { retry_after: 5 };
        assert_eq!(config.delay_for(0, &limited), Duration::from_secs(5));
    }
}
