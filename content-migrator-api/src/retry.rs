//! Retry strategy for management API calls.

use std::future::Future;
use std::time::Duration;

use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;

use crate::error::ApiError;

/// Additional attempts after the first failure.
const RETRY_ATTEMPTS: usize = 2;

/// Base delay of the exponential backoff.
const BASE_DELAY_MS: u64 = 1000;

/// Runs `operation` with the standard retry policy: up to three attempts,
/// exponential backoff from one second with jitter, retrying only errors
/// classified retryable by [`ApiError::is_retryable`].
pub async fn with_backoff<T, F, Fut>(operation: F) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let strategy = ExponentialBackoff::from_millis(2)
        .factor(BASE_DELAY_MS / 2)
        .max_delay(Duration::from_secs(30))
        .map(jitter)
        .take(RETRY_ATTEMPTS);

    RetryIf::spawn(strategy, operation, |err: &ApiError| err.is_retryable()).await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::error::RATE_LIMIT_ERROR_CODE;

    #[tokio::test]
    async fn test_rate_limited_calls_are_retried_until_success() {
        let calls = AtomicU32::new(0);

        let result = with_backoff(|| async {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            if attempt < 2 {
                Err(ApiError::Platform {
                    code: RATE_LIMIT_ERROR_CODE,
                    message: "rate exceeded".to_string(),
                })
            } else {
                Ok(attempt)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        // Exactly one success, no further retries after it.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_errors_surface_immediately() {
        let calls = AtomicU32::new(0);

        let result: Result<(), ApiError> = with_backoff(|| async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ApiError::Platform {
                code: 219,
                message: "element is required".to_string(),
            })
        })
        .await;

        assert!(matches!(result, Err(ApiError::Platform { code: 219, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let calls = AtomicU32::new(0);

        let result: Result<(), ApiError> = with_backoff(|| async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ApiError::Server { status: 503 })
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
