//! Timeout and cancellation helpers
//!
//! Used by the streaming session to bound individual stream reads (the
//! configurable idle limit) and to tear the session down when the caller
//! abandons it.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

/// The wrapped operation did not finish within its limit.
#[derive(Debug, Error)]
#[error("operation timed out after {limit:?}")]
pub struct TimeoutError {
    pub limit: Duration,
}

/// The wrapped operation was cancelled.
#[derive(Debug, Error)]
#[error("operation aborted")]
pub struct AbortError;

/// Run `future` under an optional time limit. `None` runs it unbounded.
pub async fn with_idle_limit<T, F>(future: F, limit: Option<Duration>) -> Result<T, TimeoutError>
where
    F: Future<Output = T>,
{
    match limit {
        Some(limit) => timeout(limit, future)
            .await
            .map_err(|_| TimeoutError { limit }),
        None => Ok(future.await),
    }
}

/// Run `future` until it completes or `token` is cancelled, whichever
/// comes first.
pub async fn with_cancel<T, F>(future: F, token: &CancellationToken) -> Result<T, AbortError>
where
    F: Future<Output = T>,
{
    tokio::select! {
        result = future => Ok(result),
        _ = token.cancelled() => Err(AbortError),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_idle_limit_passes_fast_future() {
        let result = with_idle_limit(async { 42 }, Some(Duration::from_secs(1))).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_idle_limit_none_is_unbounded() {
        let result = with_idle_limit(async { "ok" }, None).await;
        assert_eq!(result.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_idle_limit_expires() {
        let slow = tokio::time::sleep(Duration::from_secs(60));
        let result = with_idle_limit(slow, Some(Duration::from_millis(10))).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_cancel_interrupts() {
        let token = CancellationToken::new();
        token.cancel();
        let slow = tokio::time::sleep(Duration::from_secs(60));
        let result = with_cancel(slow, &token).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_cancel_lets_completion_through() {
        let token = CancellationToken::new();
        let result = with_cancel(async { 7 }, &token).await;
        assert_eq!(result.unwrap(), 7);
    }
}
