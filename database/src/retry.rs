use std::time::Duration;
use tokio::time::sleep;
use tracing;

/// Errors that know whether another attempt is worthwhile.
pub trait Retryable {
    fn is_retryable(&self) -> bool;

    /// Called with the last error once every attempt has failed.
    fn exhausted(self, _attempts: usize) -> Self
    where
        Self: Sized,
    {
        self
    }
}

impl Retryable for crate::DatabaseError {
    fn is_retryable(&self) -> bool {
        crate::DatabaseError::is_retryable(self)
    }

    fn exhausted(self, attempts: usize) -> Self {
        crate::DatabaseError::RetryExhausted(format!("gave up after {attempts} attempts: {self}"))
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// `max_retries` extra attempts are used up. The delay doubles after each failure.
pub async fn retry_with_backoff<F, T, E>(
    mut operation: F,
    max_retries: usize,
    initial_delay: Duration,
) -> Result<T, E>
where
    F: FnMut() -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<T, E>> + Send>>,
    E: std::fmt::Display + Retryable,
{
    let mut delay = initial_delay;
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < max_retries && e.is_retryable() => {
                tracing::warn!(
                    "Attempt {} failed: {}. Retrying in {:?}...",
                    attempt + 1,
                    e,
                    delay
                );
                sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(e) if e.is_retryable() => {
                tracing::warn!("Giving up after {} attempts: {}", attempt + 1, e);
                return Err(e.exhausted(attempt + 1));
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DatabaseError;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    fn counting_operation(
        calls: Arc<AtomicUsize>,
        fail_times: usize,
        make_err: fn() -> DatabaseError,
    ) -> impl FnMut() -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<usize, DatabaseError>> + Send>>
    {
        move || {
            let calls = calls.clone();
            Box::pin(async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < fail_times {
                    Err(make_err())
                } else {
                    Ok(n)
                }
            })
        }
    }

    #[tokio::test]
    async fn test_retries_conflicts_until_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let op = counting_operation(calls.clone(), 2, || DatabaseError::Conflict("row".into()));
        let result = retry_with_backoff(op, 3, Duration::from_millis(1)).await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = Arc::new(AtomicUsize::new(0));
        let op = counting_operation(calls.clone(), 10, || DatabaseError::Conflict("row".into()));
        let result = retry_with_backoff(op, 2, Duration::from_millis(1)).await;
        assert!(matches!(result, Err(DatabaseError::RetryExhausted(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_busy_database_is_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let op = counting_operation(calls.clone(), 1, || DatabaseError::Busy("locked".into()));
        let result = retry_with_backoff(op, 3, Duration::from_millis(1)).await;
        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_does_not_retry_permanent_errors() {
        let calls = Arc::new(AtomicUsize::new(0));
        let op = counting_operation(calls.clone(), 10, || DatabaseError::Query("syntax".into()));
        let result = retry_with_backoff(op, 5, Duration::from_millis(1)).await;
        assert!(matches!(result, Err(DatabaseError::Query(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
