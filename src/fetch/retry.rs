use crate::fetch::FetchError;
use std::future::Future;
use std::time::Duration;

/// Fixed-delay retry policy
///
/// A URL gets `retries + 1` attempts in total, `delay` apart. The first
/// success ends the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    /// Total number of attempts allowed
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Runs `attempt` until it succeeds or the attempts are used up
    ///
    /// The closure receives the 1-based attempt number. Retries are logged at
    /// `warn`, the final failure at `error`.
    pub async fn run<T, F, Fut>(&self, url: &str, mut attempt: F) -> Result<T, FetchError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let max_attempts = self.max_attempts();
        let mut number = 1;

        loop {
            match attempt(number).await {
                Ok(value) => return Ok(value),
                Err(e) if number < max_attempts => {
                    tracing::warn!(
                        "Fetch of {} failed ({}), retry {}/{} in {:?}",
                        url,
                        e,
                        number,
                        self.retries,
                        self.delay
                    );
                    tokio::time::sleep(self.delay).await;
                    number += 1;
                }
                Err(e) => {
                    tracing::error!("Giving up on {} after {} attempts: {}", url, number, e);
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(retries: u32) -> RetryPolicy {
        RetryPolicy {
            retries,
            delay: Duration::from_secs(5),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt() {
        let calls = AtomicU32::new(0);
        let result = policy(2)
            .run("https://shop.com", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, FetchError>(7) }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_after_first_success() {
        let calls = AtomicU32::new(0);
        let start = tokio::time::Instant::now();
        let result = policy(3)
            .run("https://shop.com", |n| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 3 {
                        Err(FetchError::Status(503))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(start.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = policy(2)
            .run("https://shop.com", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(FetchError::Timeout) }
            })
            .await;

        assert!(matches!(result, Err(FetchError::Timeout)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_is_single_attempt() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = policy(0)
            .run("https://shop.com", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(FetchError::Network("refused".to_string())) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
