//! Caller-side retry for page fetches, with exponential backoff.
//!
//! [`RetryFetch`] decorates any [`PageFetcher`] and retries transient failures
//! (timeouts, network errors, 5xx statuses). Permanent failures such as a 404
//! or an empty body are returned immediately.
//!
//! # Retry Strategy
//!
//! The delay between attempts follows this formula:
//! ```text
//! delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
//! ```

use crate::error::FetchError;
use crate::fetcher::{PageFetcher, RawPage};
use async_trait::async_trait;
use rand::{Rng, rng};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, instrument, warn};
use url::Url;

/// Wrapper that adds backoff retries to any [`PageFetcher`].
pub struct RetryFetch<T> {
    /// The fetcher doing the actual requests.
    inner: T,
    /// Retries after the first attempt; zero disables retrying.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: Duration,
    /// Maximum delay cap to prevent excessive waiting.
    max_delay: Duration,
}

impl<T> RetryFetch<T>
where
    T: PageFetcher,
{
    /// Wrap `inner`, retrying up to `max_retries` times.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let fetcher = RetryFetch::new(HttpFetcher::new(DEFAULT_USER_AGENT)?, 2, Duration::from_millis(500));
    /// ```
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(10),
        }
    }

    fn backoff(&self, attempt: usize) -> Duration {
        let shift = (attempt - 1).min(16) as u32;
        let mut delay = self.base_delay.saturating_mul(1 << shift);
        if delay > self.max_delay {
            delay = self.max_delay;
        }
        let jitter_ms: u64 = rng().random_range(0..=250);
        delay + Duration::from_millis(jitter_ms)
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

#[async_trait]
impl<T> PageFetcher for RetryFetch<T>
where
    T: PageFetcher,
{
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn fetch(&self, url: &Url, timeout: Duration) -> Result<RawPage, FetchError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.fetch(url, timeout).await {
                Ok(page) => return Ok(page),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    attempt += 1;
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        if self.max_retries > 0 {
                            error!(
                                attempt,
                                max = self.max_retries,
                                elapsed_ms_total = total_dt.as_millis() as u64,
                                error = %e,
                                "fetch exhausted retries"
                            );
                        }
                        return Err(e);
                    }

                    let delay = self.backoff(attempt);
                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_total = total_dt.as_millis() as u64,
                        ?delay,
                        error = %e,
                        "fetch attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Replays a fixed sequence of outcomes, one per call.
    struct Scripted {
        outcomes: Mutex<Vec<Result<RawPage, FetchError>>>,
        calls: Mutex<usize>,
    }

    impl Scripted {
        fn new(mut outcomes: Vec<Result<RawPage, FetchError>>) -> Self {
            outcomes.reverse();
            Self {
                outcomes: Mutex::new(outcomes),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl PageFetcher for Scripted {
        async fn fetch(&self, _url: &Url, _timeout: Duration) -> Result<RawPage, FetchError> {
            *self.calls.lock().unwrap() += 1;
            self.outcomes
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(FetchError::Network("script exhausted".into())))
        }
    }

    fn page() -> RawPage {
        RawPage {
            url: Url::parse("https://example.com/").unwrap(),
            status: 200,
            body: "<p>ok</p>".to_string(),
        }
    }

    fn target() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let inner = Scripted::new(vec![
            Err(FetchError::Timeout),
            Err(FetchError::HttpStatus(503)),
            Ok(page()),
        ]);
        let retry = RetryFetch::new(inner, 3, Duration::from_millis(1));

        let result = retry.fetch(&target(), Duration::from_secs(1)).await;
        assert_eq!(result.unwrap(), page());
        assert_eq!(retry.inner.calls(), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let inner = Scripted::new(vec![Err(FetchError::HttpStatus(404)), Ok(page())]);
        let retry = RetryFetch::new(inner, 3, Duration::from_millis(1));

        let err = retry
            .fetch(&target(), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::HttpStatus(404));
        assert_eq!(retry.inner.calls(), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let inner = Scripted::new(vec![
            Err(FetchError::Timeout),
            Err(FetchError::Timeout),
            Err(FetchError::Timeout),
            Ok(page()),
        ]);
        let retry = RetryFetch::new(inner, 2, Duration::from_millis(1));

        let err = retry
            .fetch(&target(), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::Timeout);
        assert_eq!(retry.inner.calls(), 3);
    }

    #[tokio::test]
    async fn test_zero_retries_is_a_single_attempt() {
        let inner = Scripted::new(vec![Err(FetchError::Timeout), Ok(page())]);
        let retry = RetryFetch::new(inner, 0, Duration::from_millis(1));

        assert!(retry.fetch(&target(), Duration::from_secs(1)).await.is_err());
        assert_eq!(retry.inner.calls(), 1);
    }

    #[test]
    fn test_backoff_is_capped() {
        let retry = RetryFetch::new(Scripted::new(vec![]), 20, Duration::from_secs(1));
        let first = retry.backoff(1);
        assert!(first >= Duration::from_secs(1) && first <= Duration::from_millis(1250));
        let late = retry.backoff(12);
        assert!(late <= Duration::from_millis(10_250));
    }
}
