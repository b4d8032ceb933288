use std::{future::Future, time::Duration};

use rand::Rng;

use crate::error::SourceResult;

/// Exponential backoff shared by every source's fetch primitive
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    /// Scale each delay by a random factor in 0.75..=1.25
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(8000),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes a single attempt
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Delay to wait after the failed attempt number `attempt` (zero based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base = self.initial_delay.as_secs_f64() * self.multiplier.max(1.0).powi(exponent);
        let capped = base.min(self.max_delay.as_secs_f64());

        let delay = if self.jitter {
            capped * rand::rng().random_range(0.75..=1.25)
        } else {
            capped
        };

        Duration::from_secs_f64(delay.max(0.0))
    }

    /// Runs `op` until it succeeds, fails with a non retryable error, or
    /// attempts run out. `what` names the operation in logs.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> SourceResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = SourceResult<T>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt + 1 < attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        "{what} failed: {e}, attempt {}/{attempts}, retrying in {delay:?}",
                        attempt + 1
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::error::SourceError;

    fn quick() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            multiplier: 2.0,
            jitter: false,
        }
    }

    #[test]
    fn test_delay_grows_and_caps() {
        let policy = RetryPolicy {
            jitter: false,
            ..Default::default()
        };

        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(10), Duration::from_millis(8000));
    }

    #[test]
    fn test_jitter_stays_in_band() {
        let policy = RetryPolicy::default();
        for _ in 0..50 {
            let delay = policy.delay_for(1);
            assert!(delay >= Duration::from_millis(750));
            assert!(delay <= Duration::from_millis(1250));
        }
    }

    #[tokio::test]
    async fn test_retries_unavailable_until_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = quick()
            .run("flaky", move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(SourceError::Unavailable("503".to_string()))
                } else {
                    Ok(42)
                }
            })
            .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: SourceResult<()> = quick()
            .run("down", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(SourceError::Unavailable("timeout".to_string()))
            })
            .await;

        assert!(matches!(result, Err(SourceError::Unavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: SourceResult<()> = quick()
            .run("missing", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(SourceError::NotFound("no such title".to_string()))
            })
            .await;

        assert!(matches!(result, Err(SourceError::NotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
