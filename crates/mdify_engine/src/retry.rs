//! Bounded retry with exponential backoff around a single-attempt [`Fetcher`].
//!
//! Policy, per attempt result:
//! - success: returned immediately
//! - HTTP 404: `NotFound`, no further attempts
//! - invalid URL or oversize body: definitive, no further attempts
//! - any other status or transport failure: recorded, retried after backoff
//!
//! Attempt `k` (k ≥ 1) waits `backoff_base * 2^(k-1)` first, so three retries
//! with a one second base sleep 1s, 2s and 4s.

use std::time::Duration;

use mdify_core::JobId;
use mdify_logging::{mdify_debug, mdify_info};

use crate::fetch::{Fetcher, ProgressSink};
use crate::types::{EngineEvent, FailureKind, FetchError, FetchOutput, ScrapeError};

/// Delay primitive, injected so tests can observe backoff without waiting.
#[async_trait::async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait::async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before attempt `attempt` (0-based). Attempt 0 never waits.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 2u32.checked_pow(attempt - 1).unwrap_or(u32::MAX);
        self.backoff_base.saturating_mul(factor)
    }
}

pub struct RetryingFetcher<F, S> {
    fetcher: F,
    sleeper: S,
    policy: RetryPolicy,
}

impl<F: Fetcher, S: Sleeper> RetryingFetcher<F, S> {
    pub fn new(fetcher: F, sleeper: S, policy: RetryPolicy) -> Self {
        Self {
            fetcher,
            sleeper,
            policy,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub async fn fetch_with_retries(
        &self,
        job_id: JobId,
        url: &str,
        sink: &dyn ProgressSink,
    ) -> Result<FetchOutput, ScrapeError> {
        let max_attempts = self.policy.max_attempts();
        let mut last_error = None;

        for attempt in 0..max_attempts {
            if attempt > 0 {
                let delay = self.policy.delay_for_attempt(attempt);
                mdify_info!(
                    "Retrying {} in {:?} (attempt {}/{})",
                    url,
                    delay,
                    attempt + 1,
                    max_attempts
                );
                sink.emit(EngineEvent::RetryScheduled {
                    job_id,
                    url: url.to_string(),
                    attempt: attempt + 1,
                    max_attempts,
                    delay,
                });
                self.sleeper.sleep(delay).await;
            }

            let err = match self.fetcher.fetch(job_id, url, sink).await {
                Ok(output) => return Ok(output),
                Err(err) => err,
            };
            match err.kind {
                FailureKind::HttpStatus(404) => {
                    return Err(ScrapeError::NotFound {
                        url: url.to_string(),
                    })
                }
                FailureKind::InvalidUrl => {
                    return Err(ScrapeError::InvalidIdentifier {
                        identifier: url.to_string(),
                        reason: err.message,
                    })
                }
                FailureKind::TooLarge { .. } => return Err(ScrapeError::Rejected(err)),
                _ => {
                    mdify_debug!("Attempt {} for {} failed: {}", attempt + 1, url, err);
                    last_error = Some(err);
                }
            }
        }

        Err(ScrapeError::ExhaustedRetries {
            attempts: max_attempts,
            last: last_error
                .unwrap_or_else(|| FetchError::new(FailureKind::Network, "no attempt was made")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::RetryPolicy;
    use std::time::Duration;

    #[test]
    fn backoff_doubles_from_the_base() {
        let policy = RetryPolicy::new(4);
        let delays: Vec<_> = (0..=4).map(|a| policy.delay_for_attempt(a)).collect();
        assert_eq!(
            delays,
            vec![
                Duration::ZERO,
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8),
            ]
        );
    }

    #[test]
    fn huge_attempt_numbers_saturate_instead_of_overflowing() {
        let policy = RetryPolicy::new(u32::MAX).with_backoff_base(Duration::from_secs(1));
        assert_eq!(policy.max_attempts(), u32::MAX);
        assert!(policy.delay_for_attempt(200) >= Duration::from_secs(u64::from(u32::MAX)));
    }

    #[test]
    fn zero_retries_means_a_single_attempt() {
        assert_eq!(RetryPolicy::new(0).max_attempts(), 1);
    }
}
