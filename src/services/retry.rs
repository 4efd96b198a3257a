//! Exponential backoff for rate-limited provider calls.

use rand::Rng;
use std::{future::Future, time::Duration};

use crate::{config::Config, error::AppResult};

/// Backoff schedule: `2^attempt * base_delay + uniform(0, max_jitter)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total invocations, the first one included
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(2000),
            max_jitter: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.retry_max_attempts.max(1),
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_jitter: Duration::from_millis(config.retry_max_jitter_ms),
        }
    }

    /// Single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retrying after the zero-based `attempt` failed
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_ms = (self.base_delay.as_millis() as u64)
            .saturating_mul(2u64.saturating_pow(attempt));
        let jitter_ms = match self.max_jitter.as_millis() as u64 {
            0 => 0,
            max => rand::thread_rng().gen_range(0..max),
        };
        Duration::from_millis(base_ms.saturating_add(jitter_ms))
    }

    /// Runs `operation`, retrying transient failures.
    ///
    /// Non-transient errors, and the last transient error once attempts run
    /// out, are returned unchanged.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt + 1 < self.max_attempts => {
                    let delay = self.delay_for_attempt(attempt);
                    tracing::warn!(
                        error = %e,
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Quota exceeded, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
