//! Bounded retry with exponential backoff
//!
//! The delay before retry `i + 1` is `base_delay * 2^i`. Backoff is derived from the
//! attempt number alone, so a single `RetryPolicy` can be shared freely between tasks.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

/// Retry parameters for fallible async operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Create a policy; at least one attempt is always made
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Maximum number of attempts
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before the first retry
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Delay between attempt `attempt` and `attempt + 1`, counting from zero
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Run `op`, retrying every failure
    pub async fn run<T, E, F, Fut>(&self, op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.run_when(op, |_| true).await
    }

    /// Run `op`, retrying only failures for which `retryable` returns true.
    ///
    /// The last error is returned once the attempts are exhausted or a
    /// non-retryable error is seen.
    pub async fn run_when<T, E, F, Fut, P>(&self, mut op: F, retryable: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        P: Fn(&E) -> bool,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if attempt + 1 >= self.max_attempts {
                        debug!("Giving up after {} attempts: {}", attempt + 1, e);
                        return Err(e);
                    }
                    if !retryable(&e) {
                        return Err(e);
                    }
                    let delay = self.delay_for(attempt);
                    warn!(
                        "Request failed, retrying in {:?} (attempt {}/{}): {}",
                        delay,
                        attempt + 1,
                        self.max_attempts,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
