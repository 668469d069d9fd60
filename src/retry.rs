use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::error::AppResult;

/// Backoff settings for a single upstream call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Additional attempts after the first one fails.
    pub retries: u32,
    /// Delay before the first retry; doubles on each subsequent one.
    pub min_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            min_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    fn delay_for(&self, attempt: u32) -> Duration {
        self.min_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Run one upstream call, retrying with exponential backoff. Every call site
/// gets its own budget: a page fetch that succeeds resets nothing for the
/// next page, and an exhausted budget propagates the final error.
pub async fn retry_with_backoff<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                warn!("{} failed (attempt {}): {}", label, attempt + 1, error);
                if attempt >= policy.retries {
                    return Err(error);
                }
                tokio::time::sleep(policy.delay_for(attempt)).await;
                attempt += 1;
            }
        }
    }
}
