use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use log::warn;
use tokio::time::sleep;

/// Bounded retry applied to ledger reads. Submissions are never retried here;
/// the drain loop re-scans instead.
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 4,
            delay: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

/// Runs `operation` until it succeeds or `policy.max_attempts` is used up,
/// returning the last error in the latter case.
pub async fn retry<F, Fut, T, E>(policy: RetryPolicy, label: &str, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts = 0;
    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                attempts += 1;
                if attempts >= max_attempts {
                    return Err(e);
                }
                warn!(
                    "{} failed (attempt {}/{}), retrying: {}",
                    label, attempts, max_attempts, e
                );
                if !policy.delay.is_zero() {
                    sleep(policy.delay).await;
                }
            }
        }
    }
}
