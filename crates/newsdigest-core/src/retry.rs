//! Fixed-attempt, fixed-delay retry for flaky network calls.
//!
//! Used for LLM inference and Telegram photo delivery. There is no backoff
//! and no jitter: every wait between attempts is the same.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// How many times to try and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }
}

/// Run `operation` until it succeeds, `should_retry` rejects the error, or
/// the attempts run out. The last error is returned on failure.
///
/// No delay follows the final attempt.
pub async fn retry<F, Fut, T, E, P>(
    policy: RetryPolicy,
    label: &str,
    should_retry: P,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    P: Fn(&E) -> bool,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts && should_retry(&e) => {
                tracing::warn!(
                    error = %e,
                    attempt = attempt,
                    max_attempts = attempts,
                    delay_ms = policy.delay.as_millis() as u64,
                    "{} failed, retrying",
                    label
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::warn!(error = %e, attempt = attempt, "{} failed, giving up", label);
                return Err(e);
            }
        }
    }
}
