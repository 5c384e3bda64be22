//! Retry with exponential backoff
//!
//! Wraps a fallible async operation and re-runs it until it succeeds or the
//! attempt budget is spent. Every failure is retried the same way; callers are
//! expected to pass read-only operations that are safe to repeat.

use serde_json::json;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::logging::QueryLogger;

/// Longest wait between two attempts
pub const MAX_DELAY: Duration = Duration::from_secs(3600);

/// How many times to try an operation and how long to wait in between
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first (at least 1)
    pub max_attempts: u32,
    /// Wait before the second attempt
    pub initial_delay: Duration,
    /// Factor applied to the wait after each further failure
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            ..Default::default()
        }
    }

    /// Policy that runs the operation once and never waits
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    /// Attempt budget with the lower bound applied
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Wait before the given 1-based attempt
    ///
    /// Zero for the first attempt, then `initial_delay * multiplier^(attempt - 2)`:
    /// with the defaults that is 1s, 2s, 4s, ... capped at [`MAX_DELAY`].
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(attempt - 2).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        match Duration::try_from_secs_f64(secs) {
            Ok(delay) => delay.min(MAX_DELAY),
            // Overflow and +inf saturate; negative and NaN products mean no wait
            Err(_) if secs > 0.0 => MAX_DELAY,
            Err(_) => Duration::ZERO,
        }
    }
}

/// Runs `operation` under `policy`, logging each failure to `logger`
///
/// Non-final failures are logged as warnings and followed by a backoff sleep.
/// The final failure is logged as an error and returned unchanged.
pub async fn with_retry<F, Fut, T, E>(
    policy: &RetryPolicy,
    logger: &dyn QueryLogger,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.attempts();
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= max_attempts {
                    logger.error(
                        &format!("Failed after {} attempts", max_attempts),
                        &json!({ "attempts": max_attempts, "error": err.to_string() }),
                    );
                    return Err(err);
                }

                let delay = policy.delay_before(attempt + 1);
                logger.warn(
                    &format!(
                        "Attempt {} failed, retrying in {}ms",
                        attempt,
                        delay.as_millis()
                    ),
                    &json!({
                        "attempt": attempt,
                        "error": err.to_string(),
                        "delay_ms": delay.as_millis() as u64,
                    }),
                );

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
