// Retry policy with exponential backoff.
//
// The upstream signals throttling through free text rather than a status
// code, so classification is a substring match against a fixed phrase
// list. Keep every phrase in `RATE_LIMIT_PHRASES`; nothing else in the
// workspace should inspect error text for throttling.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::client::RawResponse;
use crate::envelope;
use crate::error::Error;

/// Lowercase phrases that mark a response or error as rate-limited.
pub const RATE_LIMIT_PHRASES: &[&str] = &[
    "hora limite",
    "hourly limit",
    "too many",
    "forbidden",
    "rate limit",
];

/// Case-insensitive match of `text` against [`RATE_LIMIT_PHRASES`].
pub fn is_rate_limit_text(text: &str) -> bool {
    let lower = text.to_lowercase();
    RATE_LIMIT_PHRASES.iter().any(|p| lower.contains(p))
}

/// Bounded exponential backoff.
///
/// The sleep after failed attempt `i` (0-indexed) is `base_delay * 2^i`;
/// there is no sleep after the final attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            base_delay: Duration::from_millis(3000),
        }
    }
}

/// Why an attempt is eligible for another try.
enum Retryable {
    RateLimited(String),
    Transient,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Delay slept after failed attempt `attempt` (0-indexed).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor)
    }

    /// Run `operation` until it succeeds, fails permanently, or attempts
    /// run out.
    ///
    /// Retried: responses with `status: false` and a rate-limit message,
    /// errors whose text carries a rate-limit phrase, and transient
    /// transport failures (timeout, connect, 5xx). Everything else,
    /// including non-throttle upstream rejections, is returned as is.
    pub async fn run<F, Fut>(&self, mut operation: F) -> Result<RawResponse, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<RawResponse, Error>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt: u32 = 0;

        loop {
            let outcome = operation().await;
            let reason = match &outcome {
                Ok(resp) if envelope::is_rate_limited(&resp.body) => Retryable::RateLimited(
                    envelope::message(&resp.body)
                        .unwrap_or("rate limited")
                        .to_owned(),
                ),
                Err(Error::RateLimited { message, .. }) => Retryable::RateLimited(message.clone()),
                Err(e) if e.is_rate_limited() => Retryable::RateLimited(e.to_string()),
                Err(e) if e.is_transient() => Retryable::Transient,
                _ => return outcome,
            };

            attempt += 1;
            if attempt >= max_attempts {
                return match reason {
                    Retryable::RateLimited(message) => {
                        debug!(attempts = attempt, "rate limit persisted through all attempts");
                        Err(Error::RateLimited {
                            message,
                            attempts: attempt,
                        })
                    }
                    Retryable::Transient => outcome,
                };
            }

            let delay = self.delay_for(attempt - 1);
            match &reason {
                Retryable::RateLimited(message) => warn!(
                    attempt,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    message = %message,
                    "upstream rate limit reached, backing off"
                ),
                Retryable::Transient => warn!(
                    attempt,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "transient upstream failure, backing off"
                ),
            }
            tokio::time::sleep(delay).await;
        }
    }
}
