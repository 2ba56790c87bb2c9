//! Bounded retry loop shared by page fetches and the login handshake.

use std::future::Future;
use std::time::Duration;

use crate::error::{FetchError, FetchErrorKind};
use crate::models::{AuthConfig, Backoff, ScrapingConfig};

/// How many times to try and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            backoff,
        }
    }

    /// Policy for listing page fetches.
    pub fn for_pages(config: &ScrapingConfig) -> Self {
        Self::new(
            config.retry_attempts,
            Duration::from_millis(config.retry_delay_ms),
            config.backoff,
        )
    }

    /// Policy for login requests.
    pub fn for_login(config: &AuthConfig) -> Self {
        Self::new(
            config.retry_attempts,
            Duration::from_millis(config.retry_delay_ms),
            Backoff::Fixed,
        )
    }

    /// Delay to wait after `failed_attempts` consecutive failures.
    pub fn delay_after(&self, failed_attempts: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Linear => self.delay.saturating_mul(failed_attempts.max(1)),
        }
    }
}

/// Failure of a single attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    /// Timeout, connection error or 5xx; worth another try
    Transient(String),
    /// Retrying cannot help
    Permanent { kind: FetchErrorKind, message: String },
}

/// Bookkeeping for one attempt sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryState {
    pub attempt: u32,
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryState {
    fn new(policy: &RetryPolicy) -> Self {
        Self {
            attempt: 0,
            max_attempts: policy.max_attempts,
            delay: Duration::ZERO,
        }
    }

    fn exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }
}

/// Run `attempt` until it succeeds, fails permanently or the policy runs out.
///
/// The closure receives the 1-based attempt number. Exhaustion yields a
/// [`FetchError`] of kind [`FetchErrorKind::NetworkFailure`] carrying the
/// number of attempts made and the last error message.
pub async fn run<T, F, Fut>(policy: &RetryPolicy, url: &str, mut attempt: F) -> Result<T, FetchError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, AttemptError>>,
{
    let mut state = RetryState::new(policy);

    loop {
        state.attempt += 1;
        log::debug!(
            "Requesting {} (attempt {}/{})",
            url,
            state.attempt,
            state.max_attempts
        );

        let message = match attempt(state.attempt).await {
            Ok(value) => return Ok(value),
            Err(AttemptError::Permanent { kind, message }) => {
                log::error!("Request to {} failed permanently: {}", url, message);
                return Err(FetchError {
                    kind,
                    url: url.to_string(),
                    attempts: state.attempt,
                    message,
                });
            }
            Err(AttemptError::Transient(message)) => message,
        };

        if state.exhausted() {
            log::error!(
                "Giving up on {} after {} attempt(s): {}",
                url,
                state.attempt,
                message
            );
            return Err(FetchError {
                kind: FetchErrorKind::NetworkFailure,
                url: url.to_string(),
                attempts: state.attempt,
                message,
            });
        }

        state.delay = policy.delay_after(state.attempt);
        log::warn!(
            "Attempt {}/{} for {} failed: {}. Retrying in {:?}",
            state.attempt,
            state.max_attempts,
            url,
            message,
            state.delay
        );
        if !state.delay.is_zero() {
            tokio::time::sleep(state.delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    const URL: &str = "https://quotes.toscrape.com/page/2/";

    fn policy(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::ZERO, Backoff::Fixed)
    }

    #[tokio::test]
    async fn succeeds_on_third_attempt() {
        let calls = AtomicU32::new(0);
        let result = run(&policy(3), URL, |attempt| {
            let calls = &calls;
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                if attempt < 3 {
                    Err(AttemptError::Transient("connection reset".into()))
                } else {
                    Ok("page body")
                }
            }
        })
        .await;

        assert_eq!(result, Ok("page body"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhaustion_reports_attempt_count() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = run(&policy(3), URL, |_| {
            let calls = &calls;
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AttemptError::Transient("operation timed out".into()))
            }
        })
        .await;

        let error = result.unwrap_err();
        assert_eq!(error.kind, FetchErrorKind::NetworkFailure);
        assert_eq!(error.attempts, 3);
        assert_eq!(error.url, URL);
        assert_eq!(error.message, "operation timed out");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_failure_stops_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = run(&policy(5), URL, |_| {
            let calls = &calls;
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AttemptError::Permanent {
                    kind: FetchErrorKind::HttpStatus(403),
                    message: "forbidden".into(),
                })
            }
        })
        .await;

        let error = result.unwrap_err();
        assert_eq!(error.kind, FetchErrorKind::HttpStatus(403));
        assert_eq!(error.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn linear_backoff_grows_with_failures() {
        let policy = RetryPolicy::new(4, Duration::from_millis(100), Backoff::Linear);
        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(3), Duration::from_millis(300));

        let fixed = RetryPolicy::new(4, Duration::from_millis(100), Backoff::Fixed);
        assert_eq!(fixed.delay_after(3), Duration::from_millis(100));
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        assert_eq!(policy(0).max_attempts, 1);
    }
}
