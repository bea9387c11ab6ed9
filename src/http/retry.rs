//! Retry logic for outbound calls with intelligent outcome classification.
//!
//! Every attempt ends in success or one [`AttemptFailure`]. The failure kind
//! decides whether another attempt is made and how long to wait before it:
//!
//! | Failure              | Retryable | Wait                    |
//! |----------------------|-----------|-------------------------|
//! | `ServiceUnavailable` | yes       | `unit * 2^attempt`      |
//! | `Rejected`           | no        | -                       |
//! | `Transport`          | yes       | `unit`                  |
//! | `Malformed`          | no        | -                       |
//! | `InvalidRequest`     | no        | -                       |
//!
//! No wait is inserted after the final attempt.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::StatusCode;
use std::time::Duration;

/// Maximum number of attempts for a single call.
pub const MAX_ATTEMPTS: usize = 3;

/// Base backoff unit in milliseconds.
pub const BACKOFF_UNIT_MS: u64 = 1000;

/// Why a single attempt did not produce a usable answer.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptFailure {
    /// Upstream is warming up or overloaded (HTTP 503)
    ServiceUnavailable,
    /// Authorization or quota rejected (HTTP 401, 403, 429)
    Rejected(StatusCode),
    /// Network error, timeout, or an unexpected status code
    Transport(String),
    /// Upstream answered successfully but the body broke the contract
    Malformed(String),
    /// The request could not be built locally
    InvalidRequest(String),
}

impl AttemptFailure {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AttemptFailure::ServiceUnavailable | AttemptFailure::Transport(_)
        )
    }
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptFailure::ServiceUnavailable => {
                write!(f, "Service unavailable: the model is still loading")
            }
            AttemptFailure::Rejected(status) => {
                write!(
                    f,
                    "Request rejected (HTTP {}): token invalid or quota exceeded",
                    status.as_u16()
                )
            }
            AttemptFailure::Transport(msg) => write!(f, "Request failed: {}", msg),
            AttemptFailure::Malformed(msg) => write!(f, "Unexpected response format: {}", msg),
            AttemptFailure::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
        }
    }
}

impl std::error::Error for AttemptFailure {}

/// Maps an HTTP status to `Ok(())` when the body should be parsed,
/// or to the failure it represents otherwise.
pub fn classify_status(status: StatusCode) -> Result<(), AttemptFailure> {
    match status {
        s if s.is_success() => Ok(()),
        StatusCode::SERVICE_UNAVAILABLE => Err(AttemptFailure::ServiceUnavailable),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
            Err(AttemptFailure::Rejected(status))
        }
        // Anything else is treated like a failed request and retried
        s => Err(AttemptFailure::Transport(format!("HTTP {} error", s.as_u16()))),
    }
}

/// Converts a reqwest error into an attempt failure.
///
/// Statuses never arrive here: responses are classified with
/// [`classify_status`] before any body is read. A request that could not be
/// built (for example an invalid header) fails the same way every time.
pub fn from_reqwest(error: &reqwest::Error) -> AttemptFailure {
    if error.is_builder() {
        return AttemptFailure::InvalidRequest(error.to_string());
    }
    if error.is_timeout() {
        return AttemptFailure::Transport(format!("timed out: {}", error));
    }
    AttemptFailure::Transport(error.to_string())
}

/// Waits between attempts. Injected so tests can observe the schedule.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Attempt budget and backoff unit for one call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    max_attempts: usize,
    backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(MAX_ATTEMPTS, Duration::from_millis(BACKOFF_UNIT_MS))
    }
}

impl RetryPolicy {
    /// At least one attempt is always made.
    pub fn new(max_attempts: usize, backoff_unit: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_unit,
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn backoff_unit(&self) -> Duration {
        self.backoff_unit
    }

    /// Delay before the attempt following `attempt` (zero-based), or `None`
    /// when the failure is terminal or the budget is spent.
    pub fn delay_after(&self, attempt: usize, failure: &AttemptFailure) -> Option<Duration> {
        if !failure.is_retryable() || attempt + 1 >= self.max_attempts {
            return None;
        }
        match failure {
            AttemptFailure::ServiceUnavailable => {
                let factor = 1u32.checked_shl(attempt as u32).unwrap_or(u32::MAX);
                Some(self.backoff_unit.saturating_mul(factor))
            }
            _ => Some(self.backoff_unit),
        }
    }
}

enum RetryState<T> {
    Attempting(usize),
    Waiting { attempt: usize, delay: Duration },
    Succeeded(T),
    FailedFinal(AttemptFailure),
}

/// Drives `operation` through the retry state machine.
///
/// `operation` receives the zero-based attempt number. The returned error is
/// the failure that ended the call: a terminal one, or the last retryable one
/// once the budget is exhausted.
pub async fn with_retry<S, F, Fut, T>(
    policy: &RetryPolicy,
    sleeper: &S,
    operation_name: &str,
    operation: F,
) -> Result<T, AttemptFailure>
where
    S: Sleeper + ?Sized,
    F: Fn(usize) -> Fut,
    Fut: std::future::Future<Output = Result<T, AttemptFailure>>,
{
    let mut state = RetryState::Attempting(0);

    loop {
        state = match state {
            RetryState::Attempting(attempt) => match operation(attempt).await {
                Ok(value) => RetryState::Succeeded(value),
                Err(failure) => match policy.delay_after(attempt, &failure) {
                    Some(delay) => {
                        warn!(
                            "{}: attempt {}/{} failed ({}), retrying in {}ms...",
                            operation_name,
                            attempt + 1,
                            policy.max_attempts,
                            failure,
                            delay.as_millis()
                        );
                        RetryState::Waiting { attempt, delay }
                    }
                    None => {
                        if failure.is_retryable() {
                            warn!(
                                "{}: giving up after {} attempts ({})",
                                operation_name, policy.max_attempts, failure
                            );
                        } else {
                            debug!("{}: non-retryable failure: {}", operation_name, failure);
                        }
                        RetryState::FailedFinal(failure)
                    }
                },
            },
            RetryState::Waiting { attempt, delay } => {
                sleeper.sleep(delay).await;
                RetryState::Attempting(attempt + 1)
            }
            RetryState::Succeeded(value) => return Ok(value),
            RetryState::FailedFinal(failure) => return Err(failure),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::RecordingSleeper;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn unit_policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_secs(1))
    }

    #[test]
    fn test_classify_status() {
        assert!(classify_status(StatusCode::OK).is_ok());
        assert_eq!(
            classify_status(StatusCode::SERVICE_UNAVAILABLE),
            Err(AttemptFailure::ServiceUnavailable)
        );
        assert_eq!(
            classify_status(StatusCode::FORBIDDEN),
            Err(AttemptFailure::Rejected(StatusCode::FORBIDDEN))
        );
        assert_eq!(
            classify_status(StatusCode::UNAUTHORIZED),
            Err(AttemptFailure::Rejected(StatusCode::UNAUTHORIZED))
        );
        assert_eq!(
            classify_status(StatusCode::TOO_MANY_REQUESTS),
            Err(AttemptFailure::Rejected(StatusCode::TOO_MANY_REQUESTS))
        );
        assert!(matches!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR),
            Err(AttemptFailure::Transport(_))
        ));
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND),
            Err(AttemptFailure::Transport(_))
        ));
    }

    #[test]
    fn test_attempt_failure_display() {
        let err = AttemptFailure::Rejected(StatusCode::FORBIDDEN);
        assert!(err.to_string().contains("403"));
        assert!(err.to_string().contains("quota"));

        let err = AttemptFailure::ServiceUnavailable;
        assert!(err.to_string().contains("loading"));

        let err = AttemptFailure::Malformed("empty list".into());
        assert!(err.to_string().contains("empty list"));
    }

    #[test]
    fn test_delay_after_doubles_for_unavailable() {
        let policy = unit_policy();
        let failure = AttemptFailure::ServiceUnavailable;
        assert_eq!(policy.delay_after(0, &failure), Some(Duration::from_secs(1)));
        assert_eq!(policy.delay_after(1, &failure), Some(Duration::from_secs(2)));
        assert_eq!(policy.delay_after(2, &failure), None);

        let longer = RetryPolicy::new(5, Duration::from_secs(1));
        assert_eq!(longer.delay_after(3, &failure), Some(Duration::from_secs(8)));
    }

    #[test]
    fn test_delay_after_fixed_for_transport() {
        let policy = unit_policy();
        let failure = AttemptFailure::Transport("connection reset".into());
        assert_eq!(policy.delay_after(0, &failure), Some(Duration::from_secs(1)));
        assert_eq!(policy.delay_after(1, &failure), Some(Duration::from_secs(1)));
        assert_eq!(policy.delay_after(2, &failure), None);
    }

    #[test]
    fn test_delay_after_terminal_failures() {
        let policy = unit_policy();
        assert_eq!(
            policy.delay_after(0, &AttemptFailure::Rejected(StatusCode::FORBIDDEN)),
            None
        );
        assert_eq!(
            policy.delay_after(0, &AttemptFailure::Malformed("x".into())),
            None
        );
    }

    #[test]
    fn test_from_reqwest_invalid_header_is_terminal() {
        let error = reqwest::Client::new()
            .post("http://localhost/")
            .bearer_auth("hf_\u{1}bad")
            .build()
            .unwrap_err();

        let failure = from_reqwest(&error);
        assert!(matches!(failure, AttemptFailure::InvalidRequest(_)));
        assert!(!failure.is_retryable());
        assert_eq!(unit_policy().delay_after(0, &failure), None);
    }

    #[test]
    fn test_policy_needs_at_least_one_attempt() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        assert_eq!(policy.max_attempts(), 1);
    }

    #[tokio::test]
    async fn test_with_retry_success_first_try() {
        let sleeper = RecordingSleeper::default();
        let result = with_retry(&unit_policy(), &sleeper, "test", |_| async {
            Ok::<_, AttemptFailure>(42)
        })
        .await;

        assert_eq!(result, Ok(42));
        assert!(sleeper.waits().is_empty());
    }

    #[tokio::test]
    async fn test_with_retry_backs_off_exponentially() {
        let sleeper = RecordingSleeper::default();
        let attempts = Arc::new(AtomicUsize::new(0));

        let result = with_retry(&unit_policy(), &sleeper, "test", |attempt| {
            let attempts = Arc::clone(&attempts);
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                if attempt < 2 {
                    Err(AttemptFailure::ServiceUnavailable)
                } else {
                    Ok("ready")
                }
            }
        })
        .await;

        assert_eq!(result, Ok("ready"));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(
            sleeper.waits(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[tokio::test]
    async fn test_with_retry_stops_on_terminal_failure() {
        let sleeper = RecordingSleeper::default();
        let attempts = Arc::new(AtomicUsize::new(0));

        let result: Result<(), _> = with_retry(&unit_policy(), &sleeper, "test", |_| {
            let attempts = Arc::clone(&attempts);
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(AttemptFailure::Rejected(StatusCode::FORBIDDEN))
            }
        })
        .await;

        assert_eq!(result, Err(AttemptFailure::Rejected(StatusCode::FORBIDDEN)));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(sleeper.waits().is_empty());
    }

    #[tokio::test]
    async fn test_with_retry_exhausts_attempts() {
        let sleeper = RecordingSleeper::default();
        let attempts = Arc::new(AtomicUsize::new(0));

        let result: Result<(), _> = with_retry(&unit_policy(), &sleeper, "test", |_| {
            let attempts = Arc::clone(&attempts);
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(AttemptFailure::Transport("connection refused".into()))
            }
        })
        .await;

        assert!(matches!(result, Err(AttemptFailure::Transport(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), MAX_ATTEMPTS);
        assert_eq!(
            sleeper.waits(),
            vec![Duration::from_secs(1), Duration::from_secs(1)]
        );
    }

    #[tokio::test]
    async fn test_tokio_sleeper_waits() {
        let start = std::time::Instant::now();
        TokioSleeper.sleep(Duration::from_millis(20)).await;
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
