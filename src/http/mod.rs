//! HTTP client module with retry logic and outcome classification.

mod client;
mod retry;

pub use client::{DEFAULT_TIMEOUT_SECS, HttpClient, USER_AGENT, check_bearer_token, redact};
pub use retry::{
    AttemptFailure, BACKOFF_UNIT_MS, MAX_ATTEMPTS, RetryPolicy, Sleeper, TokioSleeper,
    classify_status, from_reqwest, with_retry,
};
