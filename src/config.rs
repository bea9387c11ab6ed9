//! Configuration read from the environment through the [`Runtime`].
//!
//! Secrets have no defaults. Each command loads the section it needs before
//! doing any work, so a missing token fails the command up front.

use anyhow::{Context, Result, bail};
use log::debug;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::http::{
    BACKOFF_UNIT_MS, DEFAULT_TIMEOUT_SECS, MAX_ATTEMPTS, RetryPolicy, check_bearer_token, redact,
};
use crate::runtime::Runtime;

pub const ENV_HOME: &str = "MOOD_JOURNAL_HOME";
pub const ENV_HF_TOKEN: &str = "HUGGING_FACE_TOKEN";
pub const ENV_HF_MODEL_URL: &str = "HUGGING_FACE_MODEL_URL";
pub const ENV_CLASSIFY_TIMEOUT_SECS: &str = "CLASSIFY_TIMEOUT_SECS";
pub const ENV_CLASSIFY_MAX_ATTEMPTS: &str = "CLASSIFY_MAX_ATTEMPTS";
pub const ENV_CLASSIFY_BACKOFF_MS: &str = "CLASSIFY_BACKOFF_MS";
pub const ENV_FLW_SECRET_KEY: &str = "FLUTTERWAVE_SECRET_KEY";
pub const ENV_FLW_API_URL: &str = "FLUTTERWAVE_API_URL";
pub const ENV_SUBSCRIPTION_AMOUNT: &str = "SUBSCRIPTION_AMOUNT";
pub const ENV_SUBSCRIPTION_CURRENCY: &str = "SUBSCRIPTION_CURRENCY";
pub const ENV_SUBSCRIPTION_REDIRECT_URL: &str = "SUBSCRIPTION_REDIRECT_URL";

pub const DEFAULT_MODEL_URL: &str =
    "https://api-inference.huggingface.co/models/j-hartmann/emotion-english-distilroberta-base";
pub const DEFAULT_FLW_API_URL: &str = "https://api.flutterwave.com/v3";
pub const DEFAULT_SUBSCRIPTION_AMOUNT: u32 = 300;
pub const DEFAULT_SUBSCRIPTION_CURRENCY: &str = "KES";
pub const DEFAULT_REDIRECT_URL: &str = "http://localhost:5000/subscription-success";

/// Settings for the inference API.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    pub url: String,
    pub token: String,
    pub timeout: Duration,
    pub max_attempts: usize,
    pub backoff_unit: Duration,
}

impl ClassifierConfig {
    pub fn from_runtime<R: Runtime>(runtime: &R) -> Result<Self> {
        let token = bearer_token(runtime, ENV_HF_TOKEN)?;
        debug!("Using {} for inference: {}", ENV_HF_TOKEN, redact(&token));

        let max_attempts = parsed_or(runtime, ENV_CLASSIFY_MAX_ATTEMPTS, MAX_ATTEMPTS)?;
        if max_attempts == 0 {
            bail!("{} must be at least 1", ENV_CLASSIFY_MAX_ATTEMPTS);
        }

        let timeout_secs = parsed_or(runtime, ENV_CLASSIFY_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            bail!("{} must be at least 1", ENV_CLASSIFY_TIMEOUT_SECS);
        }

        Ok(Self {
            url: optional(runtime, ENV_HF_MODEL_URL).unwrap_or_else(|| DEFAULT_MODEL_URL.into()),
            token,
            timeout: Duration::from_secs(timeout_secs),
            max_attempts,
            backoff_unit: Duration::from_millis(parsed_or(
                runtime,
                ENV_CLASSIFY_BACKOFF_MS,
                BACKOFF_UNIT_MS,
            )?),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.backoff_unit)
    }
}

/// Settings for the payment gateway and the subscription offer.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentConfig {
    pub api_url: String,
    pub secret_key: String,
    pub amount: u32,
    pub currency: String,
    pub redirect_url: String,
    pub timeout: Duration,
}

impl PaymentConfig {
    pub fn from_runtime<R: Runtime>(runtime: &R) -> Result<Self> {
        let secret_key = bearer_token(runtime, ENV_FLW_SECRET_KEY)?;
        if is_placeholder(&secret_key) {
            bail!(
                "{} still holds a placeholder value; payment service is not configured",
                ENV_FLW_SECRET_KEY
            );
        }
        debug!("Using {} for payments: {}", ENV_FLW_SECRET_KEY, redact(&secret_key));

        Ok(Self {
            api_url: optional(runtime, ENV_FLW_API_URL)
                .unwrap_or_else(|| DEFAULT_FLW_API_URL.into())
                .trim_end_matches('/')
                .to_string(),
            secret_key,
            amount: parsed_or(runtime, ENV_SUBSCRIPTION_AMOUNT, DEFAULT_SUBSCRIPTION_AMOUNT)?,
            currency: optional(runtime, ENV_SUBSCRIPTION_CURRENCY)
                .unwrap_or_else(|| DEFAULT_SUBSCRIPTION_CURRENCY.into()),
            redirect_url: optional(runtime, ENV_SUBSCRIPTION_REDIRECT_URL)
                .unwrap_or_else(|| DEFAULT_REDIRECT_URL.into()),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }
}

/// Resolves the journal data directory: explicit flag, then [`ENV_HOME`],
/// then the platform data dir.
pub fn resolve_home<R: Runtime>(runtime: &R, home: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(home) = home {
        return Ok(home);
    }
    if let Some(home) = optional(runtime, ENV_HOME) {
        return Ok(PathBuf::from(home));
    }
    runtime
        .data_dir()
        .map(|dir| dir.join("moodjournal"))
        .context("Could not determine a data directory; pass --home or set MOOD_JOURNAL_HOME")
}

fn optional<R: Runtime>(runtime: &R, key: &str) -> Option<String> {
    runtime
        .env_var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required<R: Runtime>(runtime: &R, key: &str) -> Result<String> {
    optional(runtime, key).with_context(|| format!("Missing required environment variable {}", key))
}

fn bearer_token<R: Runtime>(runtime: &R, key: &str) -> Result<String> {
    let token = required(runtime, key)?;
    check_bearer_token(&token).with_context(|| format!("Invalid value for {}", key))?;
    Ok(token)
}

fn parsed_or<R, T>(runtime: &R, key: &str, default: T) -> Result<T>
where
    R: Runtime,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(runtime, key) {
        Some(value) => value
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, value)),
        None => Ok(default),
    }
}

fn is_placeholder(secret: &str) -> bool {
    secret.contains("your-secret-key") || secret.chars().all(|c| c == '*')
}
