//! Hugging Face inference API classifier.

use anyhow::Result;
use async_trait::async_trait;
use log::{error, info, warn};
use serde::Serialize;

use super::{ClassificationResult, Classifier, parse_prediction};
use crate::config::ClassifierConfig;
use crate::http::{
    AttemptFailure, HttpClient, RetryPolicy, Sleeper, TokioSleeper, classify_status, from_reqwest,
    with_retry,
};

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
}

/// Calls a text-classification model, retrying while it warms up.
pub struct HuggingFaceClassifier<S: Sleeper = TokioSleeper> {
    http_client: HttpClient,
    url: String,
    token: String,
    policy: RetryPolicy,
    sleeper: S,
}

impl HuggingFaceClassifier {
    pub fn new(config: &ClassifierConfig) -> Result<Self> {
        let http_client = HttpClient::with_timeout(config.timeout)?;
        Ok(Self::with_sleeper(http_client, config, TokioSleeper))
    }
}

impl<S: Sleeper> HuggingFaceClassifier<S> {
    pub fn with_sleeper(http_client: HttpClient, config: &ClassifierConfig, sleeper: S) -> Self {
        Self {
            http_client,
            url: config.url.clone(),
            token: config.token.clone(),
            policy: config.retry_policy(),
            sleeper,
        }
    }

    /// One request/parse cycle.
    async fn attempt(&self, text: &str) -> Result<ClassificationResult, AttemptFailure> {
        let response = self
            .http_client
            .post_json(&self.url, &self.token, &InferenceRequest { inputs: text })
            .await
            .map_err(|e| from_reqwest(&e))?;

        classify_status(response.status())?;

        let body = response.text().await.map_err(|e| from_reqwest(&e))?;
        parse_prediction(&body)
    }
}

#[async_trait]
impl<S: Sleeper> Classifier for HuggingFaceClassifier<S> {
    async fn classify(&self, text: &str) -> ClassificationResult {
        let max = self.policy.max_attempts();
        let outcome = with_retry(
            &self.policy,
            &self.sleeper,
            "Emotion analysis",
            |attempt| async move {
                let result = self.attempt(text).await;
                match &result {
                    Err(AttemptFailure::ServiceUnavailable) => {
                        warn!("Model loading, attempt {}/{}", attempt + 1, max);
                    }
                    Err(AttemptFailure::Transport(msg)) => {
                        error!("API request failed (attempt {}/{}): {}", attempt + 1, max, msg);
                    }
                    _ => {}
                }
                result
            },
        )
        .await;

        match outcome {
            Ok(result) => {
                info!("Emotion detected: {} ({}%)", result.label, result.confidence);
                result
            }
            Err(AttemptFailure::Rejected(status)) => {
                error!(
                    "Inference API token invalid or quota exceeded (HTTP {}), using fallback",
                    status.as_u16()
                );
                ClassificationResult::fallback()
            }
            Err(AttemptFailure::Malformed(msg)) => {
                warn!("Unexpected API response format ({}), using fallback", msg);
                ClassificationResult::fallback()
            }
            Err(AttemptFailure::InvalidRequest(msg)) => {
                error!("Inference request could not be sent ({}), using fallback", msg);
                ClassificationResult::fallback()
            }
            Err(failure) => {
                warn!(
                    "Emotion analysis unavailable after {} attempts ({}), using fallback",
                    max, failure
                );
                ClassificationResult::fallback()
            }
        }
    }
}
