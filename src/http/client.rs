//! HTTP client for bearer-authenticated JSON calls.

use anyhow::{Context, Result};
use log::debug;
use reqwest::{Client, Response, header::HeaderValue};
use serde::Serialize;
use std::time::Duration;

/// User agent sent with every outbound request.
pub const USER_AGENT: &str = "moodjournal";

/// Per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Thin wrapper over a shared reqwest Client.
///
/// Retrying is left to callers: classification wraps each call in
/// [`with_retry`](super::with_retry), payment creation is sent exactly once.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client whose every request is bounded by `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self::new(client))
    }

    /// Sends one POST with a JSON body and a bearer token.
    ///
    /// Non-success statuses are returned as responses, not errors, so the
    /// caller can classify them. A token that is not a valid header value
    /// fails the request before anything is sent.
    #[tracing::instrument(skip(self, token, body))]
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        token: &str,
        body: &B,
    ) -> reqwest::Result<Response> {
        debug!("POST JSON to {}...", url);

        self.client
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
    }
}

/// Fails when `token` cannot be sent as a bearer `Authorization` header.
pub fn check_bearer_token(token: &str) -> Result<()> {
    HeaderValue::from_str(&format!("Bearer {}", token))
        .context("Token contains characters that are not allowed in an HTTP header")?;
    Ok(())
}

/// Masks a secret for log output, keeping only a short prefix.
pub fn redact(secret: &str) -> String {
    let prefix: String = secret.chars().take(4).collect();
    format!("{}****", prefix)
}
