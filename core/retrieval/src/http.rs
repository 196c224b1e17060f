//! Retrying HTTP calls shared by every adapter and the block store.

use reqwest::{header::RETRY_AFTER, Client, RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{RetryPolicy, ServiceConfig};
use crate::error::RetrievalError;

/// Header carrying the zero-based attempt number on every request.
pub const RETRY_ATTEMPT_HEADER: &str = "x-retry-attempt";

const MAX_ERROR_BODY_CHARS: usize = 500;

/// One HTTP client per collaborator, wrapped with a retry policy.
///
/// Each adapter owns its own instance so that backoff against one slow
/// service never delays calls to another.
pub struct RetryingClient {
    client: Client,
    service: String,
    config: ServiceConfig,
    policy: RetryPolicy,
}

impl RetryingClient {
    pub fn new(
        service: impl Into<String>,
        config: ServiceConfig,
        policy: RetryPolicy,
    ) -> Result<Self, RetrievalError> {
        let service = service.into();
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RetrievalError::Config {
                service: service.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            service,
            config,
            policy,
        })
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Send a request built by `build` until it succeeds, a final status is
    /// returned, or the policy's attempts are used up.
    ///
    /// `build` is called once per attempt since request builders are
    /// consumed by `send`.
    pub async fn send<F>(&self, build: F) -> Result<Response, RetrievalError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let mut request = build(&self.client)
                .header(RETRY_ATTEMPT_HEADER, (attempt - 1).to_string());
            if let Some(ref key) = self.config.api_key {
                request = request.bearer_auth(key);
            }

            let (error, retry_after) = match request.send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(
                        "{}: HTTP {} on attempt {}",
                        self.service,
                        response.status(),
                        attempt
                    );
                    return Ok(response);
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    let retry_after = parse_retry_after(&response);
                    let body = response.text().await.unwrap_or_default();
                    let error = RetrievalError::Status {
                        service: self.service.clone(),
                        status,
                        body: truncate_chars(&body, MAX_ERROR_BODY_CHARS),
                    };

                    if !self.policy.should_retry_status(status) {
                        return Err(error);
                    }
                    (error, retry_after)
                }
                Err(e) if e.is_timeout() => (
                    RetrievalError::Timeout {
                        service: self.service.clone(),
                    },
                    None,
                ),
                Err(e) if e.is_connect() || e.is_request() => (
                    RetrievalError::Transport {
                        service: self.service.clone(),
                        message: e.to_string(),
                    },
                    None,
                ),
                Err(e) => {
                    return Err(RetrievalError::Transport {
                        service: self.service.clone(),
                        message: e.to_string(),
                    })
                }
            };

            if attempt >= max_attempts {
                return Err(RetrievalError::RetriesExhausted {
                    service: self.service.clone(),
                    attempts: attempt,
                    last: Box::new(error),
                });
            }

            let wait = retry_after
                .map(|w| w.min(self.policy.max_backoff))
                .unwrap_or_else(|| self.policy.backoff(attempt));

            warn!(
                "{}: attempt {}/{} failed ({}), retrying in {}ms",
                self.service,
                attempt,
                max_attempts,
                error,
                wait.as_millis()
            );

            tokio::time::sleep(wait).await;
        }
    }

    /// [`RetryingClient::send`] followed by decoding the body as JSON.
    pub async fn send_json<F>(&self, build: F) -> Result<Value, RetrievalError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let response = self.send(build).await?;
        response
            .json::<Value>()
            .await
            .map_err(|e| RetrievalError::Decode {
                service: self.service.clone(),
                message: e.to_string(),
            })
    }
}

fn parse_retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
