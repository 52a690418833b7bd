use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use thiserror::Error;

use crate::{
    config::{JobsConfig, MAX_API_RETRIES},
    operations::{OperationError, OperationResponse},
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{}", join_errors(.0))]
    Api(Vec<OperationError>),

    #[error("malformed response: {0}")]
    Decode(String),
}

impl ClientError {
    /// Transport failures and server errors are worth another attempt;
    /// anything the API rejected on purpose is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Http(_) => true,
            ClientError::Status { status, .. } => *status >= 500,
            ClientError::Api(_) | ClientError::Decode(_) => false,
        }
    }
}

fn join_errors(errors: &[OperationError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.code, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn execute(&self, operation: &str, variables: Value) -> Result<Value, ClientError>;
}

/// Calls `POST /api/execute` on a running server.
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    client: reqwest::Client,
    url: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl HttpApiClient {
    pub fn new(
        url: impl Into<String>,
        max_retries: u32,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            max_retries: max_retries.min(MAX_API_RETRIES),
            retry_delay: Duration::from_secs(1),
        })
    }

    pub fn from_config(config: &JobsConfig) -> Result<Self, ClientError> {
        Self::new(config.api_url.clone(), config.retries, config.timeout)
    }

    /// Base delay before the first retry; doubles on each further attempt.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Delay before retry number `attempt` (1-based).
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.retry_delay.saturating_mul(factor)
    }

    async fn send_once(&self, body: &Value) -> Result<Value, ClientError> {
        let response = self.client.post(&self.url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: OperationResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        if !envelope.errors.is_empty() {
            return Err(ClientError::Api(envelope.errors));
        }
        envelope
            .data
            .ok_or_else(|| ClientError::Decode("response carried neither data nor errors".into()))
    }
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn execute(&self, operation: &str, variables: Value) -> Result<Value, ClientError> {
        let body = json!({ "operation": operation, "variables": variables });

        let mut attempt = 0;
        loop {
            match self.send_once(&body).await {
                Ok(data) => return Ok(data),
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let backoff = self.backoff(attempt);
                    tracing::warn!(
                        operation,
                        attempt,
                        max_retries = self.max_retries,
                        error = %err,
                        "api call failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
