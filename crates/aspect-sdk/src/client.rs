//! Aspect service client with caller-side retry.

use aspect_core::GeoPoint;
use std::time::Duration;
use thiserror::Error;

use crate::backoff::Backoff;
use crate::models::{AspectResponse, ErrorBody, ProvidersResponse};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("server returned HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("invalid response: {0}")]
    Decode(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// Transport failures, timeouts, 5xx and 429 may succeed on a later
    /// attempt. Other 4xx responses will not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport(_) | ClientError::Timeout(_) => true,
            ClientError::Http { status, .. } => *status >= 500 || *status == 429,
            ClientError::Decode(_) | ClientError::InvalidRequest(_) => false,
        }
    }
}

/// Retry schedule for [`AspectClient::resolve_with_retry`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter_ratio: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter_ratio: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AspectRequest {
    pub point: GeoPoint,
    pub geometry: Option<Vec<GeoPoint>>,
    pub provider: Option<String>,
}

impl AspectRequest {
    pub fn new(point: GeoPoint) -> Self {
        Self {
            point,
            geometry: None,
            provider: None,
        }
    }

    pub fn with_geometry(mut self, geometry: Vec<GeoPoint>) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    fn query_params(&self) -> Result<Vec<(&'static str, String)>, ClientError> {
        let mut params = vec![
            ("lat", self.point.latitude.to_string()),
            ("lon", self.point.longitude.to_string()),
        ];
        if let Some(provider) = &self.provider {
            params.push(("provider", provider.clone()));
        }
        // single points carry no facing information
        if let Some(geometry) = self.geometry.as_ref().filter(|g| g.len() >= 2) {
            let encoded = serde_json::to_string(geometry)
                .map_err(|err| ClientError::InvalidRequest(err.to_string()))?;
            params.push(("geometry", encoded));
        }
        Ok(params)
    }
}

/// Client for the aspect service.
#[derive(Debug, Clone)]
pub struct AspectClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
    retry: RetryPolicy,
}

impl AspectClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(20),
            retry: RetryPolicy::default(),
        }
    }

    /// Per-request deadline, covering connect through body read.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve once, without retrying.
    pub async fn resolve(&self, request: &AspectRequest) -> Result<AspectResponse, ClientError> {
        let url = format!("{}/aspect", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&request.query_params()?)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| self.map_reqwest(err))?;

        let status = response.status();
        if !status.is_success() {
            let body: ErrorBody = response.json().await.unwrap_or_default();
            return Err(ClientError::Http {
                status: status.as_u16(),
                message: body
                    .message()
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string()),
            });
        }

        response.json().await.map_err(|err| self.map_reqwest(err))
    }

    /// Resolve, retrying retryable failures per the client's [`RetryPolicy`].
    pub async fn resolve_with_retry(
        &self,
        request: &AspectRequest,
    ) -> Result<AspectResponse, ClientError> {
        let mut backoff = Backoff::new(self.retry.base_delay, self.retry.max_delay)
            .with_jitter(self.retry.jitter_ratio);
        let mut attempt = 0;

        loop {
            match self.resolve(request).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_retryable() && attempt < self.retry.retries => {
                    attempt += 1;
                    let delay = backoff.next_delay();
                    tracing::warn!(
                        attempt,
                        retries = self.retry.retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Aspect request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    pub async fn providers(&self) -> Result<ProvidersResponse, ClientError> {
        let url = format!("{}/providers", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| self.map_reqwest(err))?;

        if !response.status().is_success() {
            return Err(ClientError::Http {
                status: response.status().as_u16(),
                message: "provider listing failed".to_string(),
            });
        }
        response.json().await.map_err(|err| self.map_reqwest(err))
    }

    fn map_reqwest(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(self.timeout)
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}
