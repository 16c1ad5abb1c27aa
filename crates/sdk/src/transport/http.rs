//! HTTP transport layer for the Kit SDK.

use crate::config::ClientConfig;
use crate::error::{self, KitResult};
use chrono::Utc;
use kitbridge_core::{ApiError, RateLimiter};
use reqwest::{header, Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const API_KEY_HEADER: &str = "x-kit-api-key";

/// HTTP transport for making API requests.
///
/// Every transmission, retries included, first waits for admission from the
/// shared [`RateLimiter`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: Arc<ClientConfig>,
    limiter: Arc<RateLimiter>,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given configuration.
    pub fn new(config: Arc<ClientConfig>, limiter: Arc<RateLimiter>) -> KitResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        if let Some(ref api_key) = config.api_key {
            headers.insert(
                header::HeaderName::from_static(API_KEY_HEADER),
                header::HeaderValue::from_str(api_key)
                    .map_err(|_| ApiError::Config("Invalid API key format".to_string()))?,
            );
        }

        if let Some(ref token) = config.access_token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|_| ApiError::Config("Invalid access token format".to_string()))?,
            );
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;

        Ok(Self {
            client,
            config,
            limiter,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Build a URL for the given path, relative to the base URL.
    fn build_url(&self, path: &str) -> KitResult<url::Url> {
        self.config
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::Request(e.to_string()))
    }

    /// Delay before retry `attempt`: the backoff schedule, stretched to the
    /// server's `Retry-After` hint when that is longer.
    fn retry_delay(&self, attempt: u32, retry_after_secs: Option<u64>) -> Duration {
        let backoff = self.limiter.compute_backoff(attempt);
        match retry_after_secs {
            Some(secs) => backoff.max(Duration::from_secs(secs)),
            None => backoff,
        }
    }

    /// Execute a request with rate limiting and retries.
    async fn execute_with_retry(&self, request_builder: RequestBuilder) -> KitResult<Response> {
        let retry_config = &self.config.retry_config;
        let mut attempts = 0;

        loop {
            let request = request_builder
                .try_clone()
                .ok_or_else(|| ApiError::Request("Request cannot be cloned".to_string()))?;

            let waited = self.limiter.await_admission().await;
            if !waited.is_zero() {
                debug!(waited_ms = waited.as_millis() as u64, "Admitted after rate limit wait");
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();

                    if response.status().is_success() {
                        return Ok(response);
                    }

                    let retry_after = error::retry_after(response.headers(), Utc::now());

                    if attempts < retry_config.max_retries
                        && retry_config.should_retry_status(status)
                    {
                        attempts += 1;
                        let delay = self.retry_delay(attempts, retry_after);
                        warn!(
                            status = status,
                            attempt = attempts,
                            delay_ms = delay.as_millis() as u64,
                            "Request failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    let body = response.text().await.unwrap_or_default();
                    return Err(error::from_response(status, &body, retry_after));
                }
                Err(e) => {
                    if attempts < retry_config.max_retries && e.is_timeout() {
                        attempts += 1;
                        let delay = self.retry_delay(attempts, None);
                        warn!(
                            attempt = attempts,
                            delay_ms = delay.as_millis() as u64,
                            "Request timed out, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(error::from_reqwest(e));
                }
            }
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> KitResult<T> {
        let body = response.text().await.map_err(error::from_reqwest)?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Execute a GET request.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> KitResult<T> {
        let url = self.build_url(path)?;
        debug!(url = %url, "GET request");

        let response = self.execute_with_retry(self.client.get(url)).await?;
        Self::decode(response).await
    }

    /// Execute a GET request with query parameters.
    pub async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> KitResult<T> {
        let url = self.build_url(path)?;
        debug!(url = %url, "GET request with query");

        let response = self
            .execute_with_retry(self.client.get(url).query(query))
            .await?;
        Self::decode(response).await
    }

    /// Execute a POST request.
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> KitResult<T> {
        let url = self.build_url(path)?;
        debug!(url = %url, "POST request");

        let response = self
            .execute_with_retry(self.client.post(url).json(body))
            .await?;
        Self::decode(response).await
    }
}
