//! HTTP client with retry and rate limiting
//!
//! Every Simphony data request goes through this client. It handles:
//! - An explicit per-request timeout
//! - Automatic retries with exponential backoff
//! - Rate limiting to stay under the API throttle
//! - Error classification for retry decisions
//!
//! The response body is read inside the retry loop: a body that stalls or is
//! cut off is retried like any other transport failure.

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::error::{is_retryable_status, Error, Result};
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL for all requests
    pub base_url: Option<String>,
    /// Request timeout, covering the response body
    pub timeout: Duration,
    /// Maximum number of retries
    pub max_retries: u32,
    /// Delay before the first retry, doubled on every further retry
    pub initial_backoff: Duration,
    /// Upper bound of any retry delay, `Retry-After` included
    pub max_backoff: Duration,
    /// Rate limiter configuration, unlimited when absent
    pub rate_limit: Option<RateLimiterConfig>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(60),
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(60),
            rate_limit: None,
            user_agent: format!("tap-simphony/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set max retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set the first retry delay and the delay cap
    pub fn backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.config.initial_backoff = initial;
        self.config.max_backoff = max;
        self
    }

    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Configuration for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Bearer token sent as `Authorization: Bearer <token>`
    pub bearer: Option<String>,
    /// Request body (JSON)
    pub body: Option<Value>,
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a bearer token
    #[must_use]
    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// HTTP client with retry and rate limiting
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            rate_limiter,
        })
    }

    /// POST a request and return the response body
    pub async fn post_with_config(&self, url: &str, config: RequestConfig) -> Result<String> {
        self.request(Method::POST, url, config).await
    }

    /// Make a generic request and read its body, retrying transient failures
    pub async fn request(&self, method: Method, url: &str, config: RequestConfig) -> Result<String> {
        let full_url = self.build_url(url);
        let max_retries = self.config.max_retries;
        let timeout_ms = self.config.timeout.as_millis() as u64;

        let mut last_error = None;
        let mut attempt = 0;

        while attempt <= max_retries {
            if let Some(ref limiter) = self.rate_limiter {
                limiter.wait().await;
            }

            let mut req = self.client.request(method.clone(), &full_url);

            if let Some(ref token) = config.bearer {
                req = req.bearer_auth(token);
            }

            if let Some(ref body) = config.body {
                req = req.json(body);
            }

            let response = match req.send().await {
                Ok(response) => response,
                Err(e) if is_transient(&e) && attempt < max_retries => {
                    let delay = self.calculate_backoff(attempt);
                    warn!(
                        "Transport error ({e}), attempt {}/{}, retrying in {:?}",
                        attempt + 1,
                        max_retries + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    last_error = Some(transport_error(e, timeout_ms));
                    continue;
                }
                Err(e) => return Err(transport_error(e, timeout_ms)),
            };

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempt < max_retries {
                    let delay = self.retry_after_delay(&response, attempt);
                    warn!(
                        "Rate limited (429), attempt {}/{}, waiting {:?}",
                        attempt + 1,
                        max_retries + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    last_error = Some(Error::RateLimited {
                        retry_after_seconds: delay.as_secs(),
                    });
                    continue;
                }
                return Err(Error::RateLimited {
                    retry_after_seconds: retry_after_seconds(&response).unwrap_or_default(),
                });
            }

            if is_retryable_status(status.as_u16()) && attempt < max_retries {
                let delay = self.calculate_backoff(attempt);
                warn!(
                    "Request failed with {}, attempt {}/{}, retrying in {:?}",
                    status.as_u16(),
                    attempt + 1,
                    max_retries + 1,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                last_error = Some(Error::http_status(status.as_u16(), ""));
                continue;
            }

            if status.is_client_error() || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                return Err(Error::http_status(status.as_u16(), body));
            }

            match response.text().await {
                Ok(body) => {
                    debug!("Request succeeded: {} {}", method, full_url);
                    return Ok(body);
                }
                Err(e) if is_transient(&e) && attempt < max_retries => {
                    let delay = self.calculate_backoff(attempt);
                    warn!(
                        "Reading response body failed ({e}), attempt {}/{}, retrying in {:?}",
                        attempt + 1,
                        max_retries + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    last_error = Some(transport_error(e, timeout_ms));
                }
                Err(e) => return Err(transport_error(e, timeout_ms)),
            }
        }

        Err(last_error.unwrap_or(Error::MaxRetriesExceeded { max_retries }))
    }

    /// Build full URL from path
    fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        match &self.config.base_url {
            Some(base) => {
                let base = base.trim_end_matches('/');
                let path = path.trim_start_matches('/');
                format!("{base}/{path}")
            }
            None => path.to_string(),
        }
    }

    /// Exponential backoff delay for a given attempt, capped at `max_backoff`
    pub(super) fn calculate_backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        let delay = self.config.initial_backoff.saturating_mul(factor);
        std::cmp::min(delay, self.config.max_backoff)
    }

    /// Delay before retrying a 429: `Retry-After` seconds if given, capped at
    /// `max_backoff`; otherwise the regular backoff
    fn retry_after_delay(&self, response: &Response, attempt: u32) -> Duration {
        match retry_after_seconds(response) {
            Some(seconds) => std::cmp::min(Duration::from_secs(seconds), self.config.max_backoff),
            None => self.calculate_backoff(attempt),
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// `Retry-After` header in seconds; HTTP-date values are ignored
fn retry_after_seconds(response: &Response) -> Option<u64> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

/// Failures worth another attempt: timeouts, refused or dropped connections,
/// and bodies cut off mid-transfer
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_decode()
}

fn transport_error(e: reqwest::Error, timeout_ms: u64) -> Error {
    if e.is_timeout() {
        Error::Timeout { timeout_ms }
    } else {
        Error::Http(e)
    }
}
