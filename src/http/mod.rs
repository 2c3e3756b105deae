//! HTTP client module
//!
//! Provides the data-API client with retry, rate limiting, and backoff strategies.
//!
//! # Features
//!
//! - **Explicit Timeouts**: every request carries the configured timeout
//! - **Automatic Retries**: timeouts, connection errors, truncated bodies, 429 and 5xx are retried
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Exponential Backoff**: capped by `max_backoff`, which also bounds `Retry-After`

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
