//! Core HTTP operations with rate limiting and status classification
//!
//! Every request passes through a single shared governor rate limiter so the
//! whole worker pool stays within the configured request rate. Responses are
//! classified into pages, absent resources and transient failures; retrying is
//! left to the caller.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{clock::DefaultClock, state::InMemoryState, Jitter, Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use url::Url;

use crate::constants::http;
use crate::errors::{FetchError, FetchResult, HarvestError, HarvestResult};

type DirectRateLimiter = RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>;

/// HTTP operations handler with shared rate limiting
#[derive(Debug)]
pub struct HttpHandler {
    client: Client,
    rate_limiter: DirectRateLimiter,
}

impl HttpHandler {
    /// Creates a new HttpHandler with the given client and rate limit
    ///
    /// # Errors
    ///
    /// Returns `HarvestError::Configuration` if the rate is zero
    pub fn new(client: Client, rate_limit_rps: u32) -> HarvestResult<Self> {
        let rate_limiter = Self::build_rate_limiter(rate_limit_rps)?;
        Ok(Self {
            client,
            rate_limiter,
        })
    }

    fn build_rate_limiter(rate_limit_rps: u32) -> HarvestResult<DirectRateLimiter> {
        let rps = NonZeroU32::new(rate_limit_rps).ok_or_else(|| {
            HarvestError::Configuration("Rate limit must be non-zero".to_string())
        })?;
        Ok(RateLimiter::direct(Quota::per_second(rps)))
    }

    /// Fetches the body of a page
    ///
    /// # Errors
    ///
    /// * `FetchError::Absent` for 404 and 410 responses
    /// * `FetchError::Transient` for network failures, timeouts and every
    ///   other non-success status
    pub async fn get_page(&self, url: &Url) -> FetchResult<String> {
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(100)))
            .await;

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| FetchError::transient(url.as_str(), describe_request_error(&e)))?;

        if let Some(error) = classify_status(url.as_str(), response.status()) {
            tracing::debug!("Fetch of {} failed: {}", url, error);
            return Err(error);
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::transient(url.as_str(), describe_request_error(&e)))?;
        tracing::debug!("Fetched page: {} ({} bytes)", url, body.len());
        Ok(body)
    }

    /// Get a reference to the underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Map a response status to a fetch error, or `None` on success
pub fn classify_status(url: &str, status: StatusCode) -> Option<FetchError> {
    if status.is_success() {
        return None;
    }
    if http::ABSENT_STATUS_CODES.contains(&status.as_u16()) {
        return Some(FetchError::Absent {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    let reason = match status {
        StatusCode::TOO_MANY_REQUESTS => "rate limited by server (HTTP 429)".to_string(),
        StatusCode::SERVICE_UNAVAILABLE => "server overloaded (HTTP 503)".to_string(),
        other => format!("HTTP {}", other.as_u16()),
    };
    Some(FetchError::transient(url, reason))
}

fn describe_request_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else {
        error.to_string()
    }
}
