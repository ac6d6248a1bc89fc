//! HTTP client implementation for the notice origin
//!
//! Fetching sits behind the [`Fetcher`] trait so that the worker pool and the
//! frontier discoverer can be driven by an in-memory double in tests. The
//! production implementation, [`HttpFetcher`], wraps a reqwest client with a
//! shared rate limiter.
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and building
//! - `http`: rate-limited requests and status classification

use std::future::Future;

use url::Url;

use crate::errors::{FetchResult, HarvestResult};

pub mod config;
pub mod http;

pub use config::ClientConfig;

use http::HttpHandler;

/// Retrieves the raw payload of a candidate URL
///
/// Implementations must be shareable across worker tasks. `Err(Absent)` means
/// the origin reported the resource missing; every other failure is
/// `Err(Transient)`.
pub trait Fetcher: Send + Sync + 'static {
    /// Fetch the page at `url`
    fn fetch(&self, url: &Url) -> impl Future<Output = FetchResult<String>> + Send;
}

/// Rate-limited HTTP fetcher for notice pages
#[derive(Debug)]
pub struct HttpFetcher {
    http_handler: HttpHandler,
    base_url: String,
}

impl HttpFetcher {
    /// Creates a fetcher from client configuration
    ///
    /// # Errors
    ///
    /// Returns `HarvestError` if the configuration is invalid or the HTTP
    /// client cannot be built
    pub fn new(config: &ClientConfig) -> HarvestResult<Self> {
        config
            .validate()
            .map_err(crate::errors::HarvestError::Configuration)?;
        let client = config.build_http_client()?;
        let http_handler = HttpHandler::new(client, config.rate_limit_rps)?;

        tracing::info!(
            "Created HTTP fetcher for {} ({} req/s)",
            config.base_url,
            config.rate_limit_rps
        );

        Ok(Self {
            http_handler,
            base_url: config.base_url.clone(),
        })
    }

    /// Base URL notice ids are resolved against
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> FetchResult<String> {
        self.http_handler.get_page(url).await
    }
}

#[cfg(test)]
mod tests;
