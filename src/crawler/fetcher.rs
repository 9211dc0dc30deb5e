//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests for page bodies (text)
//! - GET requests for wallpaper assets (bytes)
//! - Error classification
//!
//! Discovery and download only see the [`Fetcher`] trait, so tests can swap
//! in fetchers with artificial delays or failures.

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::FetchError;
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;

/// Source of page bodies and asset bytes
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches a page and returns its body as text
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError>;

    /// Fetches an asset and returns its raw bytes
    async fn fetch_asset(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `crawler` - Crawler settings (request timeout)
///
/// # Example
///
/// ```no_run
/// use gw2walls::config::{CrawlerConfig, UserAgentConfig};
/// use gw2walls::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), &CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(crawler.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`Fetcher`] backed by a shared `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Wraps an already configured client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client from configuration and wraps it
    pub fn from_config(
        user_agent: &UserAgentConfig,
        crawler: &CrawlerConfig,
    ) -> Result<Self, reqwest::Error> {
        build_http_client(user_agent, crawler).map(Self::new)
    }

    /// Sends a GET request and rejects non-success statuses
    async fn get(&self, url: &str) -> Result<Response, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let response = self.get(url).await?;
        response.text().await.map_err(|e| classify_error(url, e))
    }

    async fn fetch_asset(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.get(url).await?;
        let bytes = response.bytes().await.map_err(|e| classify_error(url, e))?;
        Ok(bytes.to_vec())
    }
}

/// Maps a transport error to a [`FetchError`]
fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
