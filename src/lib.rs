//! gw2walls: a concurrent wallpaper harvester
//!
//! This crate discovers wallpaper download links across a set of linked pages
//! and retrieves the ones matching a requested dimension. Discovery fans out one
//! task per page, feeding a bounded channel that a single consumer drains into a
//! bounded pool of downloads.

pub mod config;
pub mod crawler;
pub mod download;
pub mod link;
pub mod pipeline;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for gw2walls operations
#[derive(Debug, Error)]
pub enum WallsError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Operation cancelled")]
    Cancelled,
}

/// Errors raised while fetching a page or an asset
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("No content available at {url}")]
    NotFound { url: String },
}

impl FetchError {
    /// Returns the URL the failed request was aimed at
    pub fn url(&self) -> &str {
        match self {
            Self::Http { url, .. }
            | Self::Status { url, .. }
            | Self::Timeout { url }
            | Self::NotFound { url } => url,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for gw2walls operations
pub type Result<T> = std::result::Result<T, WallsError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlHandle, Crawler, Extractor, Fetcher, HttpFetcher};
pub use download::{DownloadHandle, DownloadReport, ResourceGate, Retriever};
pub use link::LinkRecord;
pub use pipeline::run_pipeline;
