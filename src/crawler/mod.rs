//! Crawler module for wallpaper discovery
//!
//! This module contains the discovery side of the pipeline, including:
//! - HTTP fetching behind the [`Fetcher`] trait
//! - Page scanning for wallpaper listings and release links
//! - Recursive, one-task-per-page crawl coordination

mod coordinator;
mod extractor;
mod fetcher;

pub use coordinator::{CrawlHandle, CrawlSummary, Crawler};
pub use extractor::{Extractor, PageScan, CROP_SUFFIX, MEDIA_LABEL};
pub use fetcher::{build_http_client, Fetcher, HttpFetcher};

use crate::config::Config;
use crate::url::{entry_url, parse_site_origin};
use crate::UrlResult;
use url::Url;

/// Builds the list of root pages to scan from configuration
///
/// The releases index comes first, then the media page; either is left out
/// when its skip flag is set.
pub fn entry_points(config: &Config) -> UrlResult<Vec<Url>> {
    let origin = parse_site_origin(&config.site.base_url)?;
    let mut entries = Vec::with_capacity(2);

    if !config.crawler.skip_releases {
        entries.push(entry_url(&origin, &config.site.releases_path)?);
    }

    if !config.crawler.skip_media {
        entries.push(entry_url(&origin, &config.site.media_path)?);
    }

    Ok(entries)
}

/// Builds the extractor described by the site configuration
pub fn extractor_for(config: &Config) -> UrlResult<Extractor> {
    let origin = parse_site_origin(&config.site.base_url)?;
    Ok(Extractor::new(origin, config.site.title_suffix.clone()))
}
