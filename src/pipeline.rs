//! Discovery-to-download pipeline
//!
//! Wires the crawler and the retriever together around one bounded link
//! channel and enforces the shutdown order:
//!
//! 1. Open the channel
//! 2. Start discovery (producers) and download (consumer) concurrently
//! 3. Wait for discovery to finish
//! 4. Close the channel
//! 5. Wait for the retriever to drain the channel and finish every download

use crate::config::Config;
use crate::crawler::{entry_points, extractor_for, CrawlSummary, Crawler, Fetcher};
use crate::download::{DownloadReport, Retriever, RetrieverOptions};
use crate::WallsError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Outcome of a complete run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Discovery counters
    pub crawl: CrawlSummary,

    /// Download outcomes
    pub download: DownloadReport,

    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl RunReport {
    /// Returns true if every accepted download succeeded
    pub fn is_success(&self) -> bool {
        self.download.is_success()
    }
}

/// Runs discovery and download to completion
///
/// # Arguments
///
/// * `config` - The effective configuration
/// * `fetcher` - Shared by both stages
/// * `cancel` - Stops both stages at their next suspension point
///
/// # Returns
///
/// * `Ok(RunReport)` - Both stages finished; individual failures are in the report
/// * `Err(WallsError)` - The configuration could not be turned into entry points
///
/// # Example
///
/// ```no_run
/// use gw2walls::config::Config;
/// use gw2walls::crawler::HttpFetcher;
/// use gw2walls::pipeline::run_pipeline;
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::default();
/// let fetcher = HttpFetcher::from_config(&config.user_agent, &config.crawler)?;
/// let report = run_pipeline(&config, Arc::new(fetcher), CancellationToken::new()).await?;
/// println!("{} wallpapers downloaded", report.download.downloaded);
/// # Ok(())
/// # }
/// ```
pub async fn run_pipeline(
    config: &Config,
    fetcher: Arc<dyn Fetcher>,
    cancel: CancellationToken,
) -> Result<RunReport, WallsError> {
    let started_at = Instant::now();
    let entries = entry_points(config)?;
    let extractor = extractor_for(config)?;

    let crawler = Crawler::new(Arc::clone(&fetcher), extractor, cancel.clone());
    let retriever = Retriever::new(
        fetcher,
        RetrieverOptions::from(&config.download),
        cancel,
    );

    let (links_tx, links_rx) = mpsc::channel(config.download.queue_capacity.max(1));

    let crawl = crawler.start(entries, links_tx.clone());
    let download = retriever.start(links_rx);

    tracing::debug!("Waiting for discovery to finish...");
    let crawl_summary = crawl.wait().await;
    tracing::info!(
        "Discovery finished: {} pages scanned, {} failed, {} links found",
        crawl_summary.pages_scanned,
        crawl_summary.pages_failed,
        crawl_summary.links_found
    );

    // Last sender; every page task has already dropped its clone.
    drop(links_tx);

    tracing::debug!("Waiting for downloads to complete...");
    let download_report = download.wait().await;

    let elapsed = started_at.elapsed();
    tracing::info!("Finished in {:.2} seconds.", elapsed.as_secs_f64());

    Ok(RunReport {
        crawl: crawl_summary,
        download: download_report,
        elapsed,
    })
}
