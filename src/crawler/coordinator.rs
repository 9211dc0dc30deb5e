//! Crawler coordinator - recursive page discovery
//!
//! Every page gets its own task. Tasks are spawned on a single shared
//! [`TaskTracker`], which counts outstanding work across the whole tree: a
//! child page is registered with the tracker while its parent is still
//! running, so the count cannot reach zero while a child is about to start.
//!
//! Fan-out is unbounded. The site exposes tens of release pages, not millions.

use crate::crawler::extractor::Extractor;
use crate::crawler::fetcher::Fetcher;
use crate::link::LinkRecord;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use url::Url;

/// Counters gathered while a crawl runs
#[derive(Debug, Default)]
struct CrawlCounters {
    pages_scanned: AtomicUsize,
    pages_failed: AtomicUsize,
    links_found: AtomicUsize,
    links_sent: AtomicUsize,
    children_found: AtomicUsize,
}

/// Summary returned once discovery has finished
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Pages fetched and scanned
    pub pages_scanned: usize,

    /// Pages that could not be fetched
    pub pages_failed: usize,

    /// Wallpaper links extracted
    pub links_found: usize,

    /// Wallpaper links handed to the link channel
    pub links_sent: usize,

    /// Child pages scheduled
    pub children_found: usize,
}

/// Shared state cloned into every page task
struct CrawlContext {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<Extractor>,
    tracker: TaskTracker,
    links: mpsc::Sender<LinkRecord>,
    cancel: CancellationToken,
    counters: Arc<CrawlCounters>,
}

/// Recursive page discovery
pub struct Crawler {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<Extractor>,
    cancel: CancellationToken,
}

impl Crawler {
    /// Creates a crawler
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Source of page bodies
    /// * `extractor` - Page scanner deciding what each page yields
    /// * `cancel` - Token stopping every page task at its next suspension point
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        extractor: Extractor,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            fetcher,
            extractor: Arc::new(extractor),
            cancel,
        }
    }

    /// Starts scanning `entry_points`, sending every record found to `links`
    ///
    /// Each page task holds its own clone of `links`; once the returned handle
    /// has been waited on, no task will send again.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, entry_points: Vec<Url>, links: mpsc::Sender<LinkRecord>) -> CrawlHandle {
        let tracker = TaskTracker::new();
        let counters = Arc::new(CrawlCounters::default());

        let context = Arc::new(CrawlContext {
            fetcher: Arc::clone(&self.fetcher),
            extractor: Arc::clone(&self.extractor),
            tracker: tracker.clone(),
            links,
            cancel: self.cancel.clone(),
            counters: Arc::clone(&counters),
        });

        tracing::debug!("Starting discovery from {} entry points", entry_points.len());
        for url in entry_points {
            spawn_page_task(&context, url);
        }

        // Closing only lets wait() finish once the count is zero; tasks can
        // still spawn children.
        tracker.close();

        CrawlHandle {
            tracker,
            counters,
            started_at: Instant::now(),
        }
    }
}

/// Completion handle for a running crawl
#[derive(Debug)]
pub struct CrawlHandle {
    tracker: TaskTracker,
    counters: Arc<CrawlCounters>,
    started_at: Instant,
}

impl CrawlHandle {
    /// Waits until every page task, including transitively spawned ones, is done
    pub async fn wait(&self) -> CrawlSummary {
        self.tracker.wait().await;
        tracing::debug!("Discovery finished in {:?}", self.started_at.elapsed());
        self.summary()
    }

    /// Number of page tasks still running
    pub fn outstanding(&self) -> usize {
        self.tracker.len()
    }

    /// Returns true once all page tasks have finished
    pub fn is_finished(&self) -> bool {
        self.tracker.is_closed() && self.tracker.is_empty()
    }

    /// Current counter values
    pub fn summary(&self) -> CrawlSummary {
        let c = &self.counters;
        CrawlSummary {
            pages_scanned: c.pages_scanned.load(Ordering::Relaxed),
            pages_failed: c.pages_failed.load(Ordering::Relaxed),
            links_found: c.links_found.load(Ordering::Relaxed),
            links_sent: c.links_sent.load(Ordering::Relaxed),
            children_found: c.children_found.load(Ordering::Relaxed),
        }
    }
}

/// Registers and spawns one page task on the shared tracker
fn spawn_page_task(context: &Arc<CrawlContext>, url: Url) {
    let task_context = Arc::clone(context);
    context.tracker.spawn(async move {
        scan_page(task_context, url).await;
    });
}

/// Fetches and scans one page, spawning a task per child page
///
/// Failures are logged and end only this task.
async fn scan_page(context: Arc<CrawlContext>, url: Url) {
    tracing::info!("Getting links from: {}", url);

    let fetched = tokio::select! {
        _ = context.cancel.cancelled() => {
            tracing::debug!(url = %url, "Scan cancelled before fetch completed");
            return;
        }
        result = context.fetcher.fetch_page(url.as_str()) => result,
    };

    let body = match fetched {
        Ok(body) => body,
        Err(e) => {
            tracing::error!(url = %url, "Failed to fetch page: {}", e);
            context.counters.pages_failed.fetch_add(1, Ordering::Relaxed);
            return;
        }
    };

    let scan = context.extractor.scan(&body, url.as_str());
    context.counters.pages_scanned.fetch_add(1, Ordering::Relaxed);
    context
        .counters
        .links_found
        .fetch_add(scan.links.len(), Ordering::Relaxed);
    context
        .counters
        .children_found
        .fetch_add(scan.children.len(), Ordering::Relaxed);

    if !scan.rejected_hrefs.is_empty() {
        tracing::warn!(
            url = %url,
            "Skipped {} links that could not be resolved",
            scan.rejected_hrefs.len()
        );
    }

    // Children are registered before this task can finish.
    for child in scan.children {
        spawn_page_task(&context, child);
    }

    for record in scan.links {
        let sent = tokio::select! {
            _ = context.cancel.cancelled() => {
                tracing::debug!(url = %url, "Scan cancelled while sending links");
                return;
            }
            result = context.links.send(record) => result,
        };

        if let Err(e) = sent {
            tracing::debug!(url = %url, "Link channel closed, dropping {}", e.0);
            return;
        }
        context.counters.links_sent.fetch_add(1, Ordering::Relaxed);
    }

    tracing::debug!("Finished processing {}", url);
}
