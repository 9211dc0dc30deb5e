//! Retriever - bounded-concurrency wallpaper downloads
//!
//! A single consumer task drains the link channel and spawns one download task
//! per record matching the requested dimension. Download tasks take a unit
//! from the [`ResourceGate`] before fetching and hold it until the file is
//! written, so at most `max_parallel` downloads run at once however many
//! records are waiting.

use crate::config::DownloadConfig;
use crate::crawler::Fetcher;
use crate::download::gate::ResourceGate;
use crate::download::report::{DownloadFailure, DownloadReport, ReportCollector};
use crate::link::LinkRecord;
use crate::WallsError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Bytes written between cancellation checks
const WRITE_CHUNK_SIZE: usize = 64 * 1024;

/// Suffix of files still being written
const PARTIAL_SUFFIX: &str = ".part";

/// Settings for one download stage
#[derive(Debug, Clone)]
pub struct RetrieverOptions {
    /// Directory files are written to
    pub output_dir: PathBuf,

    /// Variant key a record must carry to be downloaded
    pub variant: String,

    /// Maximum number of concurrent downloads
    pub max_parallel: usize,

    /// Overwrite existing files (with a warning) instead of skipping them
    pub overwrite_existing: bool,

    /// Append a digest of the source URL to every file name
    pub disambiguate_names: bool,
}

impl From<&DownloadConfig> for RetrieverOptions {
    fn from(config: &DownloadConfig) -> Self {
        Self {
            output_dir: config.output_path.clone(),
            variant: config.dimension.clone(),
            max_parallel: config.max_parallel,
            overwrite_existing: config.overwrite_existing,
            disambiguate_names: config.disambiguate_names,
        }
    }
}

/// What happened to one accepted record
#[derive(Debug, Clone, PartialEq, Eq)]
enum WriteOutcome {
    Written(PathBuf),
    Skipped(PathBuf),
}

/// Shared state cloned into the consumer and every download task
struct RetrieveContext {
    fetcher: Arc<dyn Fetcher>,
    options: RetrieverOptions,
    gate: ResourceGate,
    tracker: TaskTracker,
    cancel: CancellationToken,
    report: Arc<ReportCollector>,
}

/// Consumer side of the pipeline
pub struct Retriever {
    fetcher: Arc<dyn Fetcher>,
    options: RetrieverOptions,
    cancel: CancellationToken,
}

impl Retriever {
    /// Creates a retriever
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        options: RetrieverOptions,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            fetcher,
            options,
            cancel,
        }
    }

    /// Starts draining `links`
    ///
    /// The returned handle completes once the channel is closed and drained
    /// and every download it spawned has finished.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, links: mpsc::Receiver<LinkRecord>) -> DownloadHandle {
        let tracker = TaskTracker::new();
        let gate = ResourceGate::new(self.options.max_parallel);
        let report = Arc::new(ReportCollector::default());

        tracing::debug!(
            "Setting up a download gate with a max of {}",
            gate.capacity()
        );

        let context = Arc::new(RetrieveContext {
            fetcher: Arc::clone(&self.fetcher),
            options: self.options.clone(),
            gate: gate.clone(),
            tracker: tracker.clone(),
            cancel: self.cancel.clone(),
            report: Arc::clone(&report),
        });

        tracker.spawn(consume_links(context, links));
        tracker.close();

        DownloadHandle {
            tracker,
            gate,
            report,
        }
    }
}

/// Completion handle for a running download stage
#[derive(Debug)]
pub struct DownloadHandle {
    tracker: TaskTracker,
    gate: ResourceGate,
    report: Arc<ReportCollector>,
}

impl DownloadHandle {
    /// Waits for the consumer loop and every download task, then reports
    pub async fn wait(&self) -> DownloadReport {
        self.tracker.wait().await;
        self.report.snapshot(self.gate.peak())
    }

    /// The gate bounding this stage, for live inspection
    pub fn gate(&self) -> &ResourceGate {
        &self.gate
    }

    /// Returns true once the consumer and all downloads have finished
    pub fn is_finished(&self) -> bool {
        self.tracker.is_closed() && self.tracker.is_empty()
    }
}

/// Receives records until the channel is closed and drained
async fn consume_links(context: Arc<RetrieveContext>, mut links: mpsc::Receiver<LinkRecord>) {
    loop {
        let next = tokio::select! {
            biased;
            _ = context.cancel.cancelled() => {
                abandon_buffered(&context, &mut links);
                break;
            }
            next = links.recv() => next,
        };

        let Some(record) = next else {
            tracing::debug!("Link channel closed.");
            break;
        };

        let accepted = record.matches_variant(&context.options.variant);
        context.report.received(accepted);
        if !accepted {
            tracing::trace!("Skipping {} (dimension {})", record, record.variant_key());
            continue;
        }

        // Registered before the consumer can exit.
        let task_context = Arc::clone(&context);
        context.tracker.spawn(async move {
            download(task_context, record).await;
        });
    }
}

/// Closes the channel after cancellation and counts what was still queued
fn abandon_buffered(context: &RetrieveContext, links: &mut mpsc::Receiver<LinkRecord>) {
    links.close();
    let mut abandoned = 0;
    while let Ok(record) = links.try_recv() {
        let accepted = record.matches_variant(&context.options.variant);
        context.report.received(accepted);
        if accepted {
            context.report.cancelled();
            abandoned += 1;
        }
    }
    tracing::warn!("Download cancelled with {} matching links still queued", abandoned);
}

/// Downloads one record, recording its outcome
async fn download(context: Arc<RetrieveContext>, record: LinkRecord) {
    let destination = record.destination(
        &context.options.output_dir,
        context.options.disambiguate_names,
    );

    let permit = tokio::select! {
        _ = context.cancel.cancelled() => None,
        permit = context.gate.acquire() => permit.ok(),
    };
    let Some(_permit) = permit else {
        tracing::debug!(url = record.source_url(), "Download cancelled while waiting");
        context.report.cancelled();
        return;
    };

    tracing::debug!(
        url = record.source_url(),
        in_flight = context.gate.in_flight(),
        "Downloading"
    );
    let started_at = Instant::now();

    let result = fetch_to_disk(&context, &record, &destination).await;
    let elapsed = started_at.elapsed();

    match result {
        Ok(WriteOutcome::Written(path)) => {
            tracing::info!("Downloaded {} ({:?})", path.display(), elapsed);
            context.report.downloaded();
        }
        Ok(WriteOutcome::Skipped(path)) => {
            tracing::info!("Kept existing {}", path.display());
            context.report.skipped();
        }
        Err(WallsError::Cancelled) => {
            tracing::debug!(url = record.source_url(), "Download cancelled");
            context.report.cancelled();
        }
        Err(e) => {
            tracing::error!("Error downloading {} ({:?}): {}", record, elapsed, e);
            context.report.failed(DownloadFailure {
                url: record.source_url().to_string(),
                destination,
                message: e.to_string(),
            });
        }
    }

    tracing::trace!("Finished (in flight {})", context.gate.in_flight());
}

/// Fetches the asset and writes it to `destination`
///
/// The fetch is abandoned as soon as the run is cancelled. The write checks
/// the token between chunks and has always finished when this returns.
async fn fetch_to_disk(
    context: &RetrieveContext,
    record: &LinkRecord,
    destination: &Path,
) -> Result<WriteOutcome, WallsError> {
    let exists = tokio::fs::try_exists(destination)
        .await
        .map_err(|e| io_error(destination, e))?;

    if exists && !context.options.overwrite_existing {
        return Ok(WriteOutcome::Skipped(destination.to_path_buf()));
    }

    let bytes = tokio::select! {
        _ = context.cancel.cancelled() => return Err(WallsError::Cancelled),
        fetched = context.fetcher.fetch_asset(record.source_url()) => fetched?,
    };

    if exists {
        tracing::warn!("Path {} already exists, overwriting.", destination.display());
    }

    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| io_error(parent, e))?;
    }

    write_file(&context.cancel, destination, &bytes).await?;

    Ok(WriteOutcome::Written(destination.to_path_buf()))
}

/// Writes `bytes` next to `destination` and renames the result into place
///
/// On any error or cancellation the partial file is removed, so
/// `destination` only ever holds a complete asset.
async fn write_file(
    cancel: &CancellationToken,
    destination: &Path,
    bytes: &[u8],
) -> Result<(), WallsError> {
    let partial = partial_path(destination);

    let result = match write_chunks(cancel, &partial, bytes).await {
        Ok(()) => tokio::fs::rename(&partial, destination)
            .await
            .map_err(|e| io_error(destination, e)),
        Err(e) => Err(e),
    };

    if result.is_err() {
        if let Err(e) = tokio::fs::remove_file(&partial).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove partial file {}: {}", partial.display(), e);
            }
        }
    }

    result
}

async fn write_chunks(
    cancel: &CancellationToken,
    path: &Path,
    bytes: &[u8],
) -> Result<(), WallsError> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| io_error(path, e))?;

    let mut cancelled = false;
    for chunk in bytes.chunks(WRITE_CHUNK_SIZE) {
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }
        file.write_all(chunk).await.map_err(|e| io_error(path, e))?;
    }

    // Waits for the last queued blocking write before the handle is dropped.
    file.flush().await.map_err(|e| io_error(path, e))?;

    if cancelled {
        return Err(WallsError::Cancelled);
    }
    Ok(())
}

/// Sibling path the asset is written to before it is complete
fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_os_string();
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

fn io_error(path: &Path, source: std::io::Error) -> WallsError {
    WallsError::Io {
        path: path.to_path_buf(),
        source,
    }
}
