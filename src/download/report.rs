//! Download outcome reporting
//!
//! Each accepted record ends in exactly one outcome. The retriever records
//! outcomes as tasks finish and hands back a [`DownloadReport`] once the
//! whole stage is done.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

/// Why a single download was abandoned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadFailure {
    /// Asset URL
    pub url: String,

    /// Intended destination
    pub destination: PathBuf,

    /// Error description
    pub message: String,
}

/// Outcome counts for one download stage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadReport {
    /// Records received from the link channel
    pub received: usize,

    /// Records matching the requested variant
    pub accepted: usize,

    /// Records dropped by the variant filter
    pub filtered: usize,

    /// Files written
    pub downloaded: usize,

    /// Files left alone because they already existed
    pub skipped: usize,

    /// Downloads that failed
    pub failed: usize,

    /// Downloads abandoned by cancellation
    pub cancelled: usize,

    /// Most downloads running at the same time
    pub peak_in_flight: usize,

    /// Details of every failed download
    pub failures: Vec<DownloadFailure>,
}

impl DownloadReport {
    /// Returns true if no accepted record failed or was cancelled
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.cancelled == 0
    }

    /// Number of accepted records that reached an outcome
    pub fn completed(&self) -> usize {
        self.downloaded + self.skipped + self.failed + self.cancelled
    }
}

/// Thread-safe collector shared by the download tasks
#[derive(Debug, Default)]
pub(crate) struct ReportCollector {
    inner: Mutex<DownloadReport>,
}

impl ReportCollector {
    fn lock(&self) -> MutexGuard<'_, DownloadReport> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn received(&self, accepted: bool) {
        let mut report = self.lock();
        report.received += 1;
        if accepted {
            report.accepted += 1;
        } else {
            report.filtered += 1;
        }
    }

    pub(crate) fn downloaded(&self) {
        self.lock().downloaded += 1;
    }

    pub(crate) fn skipped(&self) {
        self.lock().skipped += 1;
    }

    pub(crate) fn cancelled(&self) {
        self.lock().cancelled += 1;
    }

    pub(crate) fn failed(&self, failure: DownloadFailure) {
        let mut report = self.lock();
        report.failed += 1;
        report.failures.push(failure);
    }

    pub(crate) fn snapshot(&self, peak_in_flight: usize) -> DownloadReport {
        let mut report = self.lock().clone();
        report.peak_in_flight = peak_in_flight;
        report
    }
}

/// Prints a download report to stdout
pub fn print_report(report: &DownloadReport) {
    println!("=== Download Summary ===\n");

    println!("Links:");
    println!("  Received: {}", report.received);
    println!("  Matching dimension: {}", report.accepted);
    println!("  Filtered out: {}", report.filtered);
    println!();

    println!("Downloads:");
    println!("  Written: {}", report.downloaded);
    println!("  Skipped (already present): {}", report.skipped);
    println!("  Failed: {}", report.failed);
    if report.cancelled > 0 {
        println!("  Cancelled: {}", report.cancelled);
    }
    println!("  Peak concurrency: {}", report.peak_in_flight);
    println!();

    if !report.failures.is_empty() {
        println!("Failures ({}):", report.failures.len());
        for failure in &report.failures {
            println!("  - {}: {}", failure.url, failure.message);
        }
        println!();
    }
}
