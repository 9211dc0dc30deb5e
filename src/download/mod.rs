//! Download module
//!
//! This module handles the consuming side of the pipeline:
//! - Filtering discovered links by dimension
//! - Bounding concurrent downloads with a counting gate
//! - Writing wallpapers to the output directory
//! - Reporting per-item outcomes

mod gate;
mod report;
mod retriever;

pub use gate::{GatePermit, ResourceGate};
pub use report::{print_report, DownloadFailure, DownloadReport};
pub use retriever::{DownloadHandle, Retriever, RetrieverOptions};
