//! Engine types
//!
//! Progress reporting, scan statistics, and the salvage-carrying failure
//! type returned when a scan dies partway through.

use crate::diag::DiagnosticsLog;
use crate::error::Error;
use crate::types::SnapshotRecord;
use thiserror::Error as ThisError;

/// A progress report delivered after each successfully fetched page
#[derive(Debug)]
pub struct Progress<'a> {
    /// Every record accumulated so far, in fetch order
    pub records: &'a [SnapshotRecord],
    /// One-based number of the page just fetched
    pub page_number: u64,
    /// Whether the upstream reported another page after this one
    pub has_more: bool,
    /// Diagnostics recorded so far in this scan
    pub diagnostics: &'a DiagnosticsLog,
}

/// A failed scan, carrying everything salvaged before the failure.
///
/// Records fetched from completed pages are never discarded; a caller can
/// persist them and resume later. The trace is the timestamped diagnostics
/// of the whole scan, one event per line.
#[derive(Debug, ThisError)]
#[error("{error}")]
pub struct ScanFailure {
    /// The terminal error
    #[source]
    pub error: Error,
    /// Records accumulated before the failure
    pub records: Vec<SnapshotRecord>,
    /// Timestamped diagnostics trace, newline-joined
    pub trace: String,
    /// Cursor of the page that was in flight or due next; empty when the
    /// scan never got past the first page. Resuming here refetches at most
    /// one already-salvaged page.
    pub resume_cursor: String,
}

impl ScanFailure {
    /// Check if the scan ended because cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.error.is_cancelled()
    }
}

/// Statistics from a scan
#[derive(Debug, Clone, Default)]
pub struct ScanStats {
    /// Total pages fetched
    pub pages_fetched: u64,
    /// Total records accumulated
    pub records_fetched: usize,
    /// Retries performed across all pages
    pub retries: u64,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl ScanStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fetched page
    pub fn add_page(&mut self) {
        self.pages_fetched += 1;
    }

    /// Add fetched records
    pub fn add_records(&mut self, count: usize) {
        self.records_fetched += count;
    }

    /// Add a retry
    pub fn add_retry(&mut self) {
        self.retries += 1;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
