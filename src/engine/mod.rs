//! Scan engine
//!
//! Drives a scan from the first page to the terminal page:
//!
//! - `ScanEngine` - walks the cursor chain, retrying each page within its
//!   budget and reporting progress after every page
//! - `Progress` - per-page report handed to the caller's callback
//! - `ScanFailure` - terminal error plus everything salvaged before it
//! - `ScanStats` - page, record, and retry counters for the scan

mod types;

pub use types::{Progress, ScanFailure, ScanStats};

use crate::cancel::CancelSignal;
use crate::config::FetchConfig;
use crate::diag::DiagnosticsLog;
use crate::error::{Error, Result};
use crate::heartbeat::Heartbeat;
use crate::http::{PageFetcher, PageSource};
use crate::retry::{RetryCondition, RetryDecision, RetryPolicy};
use crate::types::{Page, SnapshotRecord};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Scan engine for walking a paged index end to end
pub struct ScanEngine<S> {
    /// Page source (HTTP fetcher in production, scripted in tests)
    source: S,
    /// Scan configuration
    config: FetchConfig,
    /// Per-page retry policy derived from the config
    policy: RetryPolicy,
    /// Statistics
    stats: ScanStats,
}

impl ScanEngine<PageFetcher> {
    /// Create an engine backed by the HTTP page fetcher
    pub fn from_config(config: FetchConfig) -> Result<Self> {
        let source = PageFetcher::new(config.clone())?;
        Ok(Self::new(source, config))
    }
}

impl<S: PageSource> ScanEngine<S> {
    /// Create a new scan engine over any page source
    pub fn new(source: S, config: FetchConfig) -> Self {
        let policy = RetryPolicy::from_config(&config);
        Self {
            source,
            config,
            policy,
            stats: ScanStats::default(),
        }
    }

    /// Get statistics
    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    /// Reset statistics
    pub fn reset_stats(&mut self) {
        self.stats = ScanStats::default();
    }

    /// Scan every page for `target`, invoking `on_progress` after each
    /// fetched page.
    ///
    /// On success returns all accumulated records in upstream order. On
    /// failure the records fetched so far and the diagnostics trace ride
    /// along in the [`ScanFailure`]; an `Err` from `on_progress` aborts
    /// the scan the same way.
    ///
    /// A keep-alive heartbeat runs for exactly the duration of this call.
    pub async fn run<F>(
        &mut self,
        target: &str,
        signal: &dyn CancelSignal,
        on_progress: F,
    ) -> std::result::Result<Vec<SnapshotRecord>, ScanFailure>
    where
        F: FnMut(Progress<'_>) -> Result<()>,
    {
        self.run_from(target, "", signal, on_progress).await
    }

    /// Scan starting from a previously reported resume cursor.
    ///
    /// An empty `start_cursor` behaves like [`run`](Self::run). Only pages
    /// from the cursor onward are fetched; page numbering and accumulated
    /// records restart at the resume point.
    pub async fn run_from<F>(
        &mut self,
        target: &str,
        start_cursor: &str,
        signal: &dyn CancelSignal,
        mut on_progress: F,
    ) -> std::result::Result<Vec<SnapshotRecord>, ScanFailure>
    where
        F: FnMut(Progress<'_>) -> Result<()>,
    {
        let started = Instant::now();
        let _heartbeat = Heartbeat::start(self.config.heartbeat_interval);
        let mut log = DiagnosticsLog::new();
        let mut records = Vec::new();
        let mut cursor = start_cursor.to_string();

        info!("starting scan of {}", target);
        let outcome = self
            .drive(target, &mut cursor, signal, &mut log, &mut records, &mut on_progress)
            .await;

        self.stats.set_duration(started.elapsed().as_millis() as u64);

        match outcome {
            Ok(()) => {
                info!(
                    "scan of {} complete: {} records in {} pages ({} retries)",
                    target,
                    records.len(),
                    self.stats.pages_fetched,
                    self.stats.retries
                );
                Ok(records)
            }
            Err(error) => {
                log.record(format!("scan failed: {error}"));
                warn!("scan of {} failed: {}", target, error);
                Err(ScanFailure {
                    error,
                    records,
                    trace: log.to_trace(),
                    resume_cursor: cursor,
                })
            }
        }
    }

    /// The page loop: fetch, accumulate, report, follow the cursor.
    ///
    /// `cursor` always names the page being fetched; it advances only after
    /// a page has been fully delivered, so on failure it is the right place
    /// to resume from.
    async fn drive<F>(
        &mut self,
        target: &str,
        cursor: &mut String,
        signal: &dyn CancelSignal,
        log: &mut DiagnosticsLog,
        records: &mut Vec<SnapshotRecord>,
        on_progress: &mut F,
    ) -> Result<()>
    where
        F: FnMut(Progress<'_>) -> Result<()>,
    {
        let mut page_number: u64 = 0;

        loop {
            if signal.is_cancelled() {
                log.record("cancellation requested; stopping before next page");
                return Err(Error::Cancelled);
            }

            page_number += 1;
            debug!("fetching page {} (cursor {:?})", page_number, cursor);
            log.record(format!("fetching page {page_number}"));

            let page = self
                .fetch_page_with_retries(target, cursor.as_str(), signal, log)
                .await?;

            self.stats.add_page();
            self.stats.add_records(page.records.len());
            records.extend(page.records);

            // A cancellation that landed while the page was in flight still
            // keeps the page's records for salvage, but no further progress
            // is reported.
            if signal.is_cancelled() {
                log.record("cancellation requested; stopping after page fetch");
                return Err(Error::Cancelled);
            }

            on_progress(Progress {
                records: records.as_slice(),
                page_number,
                has_more: page.has_more,
                diagnostics: log,
            })?;

            if !page.has_more {
                log.record(format!(
                    "scan complete: {} records in {page_number} pages",
                    records.len()
                ));
                return Ok(());
            }
            if page.cursor.is_empty() {
                return Err(Error::malformed(
                    "continuation signalled without a resume cursor",
                ));
            }
            *cursor = page.cursor;
        }
    }

    /// Fetch one page, retrying within the per-page budget.
    ///
    /// The attempt counter is explicit; every retryable failure either
    /// schedules a doubled backoff or exhausts the budget.
    async fn fetch_page_with_retries(
        &mut self,
        target: &str,
        cursor: &str,
        signal: &dyn CancelSignal,
        log: &mut DiagnosticsLog,
    ) -> Result<Page> {
        let mut attempt: u32 = 0;

        loop {
            match self.source.fetch_page(target, cursor, signal, log).await {
                Ok(page) => return Ok(page),
                Err(err) => {
                    let Some(condition) = RetryCondition::classify(&err) else {
                        return Err(err);
                    };

                    match self.policy.decide(&condition, attempt) {
                        RetryDecision::Retry { delay } => {
                            self.stats.add_retry();
                            warn!(
                                "attempt {}/{} failed: {}; retrying in {:?}",
                                attempt + 1,
                                self.policy.max_retries,
                                condition,
                                delay
                            );
                            log.record(format!(
                                "attempt {}/{}: {condition}; retrying in {}ms",
                                attempt + 1,
                                self.policy.max_retries,
                                delay.as_millis()
                            ));
                            self.policy.backoff_wait(delay, signal, log).await?;
                            attempt += 1;
                        }
                        RetryDecision::GiveUp(exhausted) => {
                            log.record(format!(
                                "attempt {}/{}: {condition}; retry budget exhausted",
                                attempt + 1,
                                self.policy.max_retries
                            ));
                            return Err(exhausted);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests;
