//! Page fetching over HTTP
//!
//! Turns one (target, cursor) pair into one parsed index page:
//!
//! - **Pacing**: token bucket pacing of outbound requests using governor
//! - **Timeout**: a per-attempt deadline raced against the request
//! - **Cancellation**: the signal is polled while the request is in flight
//! - **Classification**: throttling statuses become retryable errors,
//!   everything else non-2xx is fatal

mod fetcher;
mod rate_limit;

pub use fetcher::PageFetcher;
pub use rate_limit::RequestPacer;

use crate::cancel::CancelSignal;
use crate::diag::DiagnosticsLog;
use crate::error::Result;
use crate::types::Page;
use async_trait::async_trait;

/// A source of index pages.
///
/// The scan engine drives pagination through this seam; production code
/// uses [`PageFetcher`], tests substitute scripted sources.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch a single page for `target`.
    ///
    /// An empty `cursor` requests the first page. One call is one attempt;
    /// retrying is the caller's job. Attempt-level events are appended to
    /// `log`.
    async fn fetch_page(
        &self,
        target: &str,
        cursor: &str,
        signal: &dyn CancelSignal,
        log: &mut DiagnosticsLog,
    ) -> Result<Page>;
}
