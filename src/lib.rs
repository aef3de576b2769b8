// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # cdx-harvest
//!
//! A resilient harvester for CDX snapshot indexes: walks a cursor-paginated
//! HTTP API page by page and hands back every record it saw, even when the
//! scan dies halfway through.
//!
//! ## Features
//!
//! - **Cursor Pagination**: Follows `showResumeKey` continuation cursors until
//!   the index is exhausted
//! - **Bounded Retries**: Exponential backoff for rate limits (429/503) and
//!   transient failures, with a hard attempt budget
//! - **Cooperative Cancellation**: Poll-based cancel signal honored between
//!   pages, during backoff waits, and while a request is in flight
//! - **Partial Results**: A failed scan salvages every record fetched so far,
//!   plus a timestamped diagnostic trace and a resume cursor
//! - **Request Pacing**: Token-bucket rate limiting to stay polite toward the
//!   remote index
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cdx_harvest::{FetchConfig, NeverCancelled, Result, ScanEngine};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut engine = ScanEngine::from_config(FetchConfig::default())?;
//!
//!     let records = engine
//!         .run("example.com", &NeverCancelled, |progress| {
//!             println!("page {}: {} records so far", progress.page_number, progress.records.len());
//!             Ok(())
//!         })
//!         .await
//!         .map_err(|failure| failure.error)?;
//!
//!     println!("harvested {} snapshots", records.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         ScanEngine                              │
//! │  run(target, signal, on_progress) → Vec<SnapshotRecord>         │
//! │  run_from(target, cursor, ...)    → resume a failed scan        │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │  Retry   │   HTTP    │    Parse      │  Cancel   │    Diag     │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Classify │ GET       │ Row arrays    │ Flag      │ Trace log   │
//! │ Backoff  │ Timeout   │ Resume key    │ Token     │ Heartbeat   │
//! │ Budget   │ Rate limit│ Header skip   │ Closure   │             │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)] // TODO: Add docs before 1.0 release

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the harvester
pub mod error;

/// Common types: snapshot records and parsed pages
pub mod types;

/// Scan and pacing configuration
pub mod config;

/// Cooperative cancellation signals
pub mod cancel;

/// Timestamped diagnostics trace
pub mod diag;

/// Background liveness heartbeat
pub mod heartbeat;

/// Row-array response parsing
pub mod parse;

/// Retry classification and backoff policy
pub mod retry;

/// HTTP page fetching with pacing and timeouts
pub mod http;

/// Main scan engine
pub mod engine;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::{Page, SnapshotRecord};

// Re-export commonly used types
pub use cancel::{CancelFlag, CancelSignal, NeverCancelled};
pub use config::{FetchConfig, PacerConfig};
pub use diag::DiagnosticsLog;
pub use engine::{Progress, ScanEngine, ScanFailure, ScanStats};
pub use heartbeat::Heartbeat;
pub use http::{PageFetcher, PageSource, RequestPacer};
pub use parse::parse_page;
pub use retry::{RetryCondition, RetryDecision, RetryPolicy};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
