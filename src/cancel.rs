//! Cancellation signalling
//!
//! The scan is cancelled cooperatively: the caller owns some cancel-requested
//! state and the orchestrator polls it at every suspension point (before each
//! page, while a request is in flight, between backoff ticks). Nothing here
//! preempts; latency to honour a cancel is bounded by the poll interval.
//!
//! `CancelSignal` is the polled trait. It is satisfied by the built-in
//! [`CancelFlag`], by any `Fn() -> bool` closure (for hosts whose flag lives
//! behind their own persistence), and by `tokio_util`'s `CancellationToken`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// Polled source of truth for "has this operation been cancelled?"
///
/// Single writer (the host), many readers (fetcher, retry policy, engine
/// loop). Implementations must be cheap to poll.
pub trait CancelSignal: Send + Sync {
    /// Current cancel-requested state
    fn is_cancelled(&self) -> bool;
}

/// Shared atomic cancellation flag.
///
/// Clone it freely; all clones observe the same flag. `cancel()` is
/// idempotent.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancelFlag {
    /// Create a new, un-cancelled flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

impl CancelSignal for CancelFlag {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// A signal that never fires, for callers without cancellation support
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancelled;

impl CancelSignal for NeverCancelled {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Closure adapter: any `Fn() -> bool` is a cancellation signal.
///
/// This is the seam for hosts that keep the flag in their own storage and
/// want the scan to poll it.
impl<F> CancelSignal for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_cancelled(&self) -> bool {
        self()
    }
}

impl CancelSignal for CancellationToken {
    fn is_cancelled(&self) -> bool {
        CancellationToken::is_cancelled(self)
    }
}
