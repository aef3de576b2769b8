//! Client-side request pacing
//!
//! Uses the governor crate for token bucket pacing, keeping a long scan
//! inside the public index's tolerated request rate even when pages come
//! back quickly.

use crate::cancel::CancelSignal;
use crate::config::PacerConfig;
use crate::error::{Error, Result};
use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Token bucket pacer for outbound page requests
#[derive(Clone)]
pub struct RequestPacer {
    limiter: Arc<Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>>,
}

impl RequestPacer {
    /// Create a pacer with the given config
    pub fn new(config: &PacerConfig) -> Self {
        let quota = Quota::per_second(
            NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::new(1).unwrap()),
        )
        .allow_burst(NonZeroU32::new(config.burst_size).unwrap_or(NonZeroU32::new(1).unwrap()));

        Self {
            limiter: Arc::new(Governor::direct(quota)),
        }
    }

    /// Wait until the next request is allowed
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }

    /// Wait until the next request is allowed, polling the cancellation
    /// signal every `poll` in the meantime.
    pub async fn wait_cancellable(&self, signal: &dyn CancelSignal, poll: Duration) -> Result<()> {
        let ready = self.limiter.until_ready();
        tokio::pin!(ready);
        let mut ticker = tokio::time::interval(poll);

        loop {
            tokio::select! {
                () = &mut ready => return Ok(()),
                _ = ticker.tick() => {
                    if signal.is_cancelled() {
                        return Err(Error::Cancelled);
                    }
                }
            }
        }
    }

    /// Check if a request can go out immediately
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

impl std::fmt::Debug for RequestPacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPacer").finish()
    }
}
