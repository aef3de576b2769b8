//! Keep-alive heartbeat
//!
//! Long multi-page scans can outlive host idle timeouts, so the engine holds
//! a periodic no-op ticker for the duration of one run. The ticker is a
//! scoped resource: dropping the guard aborts the task, so every exit path
//! (success, failure, cancellation) stops it and a leaked timer is
//! impossible.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::trace;

/// Guard owning the heartbeat task. Alive exactly as long as one scan.
#[derive(Debug)]
pub struct Heartbeat {
    task: JoinHandle<()>,
    beats: Arc<AtomicU64>,
}

impl Heartbeat {
    /// Spawn the heartbeat ticker with the given interval
    pub fn start(interval: Duration) -> Self {
        let beats = Arc::new(AtomicU64::new(0));
        let counter = beats.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // the first tick of a tokio interval fires immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                counter.fetch_add(1, Ordering::Relaxed);
                trace!("keep-alive heartbeat");
            }
        });
        Self { task, beats }
    }

    /// Number of beats since the guard was created
    pub fn beats(&self) -> u64 {
        self.beats.load(Ordering::Relaxed)
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.task.abort();
    }
}
