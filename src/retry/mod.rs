//! Retry classification and backoff policy
//!
//! Decides, for each failed page attempt, whether the failure is worth
//! another attempt and how long to wait before it. Backoff waits are
//! decomposed into short ticks so a cancellation request interrupts them
//! instead of running the full delay.

use crate::cancel::CancelSignal;
use crate::config::FetchConfig;
use crate::diag::DiagnosticsLog;
use crate::error::{Error, Result};
use std::fmt;
use std::time::Duration;
use tokio::time::sleep;

// ============================================================================
// Retry Condition
// ============================================================================

/// A failure mode that qualifies for another attempt.
///
/// Everything else (4xx other than 429, 5xx other than 503, malformed
/// bodies, cancellation) is fatal for the page and never reaches the
/// backoff path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryCondition {
    /// Upstream throttled the request (HTTP 429 or 503)
    RateLimited { status: u16 },
    /// The attempt exceeded the page timeout
    TimedOut { elapsed_ms: u64 },
    /// The request failed below HTTP (DNS, connect, reset, decode)
    Network { message: String },
}

impl RetryCondition {
    /// Classify an attempt error, returning `None` for fatal errors
    pub fn classify(error: &Error) -> Option<Self> {
        match error {
            Error::RateLimited { status } => Some(Self::RateLimited { status: *status }),
            Error::Timeout { elapsed_ms } => Some(Self::TimedOut {
                elapsed_ms: *elapsed_ms,
            }),
            Error::Network { message } => Some(Self::Network {
                message: message.clone(),
            }),
            _ => None,
        }
    }

    /// The error reported once every attempt for a page has failed this way
    fn into_exhaustion(self, attempts: u32) -> Error {
        match self {
            Self::TimedOut { .. } => Error::TimeoutExhausted { attempts },
            Self::RateLimited { .. } => Error::RateLimitExhausted { attempts },
            Self::Network { message } => Error::Network {
                message: format!("{message} (after {attempts} attempts)"),
            },
        }
    }
}

impl fmt::Display for RetryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited { status } => write!(f, "rate limited (HTTP {status})"),
            Self::TimedOut { elapsed_ms } => write!(f, "timed out after {elapsed_ms}ms"),
            Self::Network { message } => write!(f, "network error: {message}"),
        }
    }
}

// ============================================================================
// Retry Decision
// ============================================================================

/// What to do after a failed attempt
#[derive(Debug)]
pub enum RetryDecision {
    /// Wait out the delay, then try the page again
    Retry { delay: Duration },
    /// Attempts are exhausted; fail the page with this error
    GiveUp(Error),
}

// ============================================================================
// Retry Policy
// ============================================================================

/// Per-page retry budget and backoff tuning
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum attempts per page, the first included
    pub max_retries: u32,
    /// Backoff base for rate-limit conditions
    pub rate_limit_base: Duration,
    /// Backoff base for timeout and network conditions
    pub transient_base: Duration,
    /// Granularity of interruptible backoff sleeps
    pub tick: Duration,
}

impl RetryPolicy {
    /// Derive the policy from a fetch config
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            rate_limit_base: config.rate_limit_backoff_base,
            transient_base: config.retry_backoff_base,
            tick: config.backoff_tick,
        }
    }

    /// Decide the next step after attempt `attempt` (zero-based) failed
    /// with a retryable condition.
    pub fn decide(&self, condition: &RetryCondition, attempt: u32) -> RetryDecision {
        let attempts_made = attempt + 1;
        if attempts_made >= self.max_retries {
            return RetryDecision::GiveUp(condition.clone().into_exhaustion(attempts_made));
        }
        RetryDecision::Retry {
            delay: self.backoff_delay(condition, attempt),
        }
    }

    /// Backoff delay before the attempt after `attempt`: the condition's
    /// base doubled once per prior failure.
    pub fn backoff_delay(&self, condition: &RetryCondition, attempt: u32) -> Duration {
        let base = match condition {
            RetryCondition::RateLimited { .. } => self.rate_limit_base,
            RetryCondition::TimedOut { .. } | RetryCondition::Network { .. } => {
                self.transient_base
            }
        };
        base * 2u32.saturating_pow(attempt)
    }

    /// Sleep out a backoff delay in `tick`-sized slices, checking the
    /// cancellation signal between slices and once after the last.
    ///
    /// Worst-case cancellation latency during backoff is one tick.
    pub async fn backoff_wait(
        &self,
        delay: Duration,
        signal: &dyn CancelSignal,
        log: &mut DiagnosticsLog,
    ) -> Result<()> {
        let mut remaining = delay;
        while !remaining.is_zero() {
            if signal.is_cancelled() {
                log.record("cancelled during backoff wait");
                return Err(Error::Cancelled);
            }
            let slice = remaining.min(self.tick);
            sleep(slice).await;
            remaining = remaining.saturating_sub(slice);
        }
        if signal.is_cancelled() {
            log.record("cancelled during backoff wait");
            return Err(Error::Cancelled);
        }
        Ok(())
    }
}
