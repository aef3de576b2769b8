//! Configuration for the fetch pipeline
//!
//! Every timing and retry constant of the orchestrator lives here so tests
//! and the CLI can override them. Defaults match the public index's
//! tolerances and are deliberately conservative.

use std::time::Duration;

/// Default index endpoint queried for archived snapshots.
pub const DEFAULT_BASE_URL: &str = "https://web.archive.org/cdx/search/cdx";

// ============================================================================
// Fetch Config
// ============================================================================

/// Configuration for a scan: endpoint, paging, timeouts, and retry tuning
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Base URL of the paged index API
    pub base_url: String,
    /// Maximum records requested per page
    pub page_size: u32,
    /// Maximum attempts per page before giving up
    pub max_retries: u32,
    /// Wall-clock timeout for a single page attempt
    pub page_timeout: Duration,
    /// Backoff base for rate-limit (429/503) retries
    pub rate_limit_backoff_base: Duration,
    /// Backoff base for timeout and transient network retries
    pub retry_backoff_base: Duration,
    /// How often the cancellation signal is polled while a request is in flight
    pub cancel_poll_interval: Duration,
    /// Granularity of interruptible backoff sleeps
    pub backoff_tick: Duration,
    /// Interval of the keep-alive heartbeat held for the duration of a scan
    pub heartbeat_interval: Duration,
    /// Client-side request pacing; `None` disables pacing
    pub pacing: Option<PacerConfig>,
    /// User agent string sent with every request
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: 1000,
            max_retries: 3,
            page_timeout: Duration::from_secs(60),
            rate_limit_backoff_base: Duration::from_secs(10),
            retry_backoff_base: Duration::from_secs(5),
            cancel_poll_interval: Duration::from_millis(500),
            backoff_tick: Duration::from_millis(250),
            heartbeat_interval: Duration::from_secs(25),
            pacing: Some(PacerConfig::default()),
            user_agent: format!("cdx-harvest/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl FetchConfig {
    /// Create a new config builder
    pub fn builder() -> FetchConfigBuilder {
        FetchConfigBuilder::default()
    }
}

/// Builder for fetch config
#[derive(Debug, Default)]
pub struct FetchConfigBuilder {
    config: FetchConfig,
}

impl FetchConfigBuilder {
    /// Set the index base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the page size limit
    pub fn page_size(mut self, size: u32) -> Self {
        self.config.page_size = size;
        self
    }

    /// Set max attempts per page
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set the per-page attempt timeout
    pub fn page_timeout(mut self, timeout: Duration) -> Self {
        self.config.page_timeout = timeout;
        self
    }

    /// Set both backoff bases
    pub fn backoff(mut self, rate_limit_base: Duration, retry_base: Duration) -> Self {
        self.config.rate_limit_backoff_base = rate_limit_base;
        self.config.retry_backoff_base = retry_base;
        self
    }

    /// Set the cancellation poll interval
    pub fn cancel_poll_interval(mut self, interval: Duration) -> Self {
        self.config.cancel_poll_interval = interval;
        self
    }

    /// Set the backoff tick granularity
    pub fn backoff_tick(mut self, tick: Duration) -> Self {
        self.config.backoff_tick = tick;
        self
    }

    /// Set the heartbeat interval
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.config.heartbeat_interval = interval;
        self
    }

    /// Set client-side pacing
    pub fn pacing(mut self, config: PacerConfig) -> Self {
        self.config.pacing = Some(config);
        self
    }

    /// Disable client-side pacing
    pub fn no_pacing(mut self) -> Self {
        self.config.pacing = None;
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> FetchConfig {
        self.config
    }
}

// ============================================================================
// Pacer Config
// ============================================================================

/// Configuration for client-side request pacing
#[derive(Debug, Clone)]
pub struct PacerConfig {
    /// Maximum requests per second issued to the upstream
    pub requests_per_second: u32,
    /// Burst size (max tokens in bucket)
    pub burst_size: u32,
}

impl Default for PacerConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 5,
            burst_size: 5,
        }
    }
}

impl PacerConfig {
    /// Create a new pacer config
    pub fn new(requests_per_second: u32, burst_size: u32) -> Self {
        Self {
            requests_per_second,
            burst_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_defaults() {
        let config = FetchConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.page_size, 1000);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.page_timeout, Duration::from_millis(60_000));
        assert_eq!(config.rate_limit_backoff_base, Duration::from_millis(10_000));
        assert_eq!(config.retry_backoff_base, Duration::from_millis(5_000));
        assert_eq!(config.cancel_poll_interval, Duration::from_millis(500));
        assert_eq!(config.backoff_tick, Duration::from_millis(250));
        assert_eq!(config.heartbeat_interval, Duration::from_secs(25));
        assert!(config.pacing.is_some());
    }

    #[test]
    fn test_fetch_config_builder() {
        let config = FetchConfig::builder()
            .base_url("http://localhost:9000/index")
            .page_size(50)
            .max_retries(5)
            .page_timeout(Duration::from_secs(5))
            .backoff(Duration::from_millis(100), Duration::from_millis(50))
            .cancel_poll_interval(Duration::from_millis(10))
            .backoff_tick(Duration::from_millis(5))
            .heartbeat_interval(Duration::from_secs(1))
            .no_pacing()
            .user_agent("test-agent/1.0")
            .build();

        assert_eq!(config.base_url, "http://localhost:9000/index");
        assert_eq!(config.page_size, 50);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.page_timeout, Duration::from_secs(5));
        assert_eq!(config.rate_limit_backoff_base, Duration::from_millis(100));
        assert_eq!(config.retry_backoff_base, Duration::from_millis(50));
        assert_eq!(config.cancel_poll_interval, Duration::from_millis(10));
        assert_eq!(config.backoff_tick, Duration::from_millis(5));
        assert!(config.pacing.is_none());
        assert_eq!(config.user_agent, "test-agent/1.0");
    }

    #[test]
    fn test_pacer_config() {
        let config = PacerConfig::default();
        assert_eq!(config.requests_per_second, 5);
        assert_eq!(config.burst_size, 5);

        let config = PacerConfig::new(20, 10);
        assert_eq!(config.requests_per_second, 20);
        assert_eq!(config.burst_size, 10);
    }
}
