//! Single-page HTTP fetcher
//!
//! One call is one attempt: pace, build the page URL, race the request
//! against the page timeout and the cancellation poll, then classify the
//! response and parse the body.

use super::rate_limit::RequestPacer;
use super::PageSource;
use crate::cancel::CancelSignal;
use crate::config::FetchConfig;
use crate::diag::DiagnosticsLog;
use crate::error::{Error, Result};
use crate::parse::parse_page;
use crate::types::Page;
use async_trait::async_trait;
use reqwest::Client;
use tokio::time::{interval, sleep, Instant};
use tracing::{debug, warn};
use url::Url;

/// Row fields requested from the index, in record order.
const ROW_FIELDS: &str = "original,timestamp,statuscode,mimetype";

/// Fetches index pages over HTTP
pub struct PageFetcher {
    client: Client,
    config: FetchConfig,
    pacer: Option<RequestPacer>,
}

impl PageFetcher {
    /// Create a fetcher for the configured index endpoint
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        let pacer = config.pacing.as_ref().map(RequestPacer::new);

        Ok(Self {
            client,
            config,
            pacer,
        })
    }

    /// Build the page URL for a target and resume cursor.
    ///
    /// An empty cursor means the first page; the resume parameter is then
    /// omitted entirely rather than sent empty.
    pub fn page_url(&self, target: &str, cursor: &str) -> Result<Url> {
        let mut url = Url::parse(&self.config.base_url)?;
        url.query_pairs_mut()
            .append_pair("url", target)
            .append_pair("matchType", "domain")
            .append_pair("output", "json")
            .append_pair("fl", ROW_FIELDS)
            .append_pair("limit", &self.config.page_size.to_string())
            .append_pair("showResumeKey", "true");
        if !cursor.is_empty() {
            url.query_pairs_mut().append_pair("resumeKey", cursor);
        }
        Ok(url)
    }

    /// Run one request until the response body is read, the page timeout
    /// fires, or cancellation is observed at a poll tick. Dropping the
    /// in-flight future aborts the request.
    async fn run_attempt(
        &self,
        url: Url,
        signal: &dyn CancelSignal,
        log: &mut DiagnosticsLog,
    ) -> Result<(u16, String)> {
        let started = Instant::now();

        let attempt = async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| classify_transport(&e, started))?;
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| classify_transport(&e, started))?;
            Ok::<_, Error>((status, body))
        };
        tokio::pin!(attempt);

        let deadline = sleep(self.config.page_timeout);
        tokio::pin!(deadline);

        let mut poll = interval(self.config.cancel_poll_interval);

        loop {
            tokio::select! {
                outcome = &mut attempt => {
                    return match outcome {
                        Ok((status, body)) => {
                            let elapsed_ms = started.elapsed().as_millis() as u64;
                            log.record(format!("HTTP {status} after {elapsed_ms}ms"));
                            Ok((status, body))
                        }
                        Err(err) => {
                            log.record(format!("attempt failed: {err}"));
                            Err(err)
                        }
                    };
                }
                () = &mut deadline => {
                    let elapsed_ms = started.elapsed().as_millis() as u64;
                    log.record(format!("page attempt timed out after {elapsed_ms}ms"));
                    return Err(Error::Timeout { elapsed_ms });
                }
                _ = poll.tick() => {
                    if signal.is_cancelled() {
                        log.record("cancelled while request in flight");
                        return Err(Error::Cancelled);
                    }
                }
            }
        }
    }
}

#[async_trait]
impl PageSource for PageFetcher {
    async fn fetch_page(
        &self,
        target: &str,
        cursor: &str,
        signal: &dyn CancelSignal,
        log: &mut DiagnosticsLog,
    ) -> Result<Page> {
        if let Some(pacer) = &self.pacer {
            pacer
                .wait_cancellable(signal, self.config.cancel_poll_interval)
                .await?;
        }

        let url = self.page_url(target, cursor)?;
        debug!("GET {}", url);
        log.record(format!("GET {url}"));

        let (status, body) = self.run_attempt(url, signal, log).await?;

        match status {
            429 | 503 => {
                warn!("throttled by upstream (HTTP {})", status);
                Err(Error::RateLimited { status })
            }
            s if !(200..300).contains(&s) => Err(Error::http_status(s, body)),
            _ => parse_page(&body),
        }
    }
}

impl std::fmt::Debug for PageFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageFetcher")
            .field("config", &self.config)
            .field("has_pacer", &self.pacer.is_some())
            .finish_non_exhaustive()
    }
}

/// Map a transport-level failure to the retryable error taxonomy
fn classify_transport(err: &reqwest::Error, started: Instant) -> Error {
    if err.is_timeout() {
        Error::Timeout {
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    } else {
        Error::network(err.to_string())
    }
}
