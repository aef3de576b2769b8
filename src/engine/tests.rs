//! Tests for the scan engine

use super::*;
use crate::cancel::{CancelFlag, NeverCancelled};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// A page source that serves a pre-scripted sequence of outcomes and
/// records every cursor it was asked for.
#[derive(Clone)]
struct ScriptedSource {
    script: Arc<Mutex<VecDeque<Result<Page>>>>,
    seen_cursors: Arc<Mutex<Vec<String>>>,
    cancel_on_call: Option<(usize, CancelFlag)>,
}

impl ScriptedSource {
    fn new(steps: Vec<Result<Page>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(steps.into_iter().collect())),
            seen_cursors: Arc::new(Mutex::new(Vec::new())),
            cancel_on_call: None,
        }
    }

    /// Trip the flag while serving the n-th call (1-based), simulating a
    /// cancellation that lands mid-fetch.
    fn cancel_on_call(mut self, call: usize, flag: CancelFlag) -> Self {
        self.cancel_on_call = Some((call, flag));
        self
    }

    fn calls(&self) -> usize {
        self.seen_cursors.lock().unwrap().len()
    }

    fn cursors(&self) -> Vec<String> {
        self.seen_cursors.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource for ScriptedSource {
    async fn fetch_page(
        &self,
        _target: &str,
        cursor: &str,
        _signal: &dyn CancelSignal,
        _log: &mut DiagnosticsLog,
    ) -> Result<Page> {
        let call = {
            let mut seen = self.seen_cursors.lock().unwrap();
            seen.push(cursor.to_string());
            seen.len()
        };
        if let Some((n, flag)) = &self.cancel_on_call {
            if call == *n {
                flag.cancel();
            }
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .expect("script exhausted")
    }
}

fn rec(id: &str) -> SnapshotRecord {
    SnapshotRecord::new(id, "20240101000000", "200", "text/html")
}

fn page_with(ids: &[&str], cursor: &str) -> Page {
    let records = ids.iter().map(|id| rec(id)).collect();
    if cursor.is_empty() {
        Page::last(records)
    } else {
        Page::with_cursor(records, cursor)
    }
}

fn engine_with(steps: Vec<Result<Page>>) -> (ScanEngine<ScriptedSource>, ScriptedSource) {
    let source = ScriptedSource::new(steps);
    let engine = ScanEngine::new(source.clone(), FetchConfig::default());
    (engine, source)
}

// ============================================================================
// ScanStats
// ============================================================================

#[test]
fn test_scan_stats_mutations() {
    let mut stats = ScanStats::new();

    stats.add_page();
    stats.add_page();
    assert_eq!(stats.pages_fetched, 2);

    stats.add_records(100);
    stats.add_records(20);
    assert_eq!(stats.records_fetched, 120);

    stats.add_retry();
    assert_eq!(stats.retries, 1);

    stats.set_duration(1500);
    assert_eq!(stats.duration_ms, 1500);
}

// ============================================================================
// Successful Scans
// ============================================================================

#[tokio::test]
async fn test_single_page_scan() {
    let (mut engine, source) = engine_with(vec![Ok(page_with(&["a", "b"], ""))]);

    let mut reports = Vec::new();
    let records = engine
        .run("example.org", &NeverCancelled, |p| {
            reports.push((p.page_number, p.records.len(), p.has_more));
            Ok(())
        })
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].resource_id, "a");
    assert_eq!(reports, vec![(1, 2, false)]);
    assert_eq!(source.cursors(), vec![String::new()]);
    assert_eq!(engine.stats().pages_fetched, 1);
    assert_eq!(engine.stats().records_fetched, 2);
    assert_eq!(engine.stats().retries, 0);
}

#[tokio::test]
async fn test_empty_index_scan() {
    let (mut engine, _source) = engine_with(vec![Ok(Page::empty())]);

    let mut reports = Vec::new();
    let records = engine
        .run("example.org", &NeverCancelled, |p| {
            reports.push((p.page_number, p.records.len(), p.has_more));
            Ok(())
        })
        .await
        .unwrap();

    assert!(records.is_empty());
    assert_eq!(reports, vec![(1, 0, false)]);
}

#[tokio::test]
async fn test_run_from_resumes_at_the_cursor() {
    let (mut engine, source) = engine_with(vec![
        Ok(page_with(&["d"], "k2")),
        Ok(page_with(&["e"], "")),
    ]);

    let records = engine
        .run_from("example.org", "k1", &NeverCancelled, |_| Ok(()))
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(source.cursors(), vec!["k1".to_string(), "k2".to_string()]);
}

#[tokio::test]
async fn test_multi_page_scan_threads_cursors() {
    let (mut engine, source) = engine_with(vec![
        Ok(page_with(&["a", "b"], "k1")),
        Ok(page_with(&["c", "d"], "k2")),
        Ok(page_with(&["e"], "")),
    ]);

    let mut reports = Vec::new();
    let records = engine
        .run("example.org", &NeverCancelled, |p| {
            reports.push((p.page_number, p.records.len(), p.has_more));
            Ok(())
        })
        .await
        .unwrap();

    let ids: Vec<_> = records.iter().map(|r| r.resource_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c", "d", "e"]);
    assert_eq!(
        source.cursors(),
        vec!["".to_string(), "k1".to_string(), "k2".to_string()]
    );
    assert_eq!(reports, vec![(1, 2, true), (2, 4, true), (3, 5, false)]);
    assert_eq!(engine.stats().pages_fetched, 3);
    assert_eq!(engine.stats().records_fetched, 5);
}

// ============================================================================
// Retries and Backoff
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_retry_then_success() {
    let (mut engine, source) = engine_with(vec![
        Err(Error::RateLimited { status: 429 }),
        Ok(page_with(&["a"], "")),
    ]);

    let records = engine
        .run("example.org", &NeverCancelled, |_| Ok(()))
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(source.calls(), 2);
    assert_eq!(engine.stats().retries, 1);
    assert_eq!(engine.stats().pages_fetched, 1);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_backoff_doubles() {
    let (mut engine, _source) = engine_with(vec![
        Err(Error::RateLimited { status: 429 }),
        Err(Error::RateLimited { status: 503 }),
        Ok(page_with(&["a"], "")),
    ]);

    let started = Instant::now();
    engine
        .run("example.org", &NeverCancelled, |_| Ok(()))
        .await
        .unwrap();

    // 10s after the first failure, 20s after the second.
    assert_eq!(started.elapsed(), Duration::from_secs(30));
    assert_eq!(engine.stats().retries, 2);
}

#[tokio::test(start_paused = true)]
async fn test_transient_backoff_doubles() {
    let (mut engine, _source) = engine_with(vec![
        Err(Error::Timeout { elapsed_ms: 60_000 }),
        Err(Error::network("connection reset")),
        Ok(page_with(&["a"], "")),
    ]);

    let started = Instant::now();
    engine
        .run("example.org", &NeverCancelled, |_| Ok(()))
        .await
        .unwrap();

    // 5s after the first failure, 10s after the second.
    assert_eq!(started.elapsed(), Duration::from_secs(15));
}

#[tokio::test(start_paused = true)]
async fn test_exhaustion_after_three_attempts() {
    let (mut engine, source) = engine_with(vec![
        Ok(page_with(&["a", "b"], "k1")),
        Err(Error::Timeout { elapsed_ms: 60_000 }),
        Err(Error::Timeout { elapsed_ms: 60_000 }),
        Err(Error::Timeout { elapsed_ms: 60_000 }),
    ]);

    let mut reports = Vec::new();
    let failure = engine
        .run("example.org", &NeverCancelled, |p| {
            reports.push(p.page_number);
            Ok(())
        })
        .await
        .unwrap_err();

    assert!(matches!(
        failure.error,
        Error::TimeoutExhausted { attempts: 3 }
    ));
    // Page 1 is salvaged; page 2 never completed and can be refetched.
    assert_eq!(failure.records.len(), 2);
    assert_eq!(failure.resume_cursor, "k1");
    assert_eq!(reports, vec![1]);
    assert_eq!(source.calls(), 4);
    assert_eq!(engine.stats().retries, 2);
    assert!(failure.trace.contains("retry budget exhausted"));
}

#[tokio::test]
async fn test_fatal_error_skips_retries() {
    let (mut engine, source) = engine_with(vec![Err(Error::http_status(404, "no such index"))]);

    let failure = engine
        .run("example.org", &NeverCancelled, |_| Ok(()))
        .await
        .unwrap_err();

    assert!(matches!(
        failure.error,
        Error::HttpStatus { status: 404, .. }
    ));
    assert_eq!(source.calls(), 1);
    assert_eq!(engine.stats().retries, 0);
    assert!(failure.trace.contains("scan failed"));
}

#[tokio::test]
async fn test_malformed_continuation_missing_cursor() {
    let (mut engine, _source) = engine_with(vec![Ok(Page {
        records: vec![rec("a")],
        cursor: String::new(),
        has_more: true,
    })]);

    let mut reports = Vec::new();
    let failure = engine
        .run("example.org", &NeverCancelled, |p| {
            reports.push(p.page_number);
            Ok(())
        })
        .await
        .unwrap_err();

    assert!(matches!(failure.error, Error::MalformedResponse { .. }));
    // The page itself was delivered before the continuation was rejected.
    assert_eq!(reports, vec![1]);
    assert_eq!(failure.records.len(), 1);
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn test_cancelled_before_first_page() {
    let (mut engine, source) = engine_with(vec![Ok(page_with(&["a"], ""))]);
    let flag = CancelFlag::new();
    flag.cancel();

    let mut reports = Vec::new();
    let failure = engine
        .run("example.org", &flag, |p| {
            reports.push(p.page_number);
            Ok(())
        })
        .await
        .unwrap_err();

    assert!(failure.is_cancelled());
    assert!(failure.records.is_empty());
    assert!(failure.resume_cursor.is_empty());
    assert!(reports.is_empty());
    assert_eq!(source.calls(), 0);
    assert!(failure.trace.contains("cancellation requested"));
}

#[tokio::test]
async fn test_cancellation_mid_fetch_salvages_the_page() {
    let flag = CancelFlag::new();
    let source = ScriptedSource::new(vec![
        Ok(page_with(&["a", "b"], "k1")),
        Ok(page_with(&["c"], "k2")),
    ])
    .cancel_on_call(2, flag.clone());
    let mut engine = ScanEngine::new(source.clone(), FetchConfig::default());

    let mut reports = Vec::new();
    let failure = engine
        .run("example.org", &flag, |p| {
            reports.push(p.page_number);
            Ok(())
        })
        .await
        .unwrap_err();

    assert!(failure.is_cancelled());
    // Page 2 completed before the cancellation was observed, so its
    // records are salvaged, but no progress is reported for it and the
    // resume cursor still names it.
    assert_eq!(failure.records.len(), 3);
    assert_eq!(failure.resume_cursor, "k1");
    assert_eq!(reports, vec![1]);
    assert_eq!(source.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_interrupts_backoff() {
    let (mut engine, source) = engine_with(vec![Err(Error::RateLimited { status: 429 })]);
    let flag = CancelFlag::new();

    let background = flag.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(3100)).await;
        background.cancel();
    });

    let started = Instant::now();
    let failure = engine.run("example.org", &flag, |_| Ok(())).await.unwrap_err();

    assert!(failure.is_cancelled());
    // Cancelled 3.1s into a 10s backoff, observed at the next 250ms tick.
    assert_eq!(started.elapsed(), Duration::from_millis(3250));
    assert_eq!(source.calls(), 1);
    assert_eq!(engine.stats().retries, 1);
}

// ============================================================================
// Progress Callback
// ============================================================================

#[tokio::test]
async fn test_progress_error_aborts_scan() {
    let (mut engine, source) = engine_with(vec![
        Ok(page_with(&["a", "b"], "k1")),
        Ok(page_with(&["c"], "")),
    ]);

    let failure = engine
        .run("example.org", &NeverCancelled, |_| {
            Err(Error::Other("sink full".to_string()))
        })
        .await
        .unwrap_err();

    assert!(matches!(failure.error, Error::Other(_)));
    assert_eq!(failure.records.len(), 2);
    // Page 1 was never delivered downstream, so resumption refetches it.
    assert_eq!(failure.resume_cursor, "");
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn test_progress_carries_the_diagnostics_so_far() {
    let (mut engine, _source) = engine_with(vec![Ok(page_with(&["a"], ""))]);

    let mut saw_fetch_entry = false;
    engine
        .run("example.org", &NeverCancelled, |p| {
            saw_fetch_entry = p
                .diagnostics
                .entries()
                .iter()
                .any(|e| e.message.contains("fetching page 1"));
            Ok(())
        })
        .await
        .unwrap();

    assert!(saw_fetch_entry);
}

#[tokio::test]
async fn test_failure_trace_is_timestamped() {
    let (mut engine, _source) = engine_with(vec![Err(Error::http_status(400, "bad"))]);

    let failure = engine
        .run("example.org", &NeverCancelled, |_| Ok(()))
        .await
        .unwrap_err();

    assert!(failure.trace.contains("fetching page 1"));
    for line in failure.trace.lines() {
        // Each line leads with an RFC 3339 timestamp.
        assert!(line.contains('T') && line.contains('Z'), "line: {line}");
    }
}
