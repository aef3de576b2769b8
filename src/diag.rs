//! Session diagnostics trace
//!
//! An append-only, timestamped, in-memory log of orchestration events, owned
//! by one scan session. It rides along on progress reporting and is rendered
//! into every failure so the host can surface exactly what the scan did.
//! This is separate from `tracing`: tracing goes to the operator, the
//! diagnostics trace goes to the caller.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// One timestamped diagnostics event. Never mutated after append.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticsEntry {
    /// When the event was recorded
    pub timestamp: DateTime<Utc>,
    /// What happened
    pub message: String,
}

impl DiagnosticsEntry {
    /// Timestamp rendered as RFC 3339 to millisecond precision
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Append-only trace of orchestration events for one scan session
#[derive(Debug, Clone, Default)]
pub struct DiagnosticsLog {
    entries: Vec<DiagnosticsEntry>,
}

impl DiagnosticsLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, stamped with the current time
    pub fn record(&mut self, message: impl Into<String>) {
        self.entries.push(DiagnosticsEntry {
            timestamp: Utc::now(),
            message: message.into(),
        });
    }

    /// All entries, oldest first
    pub fn entries(&self) -> &[DiagnosticsEntry] {
        &self.entries
    }

    /// Number of recorded entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries (the session is over)
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Render the whole trace as one newline-joined string
    pub fn to_trace(&self) -> String {
        let lines: Vec<String> = self
            .entries
            .iter()
            .map(|entry| format!("{} {}", entry.timestamp_iso(), entry.message))
            .collect();
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_appends_in_order() {
        let mut log = DiagnosticsLog::new();
        assert!(log.is_empty());

        log.record("first");
        log.record("second");
        log.record("third");

        assert_eq!(log.len(), 3);
        assert_eq!(log.entries()[0].message, "first");
        assert_eq!(log.entries()[2].message, "third");
        assert!(log.entries()[0].timestamp <= log.entries()[2].timestamp);
    }

    #[test]
    fn test_trace_is_newline_joined() {
        let mut log = DiagnosticsLog::new();
        log.record("one");
        log.record("two");

        let trace = log.to_trace();
        let lines: Vec<&str> = trace.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("one"));
        assert!(lines[1].ends_with("two"));
    }

    #[test]
    fn test_timestamp_is_rfc3339() {
        let mut log = DiagnosticsLog::new();
        log.record("event");

        let iso = log.entries()[0].timestamp_iso();
        assert!(DateTime::parse_from_rfc3339(&iso).is_ok());
    }

    #[test]
    fn test_clear_empties_log() {
        let mut log = DiagnosticsLog::new();
        log.record("event");
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.to_trace(), "");
    }
}
