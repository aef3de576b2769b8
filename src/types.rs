//! Common types used throughout cdx-harvest
//!
//! The record and page shapes shared by the fetcher, parser, and engine.

use serde::{Deserialize, Serialize};

/// Number of fields a data row must carry to become a record.
///
/// Shorter rows are dropped by the parser; this is the lenient-parsing
/// contract for partially corrupt upstream rows.
pub const RECORD_FIELDS: usize = 4;

// ============================================================================
// Snapshot Record
// ============================================================================

/// One normalized unit of archived-index data.
///
/// Field semantics belong to the upstream index; this crate only guarantees
/// the shape: four string fields, never null, missing values as `""`.
/// Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    /// Identifier of the archived resource (typically the original URL)
    pub resource_id: String,
    /// Capture timestamp as reported by the index
    pub timestamp: String,
    /// HTTP status code recorded at capture time
    pub status_code: String,
    /// Content type recorded at capture time
    pub content_type: String,
}

impl SnapshotRecord {
    /// Create a record from its four fields
    pub fn new(
        resource_id: impl Into<String>,
        timestamp: impl Into<String>,
        status_code: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            resource_id: resource_id.into(),
            timestamp: timestamp.into(),
            status_code: status_code.into(),
            content_type: content_type.into(),
        }
    }
}

// ============================================================================
// Page
// ============================================================================

/// The result of fetching one page of the paged index.
///
/// Transient: consumed immediately by the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    /// Records parsed from this page, in upstream order
    pub records: Vec<SnapshotRecord>,
    /// Resume cursor for the next page; empty when none was reported
    pub cursor: String,
    /// Whether the upstream signalled more pages (a resume cursor row)
    pub has_more: bool,
}

impl Page {
    /// Create an empty terminal page
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a page that continues with the given cursor
    pub fn with_cursor(records: Vec<SnapshotRecord>, cursor: impl Into<String>) -> Self {
        Self {
            records,
            cursor: cursor.into(),
            has_more: true,
        }
    }

    /// Create a final page with no continuation
    pub fn last(records: Vec<SnapshotRecord>) -> Self {
        Self {
            records,
            cursor: String::new(),
            has_more: false,
        }
    }

    /// Check if this page is the end of pagination
    pub fn is_last(&self) -> bool {
        !self.has_more
    }
}
