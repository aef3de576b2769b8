//! Index response parsing
//!
//! The upstream index speaks a row-array convention: the body is a JSON
//! array of rows, the first row is a schema header, and when more pages
//! remain the final row is a single-field resume-key marker. Parsing is a
//! pure transformation with a deliberately lenient row policy: rows too
//! short to be records are dropped, null cells become empty strings, and an
//! empty body is an empty terminal page rather than an error.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::types::{Page, SnapshotRecord, RECORD_FIELDS};

/// Parse one raw page body into records plus pagination state.
///
/// The resume-key marker is recognized purely by shape: a final row with
/// exactly one field. Only the last row is eligible; a one-field row
/// anywhere else is dropped as a short row.
pub fn parse_page(body: &str) -> Result<Page> {
    if body.trim().is_empty() {
        return Ok(Page::empty());
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|e| Error::malformed(format!("body is not valid JSON: {e}")))?;

    let Value::Array(rows) = value else {
        return Err(Error::malformed("body is not a JSON array of rows"));
    };

    if rows.is_empty() {
        return Ok(Page::empty());
    }

    // First row is the schema header, always skipped.
    let mut data = &rows[1..];

    let mut cursor = String::new();
    let mut has_more = false;
    if let Some(Value::Array(fields)) = data.last() {
        if fields.len() == 1 {
            cursor = cell_text(&fields[0]);
            has_more = true;
            data = &data[..data.len() - 1];
        }
    }

    let records = data.iter().filter_map(row_to_record).collect();

    Ok(Page {
        records,
        cursor,
        has_more,
    })
}

/// Convert one row into a record, or `None` for rows that are not arrays or
/// carry fewer fields than a record needs. Extra fields are ignored.
fn row_to_record(row: &Value) -> Option<SnapshotRecord> {
    let fields = row.as_array()?;
    if fields.len() < RECORD_FIELDS {
        return None;
    }
    Some(SnapshotRecord::new(
        cell_text(&fields[0]),
        cell_text(&fields[1]),
        cell_text(&fields[2]),
        cell_text(&fields[3]),
    ))
}

/// Normalize one cell to text: strings pass through, null becomes empty,
/// anything else renders via its JSON form.
fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
