//! Common types used throughout tap-simphony
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// `strftime` format of a Simphony business date
pub const BUSINESS_DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a business date from `YYYY-MM-DD` or an RFC 3339 timestamp
///
/// Timestamps keep only their calendar date as written, without converting
/// between time zones.
pub fn parse_business_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, BUSINESS_DATE_FORMAT)
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            // Local timestamps such as `opnLcl` carry no offset
            value
                .get(..10)
                .and_then(|d| NaiveDate::parse_from_str(d, BUSINESS_DATE_FORMAT).ok())
        })
}

/// Format a business date as `YYYY-MM-DD`
pub fn format_business_date(date: NaiveDate) -> String {
    date.format(BUSINESS_DATE_FORMAT).to_string()
}

// ============================================================================
// Sync Mode
// ============================================================================

/// Replication method of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncMode {
    /// Fetch everything on every run
    #[default]
    FullTable,
    /// Resume from the last bookmarked replication key value
    Incremental,
}
