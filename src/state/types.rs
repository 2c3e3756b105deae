//! State types for tracking sync progress
//!
//! Singer state: `{"bookmarks": {<stream>: {"replication_key": .., "replication_key_value": ..}}}`.
//! These types are serialized to JSON and persisted between runs.

use crate::pagination::yesterday;
use crate::types::parse_business_date;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete state of the tap
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Per-stream bookmarks
    #[serde(default)]
    pub bookmarks: BTreeMap<String, Bookmark>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the bookmark of a stream
    pub fn get_bookmark(&self, stream: &str) -> Option<&Bookmark> {
        self.bookmarks.get(stream)
    }

    /// Replace the bookmark of a stream
    pub fn set_bookmark(
        &mut self,
        stream: &str,
        replication_key: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.bookmarks.insert(
            stream.to_string(),
            Bookmark {
                replication_key: replication_key.into(),
                replication_key_value: value.into(),
            },
        );
    }

    /// Move the bookmark forward, never backwards
    ///
    /// Values are ISO 8601 timestamps and compare lexicographically.
    /// Returns whether the bookmark changed.
    pub fn advance_bookmark(&mut self, stream: &str, replication_key: &str, value: &str) -> bool {
        let newer = self.get_bookmark(stream).map_or(true, |b| {
            b.replication_key != replication_key || value > b.replication_key_value.as_str()
        });
        if newer {
            self.set_bookmark(stream, replication_key, value);
        }
        newer
    }

    /// Business date to resume a stream from
    ///
    /// The date part of the bookmark, else `fallback` (the configured start
    /// date), else yesterday.
    pub fn start_date(&self, stream: &str, fallback: Option<NaiveDate>) -> NaiveDate {
        self.get_bookmark(stream)
            .and_then(Bookmark::date)
            .or(fallback)
            .unwrap_or_else(yesterday)
    }
}

/// Replication bookmark of one stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    /// Field the bookmark tracks
    pub replication_key: String,
    /// Largest value of the field seen so far
    pub replication_key_value: String,
}

impl Bookmark {
    /// Calendar date of the bookmarked value
    pub fn date(&self) -> Option<NaiveDate> {
        parse_business_date(&self.replication_key_value)
    }
}
