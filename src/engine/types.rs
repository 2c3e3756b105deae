//! Engine types
//!
//! Statistics and request metrics for the sync engine.

use tracing::info;

/// Statistics from a sync operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Total records synced
    pub records_synced: usize,
    /// Total requests issued against the data API
    pub pages_fetched: usize,
    /// Total streams synced
    pub streams_synced: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add records
    pub fn add_records(&mut self, count: usize) {
        self.records_synced += count;
    }

    /// Add pages
    pub fn add_pages(&mut self, count: usize) {
        self.pages_fetched += count;
    }

    /// Add a stream
    pub fn add_stream(&mut self) {
        self.streams_synced += 1;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}

/// Counts data requests of one stream and logs the total when dropped
#[derive(Debug)]
pub struct RequestCounter {
    stream: &'static str,
    path: &'static str,
    count: u64,
}

impl RequestCounter {
    pub fn new(stream: &'static str, path: &'static str) -> Self {
        Self {
            stream,
            path,
            count: 0,
        }
    }

    pub fn increment(&mut self) {
        self.count += 1;
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

impl Drop for RequestCounter {
    fn drop(&mut self) {
        info!(
            metric = "http_request_count",
            stream = self.stream,
            path = self.path,
            count = self.count,
            "Request count"
        );
    }
}
