//! Execution engine module
//!
//! Main read loop and stream orchestration.
//!
//! # Overview
//!
//! The engine module provides:
//! - `SyncEngine` - Reads selected streams one after another into a sink
//! - `SyncStats` - Counters reported at the end of a sync
//! - `run` - Authenticates once, then syncs
//!
//! Records of a stream are produced lazily: every page is requested only
//! when the previous one has been consumed.

mod types;

pub use types::{RequestCounter, SyncStats};

use crate::auth::{BearerToken, CredentialExchange};
use crate::config::TapConfig;
use crate::decode::{JsonDecoder, Page, RecordDecoder};
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use crate::output::{Message, RecordSink};
use crate::pagination::{
    yesterday, DatePaginator, DateWindow, NextPage, NextPageTokenPaginator, PaginationConfig,
    PaginationState, Paginator,
};
use crate::state::StateManager;
use crate::streams::{Stream, StreamDefinition};
use crate::types::{JsonObject, SyncMode};
use chrono::NaiveDate;
use futures::stream::{self, Stream as FuturesStream, TryStreamExt};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info};

/// Body field carrying the location reference
const LOCATION_PARAM: &str = "locRef";

/// Sync engine for orchestrating data extraction
pub struct SyncEngine {
    /// HTTP client for the data API
    client: HttpClient,
    /// State manager
    state: StateManager,
    /// Location sent on every request
    location_reference: String,
    /// Configured start date, used when a stream has no bookmark
    start_date: Option<NaiveDate>,
    /// Statistics
    stats: SyncStats,
}

/// Pagination progress threaded through the lazy page stream
struct PageCursor {
    paginator: Box<dyn Paginator>,
    pagination: PaginationState,
    params: Option<JsonObject>,
    counter: RequestCounter,
}

impl SyncEngine {
    /// Create a new sync engine
    pub fn new(
        client: HttpClient,
        state: StateManager,
        location_reference: impl Into<String>,
    ) -> Self {
        Self {
            client,
            state,
            location_reference: location_reference.into(),
            start_date: None,
            stats: SyncStats::default(),
        }
    }

    /// Create an engine for the data API named in the configuration
    pub fn from_config(config: &TapConfig, state: StateManager) -> Result<Self> {
        let client = HttpClient::with_config(config.http_config())?;
        Ok(Self::new(client, state, &config.location_reference).with_start_date(config.start_date()))
    }

    /// Set the start date used when a stream has no bookmark
    #[must_use]
    pub fn with_start_date(mut self, start_date: Option<NaiveDate>) -> Self {
        self.start_date = start_date;
        self
    }

    /// Business dates to read for a stream: resume point to yesterday
    pub async fn date_window(&self, stream: &str) -> DateWindow {
        let start = self.state.start_date(stream, self.start_date).await;
        DateWindow::ending_yesterday(start)
    }

    /// Sync the selected streams in order, one after another
    pub async fn sync(
        &mut self,
        token: &BearerToken,
        streams: &[Stream],
        sink: &mut dyn RecordSink,
    ) -> Result<SyncStats> {
        let start = Instant::now();

        for stream in streams {
            let definition = stream.definition();
            let window = match definition.pagination {
                PaginationConfig::BusinessDate { .. } => {
                    Some(self.date_window(definition.name).await)
                }
                PaginationConfig::NextPageToken { .. } => None,
            };
            self.sync_stream(&definition, token, window, sink).await?;
        }

        sink.flush().await?;

        #[allow(clippy::cast_possible_truncation)]
        self.stats.set_duration(start.elapsed().as_millis() as u64);

        info!(
            streams = self.stats.streams_synced,
            records = self.stats.records_synced,
            requests = self.stats.pages_fetched,
            duration_ms = self.stats.duration_ms,
            "Sync completed"
        );

        Ok(self.stats.clone())
    }

    /// Sync one stream: SCHEMA, then RECORDs, then STATE for incremental streams
    pub async fn sync_stream(
        &mut self,
        definition: &StreamDefinition,
        token: &BearerToken,
        window: Option<DateWindow>,
        sink: &mut dyn RecordSink,
    ) -> Result<()> {
        info!(
            stream = definition.name,
            ?window,
            days = window.map(|w| w.num_days()),
            "Starting sync for stream"
        );
        sink.write(&Message::schema(definition)).await?;

        let mut page_count = 0;
        let mut record_count = 0;
        let mut max_replication_value: Option<String> = None;

        {
            let mut pages = std::pin::pin!(self.pages(definition, token, window));
            while let Some(page) = pages.try_next().await? {
                page_count += 1;
                debug!(
                    stream = definition.name,
                    page = page_count,
                    records = page.len(),
                    "Fetched page"
                );

                for record in page.into_records() {
                    if let Some(key) = definition.replication_key {
                        if let Some(value) = replication_value(&record, key) {
                            if max_replication_value.as_ref().map_or(true, |m| value > *m) {
                                max_replication_value = Some(value);
                            }
                        }
                    }

                    sink.write(&Message::record(definition.name, record)).await?;
                    record_count += 1;
                }
            }
        }

        if definition.sync_mode == SyncMode::Incremental {
            if let (Some(key), Some(value)) = (definition.replication_key, &max_replication_value) {
                self.state
                    .advance_bookmark(definition.name, key, value)
                    .await?;
            }
            let state = serde_json::to_value(self.state.snapshot().await)
                .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))?;
            sink.write(&Message::state(state)).await?;
        }

        self.stats.add_pages(page_count);
        self.stats.add_records(record_count);
        self.stats.add_stream();

        info!(
            stream = definition.name,
            records = record_count,
            pages = page_count,
            "Completed sync for stream"
        );

        Ok(())
    }

    /// Lazy sequence of all records of a stream
    pub fn records<'a>(
        &'a self,
        definition: &'a StreamDefinition,
        token: &'a BearerToken,
        window: Option<DateWindow>,
    ) -> impl FuturesStream<Item = Result<Value>> + 'a {
        self.pages(definition, token, window)
            .map_ok(|page| stream::iter(page.into_records().into_iter().map(Ok::<Value, Error>)))
            .try_flatten()
    }

    /// Lazy sequence of the pages of a stream, one request per page
    ///
    /// Business date streams need a `window`; an empty window yields no page
    /// and issues no request.
    pub fn pages<'a>(
        &'a self,
        definition: &'a StreamDefinition,
        token: &'a BearerToken,
        window: Option<DateWindow>,
    ) -> impl FuturesStream<Item = Result<Page>> + 'a {
        let mut pagination = PaginationState::new();
        let paginator = build_paginator(&definition.pagination, window);
        let params = paginator.initial_params(&mut pagination);

        let cursor = PageCursor {
            paginator,
            pagination,
            params,
            counter: RequestCounter::new(definition.name, definition.path),
        };

        stream::try_unfold(cursor, move |cursor| self.next_page(definition, token, cursor))
    }

    /// Request one page and compute the parameters of the next
    async fn next_page(
        &self,
        definition: &StreamDefinition,
        token: &BearerToken,
        mut cursor: PageCursor,
    ) -> Result<Option<(Page, PageCursor)>> {
        let Some(params) = cursor.params.take() else {
            return Ok(None);
        };

        let page_label = page_label(&params, cursor.pagination.page + 1);
        let fail = |e: Error| Error::pagination(definition.name, page_label.clone(), e);

        let mut body = JsonObject::new();
        body.insert(
            LOCATION_PARAM.to_string(),
            Value::String(self.location_reference.clone()),
        );
        body.extend(params.clone());

        debug!(stream = definition.name, page = %page_label, "Requesting page");
        cursor.counter.increment();
        cursor.pagination.next_page();

        let request = RequestConfig::new()
            .bearer(token.as_str())
            .json(Value::Object(body));
        let text = self
            .client
            .post_with_config(definition.path, request)
            .await
            .map_err(fail)?;

        let (value, page) = JsonDecoder::with_path(definition.records_path)
            .decode(&text)
            .map_err(fail)?;

        match cursor
            .paginator
            .process_response(&value, page.len(), &mut cursor.pagination)
        {
            NextPage::Continue { body_params } => {
                let mut next = params;
                next.extend(body_params);
                cursor.params = Some(next);
            }
            NextPage::Done => {
                debug!(
                    stream = definition.name,
                    requests = cursor.counter.count(),
                    "Pagination finished"
                );
            }
        }

        Ok(Some((page, cursor)))
    }
}

/// Authenticate once and sync the selected streams
pub async fn run(
    config: &TapConfig,
    state: StateManager,
    streams: &[Stream],
    sink: &mut dyn RecordSink,
) -> Result<SyncStats> {
    let exchange = CredentialExchange::new(&config.auth_url, config.timeout())?;
    let token = exchange.login(config.credentials()).await?;

    let mut engine = SyncEngine::from_config(config, state)?;
    engine.sync(&token, streams, sink).await
}

/// Build the paginator of a stream
fn build_paginator(config: &PaginationConfig, window: Option<DateWindow>) -> Box<dyn Paginator> {
    match config {
        PaginationConfig::BusinessDate { date_param } => {
            let window = window.unwrap_or_else(|| DateWindow::ending_yesterday(yesterday()));
            Box::new(DatePaginator::new(date_param.as_str(), window))
        }
        PaginationConfig::NextPageToken {
            token_path,
            token_param,
        } => Box::new(NextPageTokenPaginator::new(
            token_path.as_str(),
            token_param.as_str(),
        )),
    }
}

/// Name a page in errors: its business date, else its token, else its number
fn page_label(params: &JsonObject, number: u32) -> String {
    ["busDt", "nextPage"]
        .iter()
        .find_map(|key| params.get(*key))
        .map_or_else(
            || number.to_string(),
            |v| v.as_str().map_or_else(|| v.to_string(), ToString::to_string),
        )
}

/// Replication key value of a record as a comparable string
fn replication_value(record: &Value, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests;
