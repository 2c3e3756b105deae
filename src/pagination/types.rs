//! Pagination types and traits
//!
//! Defines the core pagination abstractions used by all strategies.
//! Simphony reads are `POST` requests, so page parameters are merged into
//! the JSON request body rather than the query string.

use crate::types::JsonObject;
use serde_json::Value;

/// Result of the next page computation
#[derive(Debug, Clone, PartialEq)]
pub enum NextPage {
    /// More pages available with these body parameters
    Continue {
        /// Body fields to add/replace on the next request
        body_params: JsonObject,
    },
    /// No more pages
    Done,
}

impl NextPage {
    /// Create a continuation with body parameters
    pub fn with_params(params: JsonObject) -> Self {
        Self::Continue {
            body_params: params,
        }
    }

    /// Create a continuation with a single parameter
    pub fn with_param(key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut params = JsonObject::new();
        params.insert(key.into(), value.into());
        Self::with_params(params)
    }
}

/// Pagination style of a stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationConfig {
    /// One request per business date of a window
    BusinessDate {
        /// Body field carrying the business date
        date_param: String,
    },

    /// Token read from the response body and echoed on the next request
    NextPageToken {
        /// JSONPath to the token in the response
        token_path: String,
        /// Body field carrying the token
        token_param: String,
    },
}

impl PaginationConfig {
    /// Business date windowing on `busDt`
    pub fn business_date() -> Self {
        Self::BusinessDate {
            date_param: "busDt".to_string(),
        }
    }

    /// Next-page token read from `$.next_page` and sent as `nextPage`
    pub fn next_page_token() -> Self {
        Self::NextPageToken {
            token_path: "$.next_page".to_string(),
            token_param: "nextPage".to_string(),
        }
    }
}

/// Tracks pagination state during iteration
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Number of requests issued so far
    pub page: u32,
    /// Current cursor value (business date or next-page token)
    pub cursor: Option<String>,
    /// Total records fetched so far
    pub total_fetched: u64,
    /// Is pagination complete?
    pub done: bool,
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark pagination as complete
    pub fn mark_done(&mut self) {
        self.done = true;
    }

    /// Increment page number
    pub fn next_page(&mut self) {
        self.page += 1;
    }

    /// Set cursor
    pub fn set_cursor(&mut self, cursor: String) {
        self.cursor = Some(cursor);
    }

    /// Add to total fetched
    pub fn add_fetched(&mut self, count: u64) {
        self.total_fetched += count;
    }
}

/// Core trait for pagination strategies
pub trait Paginator: Send + Sync {
    /// Body parameters of the first request, or `None` when there is nothing to fetch
    fn initial_params(&self, state: &mut PaginationState) -> Option<JsonObject>;

    /// Process a response and determine if there's a next page
    fn process_response(
        &self,
        body: &Value,
        records_count: usize,
        state: &mut PaginationState,
    ) -> NextPage;
}
