//! Pagination strategy implementations
//!
//! Each strategy handles a specific pagination pattern.

use super::types::{NextPage, PaginationState, Paginator};
use crate::decode::extract_value;
use crate::error::{Error, Result};
use crate::types::{format_business_date, parse_business_date, JsonObject};
use chrono::{Days, Local, NaiveDate};
use serde_json::Value;
use tracing::warn;

// ============================================================================
// Business Date Window
// ============================================================================

/// Inclusive range of business dates to fetch
///
/// The window is empty when `start > end`; no request is issued for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    /// First business date
    pub start: NaiveDate,
    /// Last business date
    pub end: NaiveDate,
}

impl DateWindow {
    /// Create a window over `[start, end]`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Create a window from `start` to yesterday in local time
    ///
    /// "Yesterday" is fixed when the window is built.
    pub fn ending_yesterday(start: NaiveDate) -> Self {
        Self::new(start, yesterday())
    }

    /// Check if the window holds no dates
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Number of business dates in the window
    pub fn num_days(&self) -> usize {
        self.period().count()
    }

    /// Check if a date falls within the window
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Every business date of the window in order
    pub fn period(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }

    /// The date after `previous` (or after `start` when absent), if still in the window
    pub fn next_date(&self, previous: Option<NaiveDate>) -> Option<NaiveDate> {
        previous
            .unwrap_or(self.start)
            .checked_add_days(Days::new(1))
            .filter(|next| self.contains(*next))
    }

    /// String form of [`DateWindow::next_date`] using `YYYY-MM-DD` tokens
    pub fn get_next_page_token(&self, previous: Option<&str>) -> Result<Option<String>> {
        let previous = previous
            .map(|p| {
                parse_business_date(p)
                    .ok_or_else(|| Error::Other(format!("Invalid business date token '{p}'")))
            })
            .transpose()?;

        Ok(self.next_date(previous).map(format_business_date))
    }
}

/// Local "today" minus one day
pub fn yesterday() -> NaiveDate {
    let today = Local::now().date_naive();
    today.pred_opt().unwrap_or(today)
}

/// Position of a business date pagination run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateCursor {
    /// No request issued yet
    NotStarted,
    /// The date of the request in flight
    Requesting(NaiveDate),
    /// Every date of the window has been requested
    Finished,
}

// ============================================================================
// Business Date Pagination
// ============================================================================

/// One request per business date
///
/// Empty days do not stop pagination; the run ends once the cursor passes
/// the end of the window.
#[derive(Debug, Clone)]
pub struct DatePaginator {
    /// Body field carrying the business date
    pub date_param: String,
    /// Dates to fetch
    pub window: DateWindow,
}

impl DatePaginator {
    /// Create a new business date paginator
    pub fn new(date_param: impl Into<String>, window: DateWindow) -> Self {
        Self {
            date_param: date_param.into(),
            window,
        }
    }

    /// Where a run currently stands
    pub fn cursor(&self, state: &PaginationState) -> DateCursor {
        if state.done {
            return DateCursor::Finished;
        }
        match state.cursor.as_deref().and_then(parse_business_date) {
            Some(date) => DateCursor::Requesting(date),
            None => DateCursor::NotStarted,
        }
    }
}

impl Paginator for DatePaginator {
    fn initial_params(&self, state: &mut PaginationState) -> Option<JsonObject> {
        if self.window.is_empty() {
            state.mark_done();
            return None;
        }

        let start = format_business_date(self.window.start);
        state.set_cursor(start.clone());

        let mut params = JsonObject::new();
        params.insert(self.date_param.clone(), Value::String(start));
        Some(params)
    }

    fn process_response(
        &self,
        _body: &Value,
        records_count: usize,
        state: &mut PaginationState,
    ) -> NextPage {
        state.add_fetched(records_count as u64);

        if self.cursor(state) == DateCursor::Finished {
            return NextPage::Done;
        }

        // The cursor is always a token this paginator wrote
        match self.window.get_next_page_token(state.cursor.as_deref()) {
            Ok(Some(token)) => {
                state.set_cursor(token.clone());
                NextPage::with_param(&self.date_param, token)
            }
            Ok(None) | Err(_) => {
                state.mark_done();
                NextPage::Done
            }
        }
    }
}

// ============================================================================
// Next-Page Token Pagination
// ============================================================================

/// Token pagination (token in response body, echoed in the next request body)
///
/// Stops on an empty page, a missing token, or a token equal to the previous one.
#[derive(Debug, Clone)]
pub struct NextPageTokenPaginator {
    /// JSONPath to extract the token from the response
    pub token_path: String,
    /// Body field carrying the token
    pub token_param: String,
}

impl NextPageTokenPaginator {
    /// Create a new token paginator
    pub fn new(token_path: impl Into<String>, token_param: impl Into<String>) -> Self {
        Self {
            token_path: token_path.into(),
            token_param: token_param.into(),
        }
    }
}

impl Default for NextPageTokenPaginator {
    fn default() -> Self {
        Self::new("$.next_page", "nextPage")
    }
}

impl Paginator for NextPageTokenPaginator {
    fn initial_params(&self, _state: &mut PaginationState) -> Option<JsonObject> {
        Some(JsonObject::new())
    }

    fn process_response(
        &self,
        body: &Value,
        records_count: usize,
        state: &mut PaginationState,
    ) -> NextPage {
        state.add_fetched(records_count as u64);

        if records_count == 0 {
            state.mark_done();
            return NextPage::Done;
        }

        let token = match extract_value(body, &self.token_path) {
            Some(Value::String(s)) if !s.is_empty() => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                state.mark_done();
                return NextPage::Done;
            }
        };

        if state.cursor.as_deref() == Some(token.as_str()) {
            warn!(token = %token, "Next-page token repeated, stopping pagination");
            state.mark_done();
            return NextPage::Done;
        }

        state.set_cursor(token.clone());
        NextPage::with_param(&self.token_param, token)
    }
}
