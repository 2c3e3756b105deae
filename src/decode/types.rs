//! Decoder types and traits
//!
//! Defines the page outcome and the decoder abstraction.

use crate::error::Result;
use serde_json::Value;

/// Records carried by one successfully decoded response
///
/// A transport or parse failure is never a `Page`; it surfaces as an `Err`
/// so that an empty business day cannot be confused with a failed request.
#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    /// The response was valid and held no records
    Empty,
    /// The response held at least one record
    Records(Vec<Value>),
}

impl Page {
    /// Build a page from extracted records
    pub fn from_records(records: Vec<Value>) -> Self {
        if records.is_empty() {
            Self::Empty
        } else {
            Self::Records(records)
        }
    }

    /// Number of records on the page
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Records(records) => records.len(),
        }
    }

    /// Check if the page holds no records
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Take the records out of the page
    pub fn into_records(self) -> Vec<Value> {
        match self {
            Self::Empty => Vec::new(),
            Self::Records(records) => records,
        }
    }
}

/// Trait for decoding response bodies into records
pub trait RecordDecoder: Send + Sync {
    /// Decode the response body into a single JSON value (full response)
    fn decode_raw(&self, body: &str) -> Result<Value>;

    /// Extract the records from an already decoded response
    fn extract(&self, value: &Value) -> Result<Vec<Value>>;

    /// Decode a response body into the full response and its page of records
    fn decode(&self, body: &str) -> Result<(Value, Page)> {
        let value = self.decode_raw(body)?;
        let page = Page::from_records(self.extract(&value)?);
        Ok((value, page))
    }
}
