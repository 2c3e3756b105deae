//! Response decoder module
//!
//! Turns Simphony JSON responses into pages of records.
//!
//! # Overview
//!
//! A decoder parses the body with exact decimal numbers and extracts the
//! records of a stream with a JSONPath expression such as `$.guestChecks[*]`.

mod decoders;
mod types;

pub use decoders::{extract_value, parse_json, JsonDecoder};
pub use types::{Page, RecordDecoder};
