//! Decoder implementations
//!
//! Simphony answers every data request with a JSON object. Numbers are kept
//! in their textual form (serde_json `arbitrary_precision`), so currency
//! totals such as `12.10` never pass through `f64`.

use super::types::RecordDecoder;
use crate::error::{Error, Result};
use serde_json::Value;

// ============================================================================
// JSON Decoder
// ============================================================================

/// JSON decoder extracting records at a JSONPath
#[derive(Debug, Clone)]
pub struct JsonDecoder {
    /// JSONPath to extract records
    record_path: String,
}

impl JsonDecoder {
    /// Create a JSON decoder with a record path
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            record_path: path.into(),
        }
    }
}

impl RecordDecoder for JsonDecoder {
    fn decode_raw(&self, body: &str) -> Result<Value> {
        parse_json(body)
    }

    fn extract(&self, value: &Value) -> Result<Vec<Value>> {
        let path = self.record_path.as_str();
        // Wildcards go through jsonpath-rust, plain paths are walked directly
        let records = if path.contains('*') {
            extract_with_jsonpath(value, path)?
        } else {
            match extract_simple_path(value, path) {
                Some(Value::Array(arr)) => arr,
                Some(Value::Null) | None => vec![],
                Some(v) => vec![v],
            }
        };

        Ok(records.into_iter().filter(|r| !r.is_null()).collect())
    }
}

/// Parse a response body, keeping numbers exact
pub fn parse_json(body: &str) -> Result<Value> {
    serde_json::from_str(body).map_err(|e| Error::decode(format!("Failed to parse JSON: {e}")))
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Read a single value at a dot-notation path such as `$.next_page`
pub fn extract_value(value: &Value, path: &str) -> Option<Value> {
    extract_simple_path(value, path).filter(|v| !v.is_null())
}

/// Extract a value using simple dot-notation path with array indexing
fn extract_simple_path(value: &Value, path: &str) -> Option<Value> {
    let path = path.strip_prefix('$').unwrap_or(path);
    let path = path.strip_prefix('.').unwrap_or(path);
    if path.is_empty() {
        return Some(value.clone());
    }

    let mut current = value;
    for part in path.split('.') {
        // Handle array indexing like "locations[0]"
        if let Some(bracket_pos) = part.find('[') {
            let name = &part[..bracket_pos];
            let index_str = part[bracket_pos + 1..].trim_end_matches(']');

            if !name.is_empty() {
                current = current.get(name)?;
            }

            let index: usize = index_str.parse().ok()?;
            current = current.as_array()?.get(index)?;
        } else {
            current = current.get(part)?;
        }
    }

    Some(current.clone())
}

/// Extract values using jsonpath-rust
fn extract_with_jsonpath(value: &Value, path: &str) -> Result<Vec<Value>> {
    use jsonpath_rust::JsonPath;

    let jp = JsonPath::try_from(path)
        .map_err(|e| Error::json_path(format!("Invalid JSONPath '{path}': {e}")))?;

    match jp.find(value) {
        Value::Array(arr) => Ok(arr),
        Value::Null => Ok(vec![]),
        other => Ok(vec![other]),
    }
}
