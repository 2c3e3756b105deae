//! Singer messages

use crate::schema::JsonSchema;
use crate::streams::StreamDefinition;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;

/// A message emitted during sync, one JSON document per line
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Schema of a stream, emitted before its records
    Schema {
        /// Stream name
        stream: String,
        /// Record schema
        schema: JsonSchema,
        /// Primary key fields
        key_properties: Vec<String>,
        /// Replication key fields
        bookmark_properties: Vec<String>,
    },
    /// One record
    Record {
        /// Stream name
        stream: String,
        /// The record, unmodified
        record: Value,
        /// When the record was read
        #[serde(serialize_with = "serialize_rfc3339")]
        time_extracted: DateTime<Utc>,
    },
    /// State checkpoint
    State {
        /// Full state document
        value: Value,
    },
}

impl Message {
    /// Create the schema message of a stream
    pub fn schema(definition: &StreamDefinition) -> Self {
        Self::Schema {
            stream: definition.name.to_string(),
            schema: definition.schema.clone(),
            key_properties: definition
                .primary_keys
                .iter()
                .map(ToString::to_string)
                .collect(),
            bookmark_properties: definition
                .replication_key
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }

    /// Create a record message stamped with the current time
    pub fn record(stream: impl Into<String>, record: Value) -> Self {
        Self::Record {
            stream: stream.into(),
            record,
            time_extracted: Utc::now(),
        }
    }

    /// Create a state message
    pub fn state(value: Value) -> Self {
        Self::State { value }
    }

    /// Serialize to a single line of JSON
    pub fn to_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

fn serialize_rfc3339<S: Serializer>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&time.to_rfc3339_opts(SecondsFormat::Micros, true))
}
