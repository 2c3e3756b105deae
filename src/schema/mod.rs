//! Stream schema module
//!
//! Declarative JSON schemas for the records of each stream.

mod types;

pub use types::{JsonSchema, JsonType, JsonTypeOrArray, SchemaProperty};
