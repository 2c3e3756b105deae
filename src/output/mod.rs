//! Output module
//!
//! Singer messages and the sinks that receive them.
//!
//! # Overview
//!
//! - `Message` - SCHEMA, RECORD and STATE messages
//! - `RecordSink` - async destination trait
//! - `JsonLinesSink` - one JSON document per line on any async writer (stdout by default)
//! - `MemorySink` - collects messages in memory

mod message;
mod sink;

pub use message::Message;
pub use sink::{JsonLinesSink, MemorySink, RecordSink};
