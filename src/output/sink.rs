//! Message sinks

use super::message::Message;
use crate::error::{Error, Result};
use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Destination of sync messages
#[async_trait]
pub trait RecordSink: Send {
    /// Write one message
    async fn write(&mut self, message: &Message) -> Result<()>;

    /// Flush buffered output
    async fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Writes each message as one line of JSON
pub struct JsonLinesSink<W> {
    writer: W,
}

impl JsonLinesSink<tokio::io::Stdout> {
    /// Sink writing to standard output
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W: AsyncWrite + Unpin + Send> JsonLinesSink<W> {
    /// Create a sink over any async writer
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> RecordSink for JsonLinesSink<W> {
    async fn write(&mut self, message: &Message) -> Result<()> {
        let mut line = message
            .to_line()
            .map_err(|e| Error::output(format!("Failed to serialize message: {e}")))?;
        line.push('\n');

        self.writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| Error::output(format!("Failed to write message: {e}")))
    }

    async fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .await
            .map_err(|e| Error::output(format!("Failed to flush output: {e}")))
    }
}

/// Keeps messages in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    /// Messages in write order
    pub messages: Vec<Message>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records written to a stream
    pub fn records(&self, stream: &str) -> Vec<&serde_json::Value> {
        self.messages
            .iter()
            .filter_map(|m| match m {
                Message::Record {
                    stream: s, record, ..
                } if s == stream => Some(record),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn write(&mut self, message: &Message) -> Result<()> {
        self.messages.push(message.clone());
        Ok(())
    }
}
