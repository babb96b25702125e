//! NDJSON streaming of grouped search results.

use async_trait::async_trait;
use tasklane_db::models::issue_view::IssueGroup;
use tasklane_db::search::{GroupSink, SinkError};
use tokio::sync::mpsc;

/// Buffered lines between the search task and the response body.
pub const STREAM_BUFFER: usize = 16;

/// Group sink that writes each bucket as one JSON line into a channel.
///
/// The receiving half backs the HTTP response body. Once the client goes
/// away the receiver is dropped and the next `emit` fails, which stops
/// bucket processing.
pub struct ChannelSink {
    tx: mpsc::Sender<String>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }
}

/// Serialize a value as a single NDJSON line.
pub fn ndjson_line<T: serde::Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let mut line = serde_json::to_string(value)?;
    line.push('\n');
    Ok(line)
}

#[async_trait]
impl GroupSink for ChannelSink {
    async fn emit(&mut self, group: IssueGroup) -> Result<(), SinkError> {
        let line = ndjson_line(&group)?;
        self.tx
            .send(line)
            .await
            .map_err(|_| SinkError::from("stream receiver closed"))
    }
}
