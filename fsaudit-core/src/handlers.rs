//! Reference event handler that renders events as log lines.

use async_trait::async_trait;
use fsaudit_model::{Event, FileRecord, ModelResult, WATCH_TOPIC};
use tracing::{info, warn};

use crate::broker::EventHandler;

/// Render `event` as a human-readable line.
///
/// Events on `watch_topic` must carry an encoded [`FileRecord`]; anything
/// else is shown raw.
pub fn format_event_line(
    watch_topic: &str,
    topic: &str,
    event: &Event,
) -> ModelResult<String> {
    if topic == watch_topic {
        let record = FileRecord::from_json(&event.payload)?;
        Ok(format!(
            "- File: {} \t Modified: {} \t State: {}",
            record.name,
            record.formatted_modified_at(),
            record.state
        ))
    } else {
        Ok(format!("Topic: {} - Data: {}", topic, event.payload_lossy()))
    }
}

/// Logs one line per delivered event through `tracing`.
#[derive(Debug, Clone)]
pub struct LogHandler {
    watch_topic: String,
}

impl Default for LogHandler {
    fn default() -> Self {
        Self::new(WATCH_TOPIC)
    }
}

impl LogHandler {
    pub fn new(watch_topic: impl Into<String>) -> Self {
        Self {
            watch_topic: watch_topic.into(),
        }
    }
}

#[async_trait]
impl EventHandler for LogHandler {
    async fn handle(&self, topic: &str, event: &Event) {
        match format_event_line(&self.watch_topic, topic, event) {
            Ok(line) => info!(target: "fsaudit::events", "{line}"),
            Err(err) => {
                warn!(target: "fsaudit::events", topic, event_id = %event.id, error = %err, "skipping undecodable event")
            }
        }
    }
}
