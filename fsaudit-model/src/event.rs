use std::borrow::Cow;

use chrono::{DateTime, Utc};

/// Immutable envelope the broker buffers and hands to handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: String,
    pub topic: String,
    pub payload: Vec<u8>,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    /// Wrap a payload under `topic`, stamped with the current time.
    pub fn new(
        id: String,
        topic: impl Into<String>,
        payload: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            id,
            topic: topic.into(),
            payload: payload.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn payload_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}
