//! Core data model definitions shared across fsaudit crates.
#![allow(missing_docs)]

pub use ::chrono;

pub mod error;
pub mod event;
pub mod record;
#[cfg(feature = "serde")]
pub mod wire_time;

// Intentionally curated re-exports for downstream consumers.
pub use error::{ModelError, Result as ModelResult};
pub use event::Event;
pub use record::{FileRecord, FileState};

/// Topic file-change records are published under unless configured otherwise.
pub const WATCH_TOPIC: &str = "watch";

/// Human-readable layout for file modification times (`DD/MM/YYYY HH:MM:SS`).
pub const MODIFIED_AT_FORMAT: &str = "%d/%m/%Y %H:%M:%S";
