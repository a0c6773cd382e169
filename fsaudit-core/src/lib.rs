//! Core of the fsaudit file-change auditor.
//!
//! A [`DiffEngine`] walks a directory tree on every scan, compares what it
//! finds with the snapshot left by the previous scan, and publishes one
//! event per new, modified or removed file. Events flow through a
//! [`Broker`], which buffers them per topic and hands them to registered
//! [`EventHandler`]s on a timer. The [`Auditor`] drives both sides and
//! stops cooperatively when its cancellation token fires.
//!
//! ```text
//! Auditor ──tick──▶ DiffEngine::scan ──publish──▶ Broker
//!                                                   │ deliver (every interval)
//!                                                   ▼
//!                                              EventHandler(s)
//! ```

#![allow(missing_docs)]

pub mod broker;
pub mod diff;
pub mod error;
pub mod handlers;
pub mod ids;
pub mod runtime;

pub use broker::{
    Broker, DeliveryReport, EventHandler, EventPublisher, new_event,
};
pub use diff::{DiffEngine, ScanOptions, ScanReport, WalkOptions};
pub use error::{AuditError, Result};
pub use fsaudit_model::{Event, FileRecord, FileState, WATCH_TOPIC};
pub use handlers::{LogHandler, format_event_line};
pub use runtime::{Auditor, AuditorSettings, PROBE_TOPIC};
pub use tokio_util::sync::CancellationToken;
