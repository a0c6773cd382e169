use std::path::PathBuf;
use std::time::Duration;

use fsaudit_core::{AuditorSettings, ScanOptions, WATCH_TOPIC, WalkOptions};
use serde::{Deserialize, Serialize};

/// Source that produced the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigSource {
    #[default]
    Default,
    /// File named on the command line.
    Explicit(PathBuf),
    /// File named by `FSAUDIT_CONFIG_PATH`.
    EnvPath(PathBuf),
    /// JSON carried by `FSAUDIT_CONFIG_JSON`.
    EnvInline,
    /// `fsaudit.toml` found in the working directory.
    File(PathBuf),
}

/// Top-level auditor settings. Every field is optional in the file; missing
/// ones fall back to [`AuditConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Directory tree to audit.
    pub root: PathBuf,
    /// Milliseconds between two scans. Short intervals catch changes sooner
    /// but walk the whole tree each time.
    pub scan_interval_ms: u64,
    /// Milliseconds between two delivery cycles per topic. Events buffer in
    /// memory for up to this long.
    pub delivery_interval_ms: u64,
    /// Topic file-change events are published under.
    pub topic: String,
    /// Follow symbolic links while walking.
    pub follow_links: bool,
    /// Stop descending below this depth (root is depth 0).
    pub max_depth: Option<usize>,
    /// Publish a probe event on the `test` topic at startup.
    pub announce: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            scan_interval_ms: 6_000,
            delivery_interval_ms: 500,
            topic: WATCH_TOPIC.to_string(),
            follow_links: false,
            max_depth: None,
            announce: true,
        }
    }
}

impl AuditConfig {
    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }

    pub fn delivery_interval(&self) -> Duration {
        Duration::from_millis(self.delivery_interval_ms)
    }

    /// Runtime settings for [`fsaudit_core::Auditor`].
    pub fn to_settings(&self) -> AuditorSettings {
        AuditorSettings {
            root: self.root.clone(),
            scan_interval: self.scan_interval(),
            delivery_interval: self.delivery_interval(),
            scan: ScanOptions {
                topic: self.topic.clone(),
                walk: WalkOptions {
                    follow_links: self.follow_links,
                    max_depth: self.max_depth,
                },
            },
            announce: self.announce,
        }
    }
}
