use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use fsaudit_model::{FileRecord, FileState, WATCH_TOPIC};
use tokio::task::spawn_blocking;
use tracing::{info, warn};

use super::walk::{ObservedFile, WalkOptions, walk_tree};
use crate::broker::{EventPublisher, new_event};
use crate::error::{AuditError, Result};
use crate::ids::{change_fingerprint, generate_id, identity_for};

/// Configuration for the diff engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Topic change records are published under
    pub topic: String,
    /// Traversal settings handed to the walker
    pub walk: WalkOptions,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            topic: WATCH_TOPIC.to_string(),
            walk: WalkOptions::default(),
        }
    }
}

/// Summary of one scan pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub token: String,
    pub files_seen: usize,
    pub new: usize,
    pub modified: usize,
    pub unchanged: usize,
    pub deleted: usize,
    /// Events handed to the publisher.
    pub published: usize,
    /// Records whose payload could not be encoded; no event was sent.
    pub encode_failures: usize,
    /// Traversal failures, one per unreadable entry or subtree.
    pub errors: Vec<String>,
}

impl ScanReport {
    fn new(token: String) -> Self {
        Self {
            token,
            ..Self::default()
        }
    }

    fn count(&mut self, state: FileState) {
        match state {
            FileState::Unchanged => self.unchanged += 1,
            FileState::New => self.new += 1,
            FileState::Modified => self.modified += 1,
            FileState::Deleted => self.deleted += 1,
        }
    }
}

/// Remembers the last scan of a tree and reports what changed since.
///
/// The snapshot is owned outright; `scan` takes `&mut self`, so at most one
/// scan per engine can be in flight.
pub struct DiffEngine {
    publisher: Arc<dyn EventPublisher>,
    options: ScanOptions,
    snapshot: HashMap<String, FileRecord>,
    scan_token: Option<String>,
}

impl fmt::Debug for DiffEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiffEngine")
            .field("options", &self.options)
            .field("tracked_files", &self.snapshot.len())
            .field("scan_token", &self.scan_token)
            .finish()
    }
}

impl DiffEngine {
    pub fn new(publisher: Arc<dyn EventPublisher>, options: ScanOptions) -> Self {
        Self {
            publisher,
            options,
            snapshot: HashMap::new(),
            scan_token: None,
        }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Records from the most recent scan, keyed by identity.
    pub fn snapshot(&self) -> &HashMap<String, FileRecord> {
        &self.snapshot
    }

    pub fn get(&self, identity: &str) -> Option<&FileRecord> {
        self.snapshot.get(identity)
    }

    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }

    /// Token of the latest scan, `None` before the first one.
    pub fn scan_token(&self) -> Option<&str> {
        self.scan_token.as_deref()
    }

    /// Walk `root`, diff it against the snapshot and publish every entry that
    /// is new, modified or gone.
    ///
    /// Deletions are reconciled before any observed record is classified, so
    /// removals always precede additions in the event stream. Traversal and
    /// encoding failures are logged and collected in the report; only a
    /// failure to mint identifiers aborts the scan.
    pub async fn scan(&mut self, root: impl AsRef<Path>) -> Result<ScanReport> {
        let root = root.as_ref().to_path_buf();
        let token = generate_id()?;
        self.scan_token = Some(token.clone());

        let walk_root = root.clone();
        let walk_options = self.options.walk.clone();
        let outcome =
            spawn_blocking(move || walk_tree(&walk_root, &walk_options))
                .await
                .map_err(|err| {
                    AuditError::Internal(format!("walk task failed: {err}"))
                })?;

        let mut report = ScanReport::new(token.clone());
        report.files_seen = outcome.files.len();
        report.errors = outcome.errors.iter().map(ToString::to_string).collect();

        let records: Vec<FileRecord> = outcome
            .files
            .into_iter()
            .map(|file| record_for(file, &token))
            .collect();

        self.touch(&records, &token);
        self.reconcile_deletions(&mut report).await?;

        for record in records {
            let record = self.classify(record);
            report.count(record.state);
            if record.state != FileState::Unchanged {
                self.emit(&record, &mut report).await?;
            }
        }

        info!(
            target: "fsaudit::scan",
            root = %root.display(),
            token = %report.token,
            files = report.files_seen,
            new = report.new,
            modified = report.modified,
            deleted = report.deleted,
            unchanged = report.unchanged,
            errors = report.errors.len(),
            "scan complete"
        );

        Ok(report)
    }

    /// Stamp the current token on every snapshot entry seen by this walk.
    fn touch(&mut self, records: &[FileRecord], token: &str) {
        for record in records {
            if let Some(existing) = self.snapshot.get_mut(&record.identity) {
                existing.scan_token = token.to_string();
            }
        }
    }

    /// Publish and forget every snapshot entry the current scan did not see.
    async fn reconcile_deletions(&mut self, report: &mut ScanReport) -> Result<()> {
        let Some(token) = self.scan_token.clone() else {
            return Ok(());
        };

        let stale: Vec<String> = self
            .snapshot
            .iter()
            .filter(|(_, record)| record.scan_token != token)
            .map(|(identity, _)| identity.clone())
            .collect();

        let mut removed: Vec<FileRecord> = stale
            .iter()
            .filter_map(|identity| self.snapshot.remove(identity))
            .map(FileRecord::into_deleted)
            .collect();
        removed.sort_by(|a, b| a.name.cmp(&b.name));

        for record in removed {
            report.count(record.state);
            self.emit(&record, report).await?;
        }

        Ok(())
    }

    /// Compare `record` with the snapshot and store it as the latest sighting.
    fn classify(&mut self, mut record: FileRecord) -> FileRecord {
        match self.snapshot.get(&record.identity) {
            None => record.set_state(FileState::New),
            Some(previous)
                if previous.change_fingerprint != record.change_fingerprint =>
            {
                record.set_state(FileState::Modified)
            }
            Some(_) => record.set_state(FileState::Unchanged),
        }

        self.snapshot.insert(record.identity.clone(), record.clone());
        record
    }

    async fn emit(&self, record: &FileRecord, report: &mut ScanReport) -> Result<()> {
        let payload = match record.to_json() {
            Ok(payload) => payload,
            Err(err) => {
                warn!(target: "fsaudit::scan", file = %record.name, error = %err, "failed to encode file record");
                report.encode_failures += 1;
                return Ok(());
            }
        };

        let event = new_event(self.options.topic.as_str(), payload)?;
        self.publisher.publish(&self.options.topic, event).await;
        report.published += 1;
        Ok(())
    }
}

fn record_for(file: ObservedFile, token: &str) -> FileRecord {
    let identity = identity_for(&file.name);
    let fingerprint = change_fingerprint(&identity, file.modified_at.timestamp());
    FileRecord::observed(
        identity,
        file.name,
        file.modified_at,
        fingerprint,
        token.to_string(),
    )
}
