use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::{AuditError, Result};

/// Traversal knobs for a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkOptions {
    /// Whether to follow symbolic links
    pub follow_links: bool,
    /// Maximum depth for directory traversal (None = unlimited)
    pub max_depth: Option<usize>,
}

/// A leaf file seen during a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedFile {
    pub path: PathBuf,
    pub name: String,
    pub modified_at: DateTime<Local>,
}

/// Files collected by one walk plus every failure reported along the way.
#[derive(Debug, Default)]
pub struct WalkOutcome {
    pub files: Vec<ObservedFile>,
    pub errors: Vec<AuditError>,
}

/// Walk `root` recursively and collect every non-directory entry.
///
/// An unreadable directory only cuts off its own subtree: walkdir yields the
/// error once and carries on with the siblings. Entries are visited in file
/// name order so event order is reproducible.
pub fn walk_tree(root: &Path, options: &WalkOptions) -> WalkOutcome {
    let mut walker = WalkDir::new(root)
        .follow_links(options.follow_links)
        .sort_by_file_name();

    if let Some(depth) = options.max_depth {
        walker = walker.max_depth(depth);
    }

    let mut outcome = WalkOutcome::default();

    for entry in walker {
        match entry {
            Ok(entry) => {
                // We skip directories
                if entry.file_type().is_dir() {
                    continue;
                }

                match observe(&entry) {
                    Ok(file) => outcome.files.push(file),
                    Err(err) => {
                        warn!(target: "fsaudit::scan", error = %err, "skipping unreadable entry");
                        outcome.errors.push(err);
                    }
                }
            }
            Err(err) => {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf());
                warn!(target: "fsaudit::scan", path = %path.display(), error = %err, "error walking directory");
                outcome.errors.push(AuditError::Walk {
                    path,
                    message: err.to_string(),
                });
            }
        }
    }

    debug!(
        target: "fsaudit::scan",
        root = %root.display(),
        files = outcome.files.len(),
        errors = outcome.errors.len(),
        "walk finished"
    );

    outcome
}

fn observe(entry: &DirEntry) -> Result<ObservedFile> {
    let walk_error = |message: String| AuditError::Walk {
        path: entry.path().to_path_buf(),
        message,
    };

    let metadata = entry.metadata().map_err(|err| walk_error(err.to_string()))?;
    let modified = metadata
        .modified()
        .map_err(|err| walk_error(err.to_string()))?;

    Ok(ObservedFile {
        path: entry.path().to_path_buf(),
        name: entry.file_name().to_string_lossy().into_owned(),
        modified_at: DateTime::<Local>::from(modified),
    })
}
