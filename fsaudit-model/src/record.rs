use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local};

use crate::MODIFIED_AT_FORMAT;
use crate::error::{ModelError, Result};

/// Classification of a file relative to the previous scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FileState {
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "OK"))]
    Unchanged,
    #[cfg_attr(feature = "serde", serde(rename = "NEW"))]
    New,
    #[cfg_attr(feature = "serde", serde(rename = "MOD"))]
    Modified,
    #[cfg_attr(feature = "serde", serde(rename = "DEL"))]
    Deleted,
}

impl FileState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileState::Unchanged => "OK",
            FileState::New => "NEW",
            FileState::Modified => "MOD",
            FileState::Deleted => "DEL",
        }
    }

    /// `true` for the states that represent fresh content.
    pub fn is_change(&self) -> bool {
        matches!(self, FileState::New | FileState::Modified)
    }
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileState {
    type Err = ModelError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw {
            "OK" => Ok(FileState::Unchanged),
            "NEW" => Ok(FileState::New),
            "MOD" => Ok(FileState::Modified),
            "DEL" => Ok(FileState::Deleted),
            other => Err(ModelError::InvalidState(other.to_string())),
        }
    }
}

/// One filesystem entry as observed by a single scan pass.
///
/// `identity` is derived from the base name only, so two files sharing a
/// name in different directories map onto the same record.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct FileRecord {
    pub identity: String,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(with = "crate::wire_time"))]
    pub modified_at: DateTime<Local>,
    pub change_fingerprint: String,
    pub scan_token: String,
    pub state: FileState,
    pub changed: bool,
}

impl FileRecord {
    /// Build a freshly observed record. Every record starts out as `New`
    /// until the diff engine classifies it against its snapshot.
    pub fn observed(
        identity: String,
        name: String,
        modified_at: DateTime<Local>,
        change_fingerprint: String,
        scan_token: String,
    ) -> Self {
        Self {
            identity,
            name,
            modified_at,
            change_fingerprint,
            scan_token,
            state: FileState::New,
            changed: true,
        }
    }

    /// Set the classification and keep `changed` in step with it.
    pub fn set_state(&mut self, state: FileState) {
        self.state = state;
        self.changed = state.is_change();
    }

    /// Consume the record into its terminal `Deleted` form.
    pub fn into_deleted(mut self) -> Self {
        self.set_state(FileState::Deleted);
        self
    }

    pub fn formatted_modified_at(&self) -> String {
        self.modified_at.format(MODIFIED_AT_FORMAT).to_string()
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    #[cfg(feature = "serde")]
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
