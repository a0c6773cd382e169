use std::path::PathBuf;
use std::time::Duration;

use fsaudit_model::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] ModelError),

    #[error("Identifier generation failed: {0}")]
    IdGeneration(String),

    #[error("Invalid interval for {what}: {interval:?}")]
    InvalidInterval {
        what: &'static str,
        interval: Duration,
    },

    #[error("Failed to walk {path}: {message}")]
    Walk { path: PathBuf, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuditError {
    /// Errors after which the auditor cannot keep producing valid events.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AuditError::IdGeneration(_))
    }
}

pub type Result<T> = std::result::Result<T, AuditError>;
