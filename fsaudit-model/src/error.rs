use std::fmt::{self, Display};

/// Errors produced by model constructors and wire-format routines.
#[derive(Debug)]
pub enum ModelError {
    #[cfg(feature = "serde")]
    Json(serde_json::Error),
    InvalidState(String),
    InvalidTimestamp(String),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(feature = "serde")]
            ModelError::Json(err) => write!(f, "json error: {err}"),
            ModelError::InvalidState(raw) => {
                write!(f, "invalid file state: {raw}")
            }
            ModelError::InvalidTimestamp(raw) => {
                write!(f, "invalid modification time: {raw}")
            }
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            #[cfg(feature = "serde")]
            ModelError::Json(err) => Some(err),
            ModelError::InvalidState(_) | ModelError::InvalidTimestamp(_) => None,
        }
    }
}

#[cfg(feature = "serde")]
impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Json(err)
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;
