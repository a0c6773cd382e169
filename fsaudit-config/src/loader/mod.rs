use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::models::{AuditConfig, ConfigSource};
use crate::{CONFIG_JSON_ENV, CONFIG_PATH_ENV, DEFAULT_CONFIG_FILE};

pub mod error;

use error::ConfigLoadError;

/// A resolved configuration together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLoad {
    pub config: AuditConfig,
    pub source: ConfigSource,
}

/// Resolves [`AuditConfig`] in order of precedence:
/// 1) an explicit file (`--config`),
/// 2) `$FSAUDIT_CONFIG_PATH` (TOML or JSON file),
/// 3) `$FSAUDIT_CONFIG_JSON` (inline JSON),
/// 4) `fsaudit.toml` in the working directory,
/// 5) defaults.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    explicit: Option<PathBuf>,
    working_dir: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(mut self, path: Option<PathBuf>) -> Self {
        self.explicit = path;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Resolve against the process environment.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        self.load_with(|key| env::var(key).ok())
    }

    /// Resolve using `lookup` in place of the process environment.
    pub fn load_with<F>(&self, lookup: F) -> Result<ConfigLoad, ConfigLoadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = &self.explicit {
            let config = load_from_file(path)?;
            return Ok(ConfigLoad {
                config,
                source: ConfigSource::Explicit(path.clone()),
            });
        }

        if let Some(raw) = non_empty(CONFIG_PATH_ENV) {
            let path = PathBuf::from(raw);
            let config = load_from_file(&path)?;
            return Ok(ConfigLoad {
                config,
                source: ConfigSource::EnvPath(path),
            });
        }

        if let Some(raw) = non_empty(CONFIG_JSON_ENV) {
            let config = parse_json(&raw, CONFIG_JSON_ENV)?;
            return Ok(ConfigLoad {
                config,
                source: ConfigSource::EnvInline,
            });
        }

        if let Some(path) = self.find_default_file() {
            let config = load_from_file(&path)?;
            return Ok(ConfigLoad {
                config,
                source: ConfigSource::File(path),
            });
        }

        debug!("no config file found; using defaults");
        Ok(ConfigLoad {
            config: AuditConfig::default(),
            source: ConfigSource::Default,
        })
    }

    fn find_default_file(&self) -> Option<PathBuf> {
        let dir = match &self.working_dir {
            Some(dir) => dir.clone(),
            None => env::current_dir().ok()?,
        };
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        candidate.is_file().then_some(candidate)
    }
}

/// Read a TOML or JSON config file; the extension picks the format and
/// anything other than `.json` is read as TOML.
pub fn load_from_file(path: &Path) -> Result<AuditConfig, ConfigLoadError> {
    let contents =
        fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => parse_json(&contents, &path.display().to_string()),
        _ => toml::from_str(&contents).map_err(|source| ConfigLoadError::Toml {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn parse_json(raw: &str, origin: &str) -> Result<AuditConfig, ConfigLoadError> {
    serde_json::from_str(raw).map_err(|source| ConfigLoadError::Json {
        origin: origin.to_string(),
        source,
    })
}
