//! Configuration library for fsaudit.
//!
//! Resolves [`AuditConfig`] from an explicit file, environment variables, a
//! default file in the working directory, or built-in defaults, and checks
//! the result against guard rails before the auditor starts.

#![allow(missing_docs)]

pub mod loader;
pub mod models;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoader, error::ConfigLoadError, load_from_file};
pub use models::{AuditConfig, ConfigSource};
pub use validation::{
    ConfigGuardRailError, ConfigWarning, ConfigWarnings, apply_guard_rails,
};

/// Environment variable naming a TOML or JSON config file.
pub const CONFIG_PATH_ENV: &str = "FSAUDIT_CONFIG_PATH";

/// Environment variable carrying inline JSON configuration.
pub const CONFIG_JSON_ENV: &str = "FSAUDIT_CONFIG_JSON";

/// File picked up from the working directory when nothing else is set.
pub const DEFAULT_CONFIG_FILE: &str = "fsaudit.toml";
