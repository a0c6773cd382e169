use thiserror::Error;

use crate::models::AuditConfig;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigGuardRailError {
    #[error("{field} must be greater than zero")]
    ZeroInterval { field: &'static str },
    #[error("topic must not be empty")]
    EmptyTopic,
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// Reject configurations the auditor cannot run with and collect warnings
/// for ones that run but probably do not do what was meant.
pub fn apply_guard_rails(
    config: &AuditConfig,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    if config.scan_interval_ms == 0 {
        return Err(ConfigGuardRailError::ZeroInterval {
            field: "scan_interval_ms",
        });
    }
    if config.delivery_interval_ms == 0 {
        return Err(ConfigGuardRailError::ZeroInterval {
            field: "delivery_interval_ms",
        });
    }
    if config.topic.trim().is_empty() {
        return Err(ConfigGuardRailError::EmptyTopic);
    }

    if !config.root.is_dir() {
        warnings.push_with_hint(
            format!(
                "root {} is not a readable directory; every scan will report a walk error",
                config.root.display()
            ),
            "Point --path at an existing directory",
        );
    }

    if config.delivery_interval_ms > config.scan_interval_ms {
        warnings.push_with_hint(
            "delivery interval is longer than the scan interval; events from several scans will buffer in memory",
            "Lower --delivery-interval or raise --scan-interval",
        );
    }

    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config_in(dir: &std::path::Path) -> AuditConfig {
        AuditConfig {
            root: dir.to_path_buf(),
            ..AuditConfig::default()
        }
    }

    #[test]
    fn defaults_on_existing_root_pass_cleanly() {
        let tmp = tempdir().unwrap();
        let warnings = apply_guard_rails(&config_in(tmp.path())).unwrap();
        assert!(warnings.is_empty());
    }

    #[test]
    fn zero_intervals_are_rejected() {
        let tmp = tempdir().unwrap();
        let mut config = config_in(tmp.path());
        config.delivery_interval_ms = 0;
        assert_eq!(
            apply_guard_rails(&config).unwrap_err(),
            ConfigGuardRailError::ZeroInterval {
                field: "delivery_interval_ms"
            }
        );

        config.delivery_interval_ms = 10;
        config.scan_interval_ms = 0;
        assert!(matches!(
            apply_guard_rails(&config),
            Err(ConfigGuardRailError::ZeroInterval { field: "scan_interval_ms" })
        ));
    }

    #[test]
    fn blank_topic_is_rejected() {
        let tmp = tempdir().unwrap();
        let mut config = config_in(tmp.path());
        config.topic = "  ".into();
        assert_eq!(
            apply_guard_rails(&config).unwrap_err(),
            ConfigGuardRailError::EmptyTopic
        );
    }

    #[test]
    fn missing_root_and_slow_delivery_warn() {
        let tmp = tempdir().unwrap();
        let mut config = config_in(&tmp.path().join("missing"));
        config.scan_interval_ms = 100;
        config.delivery_interval_ms = 1_000;

        let warnings = apply_guard_rails(&config).unwrap();

        assert_eq!(warnings.len(), 2);
        assert!(warnings.items.iter().all(|w| w.hint.is_some()));
    }
}
