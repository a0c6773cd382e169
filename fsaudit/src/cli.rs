use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use fsaudit_config::AuditConfig;

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "fsaudit", version)]
#[command(
    about = "Poll a directory tree and log every added, modified or removed file"
)]
pub struct Cli {
    /// Directory tree to audit
    #[arg(long, value_name = "DIR")]
    pub path: Option<PathBuf>,

    /// Time between two scans (e.g. `6s`, `1m 30s`)
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub scan_interval: Option<Duration>,

    /// Time between two delivery cycles (e.g. `500ms`)
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub delivery_interval: Option<Duration>,

    /// Topic file-change events are published under
    #[arg(long)]
    pub topic: Option<String>,

    /// Follow symbolic links while walking
    #[arg(long)]
    pub follow_links: bool,

    /// Do not descend below this many directory levels
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,

    /// Skip the startup probe event on the `test` topic
    #[arg(long)]
    pub no_announce: bool,

    /// Read settings from this TOML or JSON file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Scan once, deliver pending events and exit
    #[arg(long)]
    pub once: bool,
}

impl Cli {
    /// Overlay flags given on the command line onto a loaded config.
    pub fn apply_to(&self, config: &mut AuditConfig) {
        if let Some(path) = &self.path {
            config.root = path.clone();
        }
        if let Some(interval) = self.scan_interval {
            config.scan_interval_ms = millis(interval);
        }
        if let Some(interval) = self.delivery_interval {
            config.delivery_interval_ms = millis(interval);
        }
        if let Some(topic) = &self.topic {
            config.topic = topic.clone();
        }
        if self.follow_links {
            config.follow_links = true;
        }
        if self.max_depth.is_some() {
            config.max_depth = self.max_depth;
        }
        if self.no_announce {
            config.announce = false;
        }
    }
}

fn millis(interval: Duration) -> u64 {
    u64::try_from(interval.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_loaded_values() {
        let cli = Cli::parse_from([
            "fsaudit",
            "--path",
            "/data",
            "--scan-interval",
            "1m 30s",
            "--delivery-interval",
            "250ms",
            "--max-depth",
            "4",
            "--no-announce",
        ]);
        let mut config = AuditConfig::default();

        cli.apply_to(&mut config);

        assert_eq!(config.root, PathBuf::from("/data"));
        assert_eq!(config.scan_interval_ms, 90_000);
        assert_eq!(config.delivery_interval_ms, 250);
        assert_eq!(config.max_depth, Some(4));
        assert!(!config.announce);
        assert_eq!(config.topic, "watch");
    }

    #[test]
    fn absent_flags_keep_loaded_values() {
        let cli = Cli::parse_from(["fsaudit"]);
        let mut config = AuditConfig {
            topic: "audit".into(),
            follow_links: true,
            ..AuditConfig::default()
        };
        let before = config.clone();

        cli.apply_to(&mut config);

        assert_eq!(config, before);
    }

    #[test]
    fn malformed_durations_are_rejected() {
        let parsed =
            Cli::try_parse_from(["fsaudit", "--scan-interval", "often"]);
        assert!(parsed.is_err());
    }
}
