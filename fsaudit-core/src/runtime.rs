//! Driver that runs the scanner and the broker's delivery loops side by side.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::broker::{Broker, EventHandler, new_event};
use crate::diff::{DiffEngine, ScanOptions, ScanReport};
use crate::error::{AuditError, Result};
use crate::handlers::LogHandler;

/// Topic the startup probe is published under.
pub const PROBE_TOPIC: &str = "test";

/// Knobs for a running auditor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditorSettings {
    /// Directory tree to audit
    pub root: PathBuf,
    /// Pause between the start of two scans
    pub scan_interval: Duration,
    /// Pause between two delivery cycles of each topic
    pub delivery_interval: Duration,
    /// Topic and traversal settings for the diff engine
    pub scan: ScanOptions,
    /// Publish a probe event on [`PROBE_TOPIC`] at startup
    pub announce: bool,
}

impl Default for AuditorSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            scan_interval: Duration::from_secs(6),
            delivery_interval: Duration::from_millis(500),
            scan: ScanOptions::default(),
            announce: true,
        }
    }
}

/// Owns the diff engine and wires it to a shared broker.
pub struct Auditor {
    settings: AuditorSettings,
    broker: Arc<Broker>,
    engine: DiffEngine,
    subscriptions: Vec<(String, Arc<dyn EventHandler>)>,
    attached: bool,
}

impl fmt::Debug for Auditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let topics: Vec<&str> =
            self.subscriptions.iter().map(|(t, _)| t.as_str()).collect();
        f.debug_struct("Auditor")
            .field("settings", &self.settings)
            .field("broker", &self.broker)
            .field("engine", &self.engine)
            .field("subscriptions", &topics)
            .field("attached", &self.attached)
            .finish()
    }
}

impl Auditor {
    pub fn new(settings: AuditorSettings, broker: Arc<Broker>) -> Self {
        let engine = DiffEngine::new(broker.clone(), settings.scan.clone());
        Self {
            settings,
            broker,
            engine,
            subscriptions: Vec::new(),
            attached: false,
        }
    }

    /// Route `topic`'s events to `handler` once the auditor starts.
    pub fn with_handler(
        mut self,
        topic: impl Into<String>,
        handler: Arc<dyn EventHandler>,
    ) -> Self {
        self.subscriptions.push((topic.into(), handler));
        self
    }

    /// Attach the reference [`LogHandler`] to the scan topic, and to the
    /// probe topic when announcing.
    pub fn with_log_handler(self) -> Self {
        let handler = Arc::new(LogHandler::new(self.settings.scan.topic.clone()));
        let announce = self.settings.announce;
        let scan_topic = self.settings.scan.topic.clone();
        let this = self.with_handler(scan_topic, handler.clone());
        if announce {
            this.with_handler(PROBE_TOPIC, handler)
        } else {
            this
        }
    }

    pub fn settings(&self) -> &AuditorSettings {
        &self.settings
    }

    pub fn broker(&self) -> &Arc<Broker> {
        &self.broker
    }

    pub fn engine(&self) -> &DiffEngine {
        &self.engine
    }

    /// Scan and deliver on independent timers until `shutdown` fires or
    /// identifier generation fails.
    ///
    /// A scan already under way when `shutdown` fires runs to completion;
    /// delivery loops are stopped and awaited before returning.
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<()> {
        if self.settings.scan_interval.is_zero() {
            return Err(AuditError::InvalidInterval {
                what: "scan",
                interval: self.settings.scan_interval,
            });
        }

        self.attach().await;

        let delivery = shutdown.child_token();
        let mut loops = Vec::new();
        for topic in self.topics() {
            let handle = self.broker.spawn_delivery_loop(
                topic,
                self.settings.delivery_interval,
                delivery.clone(),
            );
            match handle {
                Ok(handle) => loops.push(handle),
                Err(err) => {
                    delivery.cancel();
                    return Err(err);
                }
            }
        }

        info!(
            target: "fsaudit::runtime",
            root = %self.settings.root.display(),
            broker = %self.broker.id(),
            scan_interval = ?self.settings.scan_interval,
            delivery_interval = ?self.settings.delivery_interval,
            "auditor started"
        );

        let result = self.scan_loop(&shutdown).await;

        delivery.cancel();
        for handle in loops {
            if let Err(err) = handle.await {
                warn!(target: "fsaudit::runtime", error = %err, "delivery loop ended abnormally");
            }
        }

        info!(target: "fsaudit::runtime", "auditor stopped");
        result
    }

    async fn scan_loop(&mut self, shutdown: &CancellationToken) -> Result<()> {
        if self.settings.announce {
            self.announce().await?;
        }

        let mut ticker = interval(self.settings.scan_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!(target: "fsaudit::runtime", "scan loop shutting down");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    if let Err(err) = self.engine.scan(&self.settings.root).await {
                        if err.is_fatal() {
                            error!(target: "fsaudit::runtime", error = %err, "aborting auditor");
                            return Err(err);
                        }
                        warn!(target: "fsaudit::runtime", error = %err, "scan failed");
                    }
                }
            }
        }
    }

    /// Run a single scan followed by one delivery cycle per subscribed topic.
    ///
    /// Handlers have finished with every event by the time this returns.
    pub async fn run_once(&mut self) -> Result<ScanReport> {
        self.attach().await;

        if self.settings.announce {
            self.announce().await?;
        }

        let report = self.engine.scan(&self.settings.root).await?;

        for topic in self.topics() {
            self.broker.deliver(&topic).await;
        }

        Ok(report)
    }

    async fn attach(&mut self) {
        if self.attached {
            return;
        }
        for (topic, handler) in &self.subscriptions {
            self.broker.register(topic, Arc::clone(handler)).await;
        }
        self.attached = true;
    }

    async fn announce(&self) -> Result<()> {
        let event = new_event(PROBE_TOPIC, PROBE_TOPIC)?;
        self.broker.publish(PROBE_TOPIC, event).await;
        Ok(())
    }

    fn topics(&self) -> Vec<String> {
        let unique: BTreeSet<&str> = self
            .subscriptions
            .iter()
            .map(|(topic, _)| topic.as_str())
            .collect();
        unique.into_iter().map(str::to_string).collect()
    }
}
