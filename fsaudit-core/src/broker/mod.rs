//! Topic-keyed, timer-driven in-process event broker.
//!
//! Producers append to a per-topic buffer; every subscription runs a
//! delivery loop that swaps the topic's buffer out under a single exclusive
//! lock and fans the drained events out to each registered handler. Buffers
//! are unbounded: a producer that outpaces delivery grows memory until the
//! next cycle.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fsaudit_model::Event;
use tokio::sync::RwLock;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{AuditError, Result};
use crate::ids::generate_id;

pub mod traits;
pub use traits::{EventHandler, EventPublisher};

/// Build an event envelope with a freshly generated id.
pub fn new_event(
    topic: impl Into<String>,
    payload: impl Into<Vec<u8>>,
) -> Result<Event> {
    Ok(Event::new(generate_id()?, topic, payload))
}

/// Outcome of a single delivery cycle for one topic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Events drained from the topic buffer.
    pub events: usize,
    /// Handlers registered for the topic when the cycle ran.
    pub handlers: usize,
    /// Handler invocations that ran to completion.
    pub completed: usize,
    /// Handler invocations that panicked or were aborted.
    pub failed: usize,
}

type HandlerList = Vec<Arc<dyn EventHandler>>;

/// In-memory publish/subscribe hub shared by the scanner and its consumers.
pub struct Broker {
    id: String,
    pending: RwLock<HashMap<String, Vec<Event>>>,
    handlers: RwLock<HashMap<String, HandlerList>>,
}

impl fmt::Debug for Broker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Broker");
        debug.field("id", &self.id);

        match self.pending.try_read() {
            Ok(guard) => {
                let buffered: usize = guard.values().map(Vec::len).sum();
                debug
                    .field("topics", &guard.len())
                    .field("buffered_events", &buffered);
            }
            Err(_) => {
                debug.field("pending", &"<locked>");
            }
        }

        debug.finish()
    }
}

impl Broker {
    pub fn new() -> Result<Self> {
        Ok(Self {
            id: generate_id()?,
            pending: RwLock::new(HashMap::new()),
            handlers: RwLock::new(HashMap::new()),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Append `event` to the end of `topic`'s buffer.
    pub async fn publish(&self, topic: &str, event: Event) {
        let mut guard = self.pending.write().await;
        guard.entry(topic.to_string()).or_default().push(event);
    }

    /// Copy of the events currently buffered for `topic`, in publish order.
    pub async fn pending(&self, topic: &str) -> Vec<Event> {
        let guard = self.pending.read().await;
        guard.get(topic).cloned().unwrap_or_default()
    }

    pub async fn pending_len(&self, topic: &str) -> usize {
        let guard = self.pending.read().await;
        guard.get(topic).map_or(0, Vec::len)
    }

    pub async fn handler_count(&self, topic: &str) -> usize {
        let guard = self.handlers.read().await;
        guard.get(topic).map_or(0, Vec::len)
    }

    /// Add `handler` to the set that receives `topic`'s events. Registration
    /// alone does not start a delivery loop; see [`Broker::subscribe`].
    pub async fn register(&self, topic: &str, handler: Arc<dyn EventHandler>) {
        let mut guard = self.handlers.write().await;
        guard.entry(topic.to_string()).or_default().push(handler);
    }

    /// Register `handler` for `topic` and spawn a delivery loop that runs
    /// every `every` until `shutdown` fires.
    ///
    /// Each loop drains the whole topic to every registered handler, so
    /// several subscriptions on one topic never deliver an event twice to
    /// the same handler.
    pub async fn subscribe(
        self: &Arc<Self>,
        topic: impl Into<String>,
        handler: Arc<dyn EventHandler>,
        every: Duration,
        shutdown: CancellationToken,
    ) -> Result<JoinHandle<()>> {
        let topic = topic.into();
        check_interval(every)?;
        self.register(&topic, handler).await;
        self.spawn_delivery_loop(topic, every, shutdown)
    }

    /// Spawn a loop that runs [`Broker::deliver`] for `topic` every `every`
    /// until `shutdown` fires.
    pub fn spawn_delivery_loop(
        self: &Arc<Self>,
        topic: String,
        every: Duration,
        shutdown: CancellationToken,
    ) -> Result<JoinHandle<()>> {
        check_interval(every)?;

        let broker = Arc::clone(self);
        Ok(tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        debug!(target: "fsaudit::broker", topic = %topic, "delivery loop shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        let report = broker.deliver(&topic).await;
                        if report.events > 0 {
                            debug!(
                                target: "fsaudit::broker",
                                topic = %topic,
                                events = report.events,
                                handlers = report.handlers,
                                failed = report.failed,
                                "delivery cycle complete"
                            );
                        }
                    }
                }
            }
        }))
    }

    /// Run one delivery cycle for `topic`.
    ///
    /// The buffer is swapped for an empty one under a single exclusive lock,
    /// so an event is either in this cycle's batch or in the next one. The
    /// cycle returns once every handler invocation has finished. Without any
    /// registered handler the buffer is left untouched.
    pub async fn deliver(&self, topic: &str) -> DeliveryReport {
        let handlers = {
            let guard = self.handlers.read().await;
            guard.get(topic).cloned().unwrap_or_default()
        };
        if handlers.is_empty() {
            return DeliveryReport::default();
        }

        let drained = {
            let mut guard = self.pending.write().await;
            guard.remove(topic).unwrap_or_default()
        };

        let mut report = DeliveryReport {
            events: drained.len(),
            handlers: handlers.len(),
            ..DeliveryReport::default()
        };
        if drained.is_empty() {
            return report;
        }

        let topic: Arc<str> = Arc::from(topic);
        let mut tasks = JoinSet::new();
        for event in drained {
            let event = Arc::new(event);
            for handler in &handlers {
                let handler = Arc::clone(handler);
                let topic = Arc::clone(&topic);
                let event = Arc::clone(&event);
                tasks.spawn(async move {
                    handler.handle(&topic, &event).await;
                });
            }
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(()) => report.completed += 1,
                Err(err) => {
                    report.failed += 1;
                    warn!(target: "fsaudit::broker", topic = %topic, error = %err, "event handler failed");
                }
            }
        }

        report
    }

    /// Drop everything buffered for `topic`.
    pub async fn clean(&self, topic: &str) {
        let mut guard = self.pending.write().await;
        guard.remove(topic);
    }
}

fn check_interval(every: Duration) -> Result<()> {
    if every.is_zero() {
        return Err(AuditError::InvalidInterval {
            what: "delivery",
            interval: every,
        });
    }
    Ok(())
}

#[async_trait]
impl EventPublisher for Broker {
    async fn publish(&self, topic: &str, event: Event) {
        Broker::publish(self, topic, event).await
    }
}
