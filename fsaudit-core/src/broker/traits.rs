use async_trait::async_trait;
use fsaudit_model::Event;

/// Sink for events produced by the diff engine or any other producer.
///
/// Publishing never fails: the broker buffers without bound and delivery is
/// best-effort.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, event: Event);
}

/// Consumer invoked once per buffered event on every delivery cycle.
///
/// Handlers for the same event run concurrently; no ordering is implied
/// between them.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, topic: &str, event: &Event);
}

#[async_trait]
impl<F> EventHandler for F
where
    F: Fn(&str, &Event) + Send + Sync,
{
    async fn handle(&self, topic: &str, event: &Event) {
        self(topic, event)
    }
}
