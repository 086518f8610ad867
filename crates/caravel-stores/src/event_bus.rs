//! EventBus - realtime event fan-out abstraction.
//!
//! The stores persist facts; the bus pushes the same facts to live
//! subscribers. Publishing never blocks on slow consumers.

use async_trait::async_trait;
use tokio::sync::broadcast;

use caravel_core::store::StoreError;

use crate::Event;

/// EventBus trait - async interface for realtime event publish/subscribe.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish an event to all active subscribers.
    async fn publish(&self, event: Event) -> Result<(), StoreError>;

    /// Subscribe to realtime events. Events carry their task id; subscribers
    /// filter for the task they care about.
    fn subscribe(&self) -> broadcast::Receiver<Event>;
}

/// In-process EventBus on a tokio broadcast channel.
pub struct BroadcastEventBus {
    tx: broadcast::Sender<Event>,
}

impl BroadcastEventBus {
    /// Create a bus retaining up to `capacity` undelivered events per
    /// subscriber before old ones are dropped.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }
}

impl Default for BroadcastEventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl EventBus for BroadcastEventBus {
    async fn publish(&self, event: Event) -> Result<(), StoreError> {
        // A send with no subscribers is a non-error; the stores remain
        // source-of-truth and the feed is best-effort.
        let _ = self.tx.send(event);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caravel_core::types::{ExecutionStep, Task};
    use serde_json::json;

    #[test]
    fn test_broadcast_bus_delivers_step_event() {
        tokio_test::block_on(async {
            let bus = BroadcastEventBus::new(16);
            let mut rx = bus.subscribe();

            let step = ExecutionStep::begin("task-1", 1, "tavily_search", json!({"query": "q"}));
            bus.publish(Event::step_update(step)).await.unwrap();

            let event = rx.recv().await.expect("event");
            match event {
                Event::StepUpdate { task_id, step, .. } => {
                    assert_eq!(task_id, "task-1");
                    assert_eq!(step.step_number, 1);
                }
                _ => panic!("expected step update"),
            }
        });
    }

    #[test]
    fn test_broadcast_bus_publish_without_subscribers_is_ok() {
        tokio_test::block_on(async {
            let bus = BroadcastEventBus::new(4);
            bus.publish(Event::task_update(Task::new("hello")))
                .await
                .unwrap();
        });
    }
}
