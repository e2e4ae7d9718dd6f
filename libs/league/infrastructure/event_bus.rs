//! In-process event bus
//!
//! Fan-out of [`AppEvent`]s to any number of subscribers. Publishing never
//! blocks and never fails: with no subscribers the event is dropped, and a
//! slow subscriber sees `Lagged` instead of stalling the publisher.

use crate::domain::AppEvent;
use tokio::sync::broadcast;
use tracing::trace;

const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AppEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, event: AppEvent) {
        trace!("Publishing {}", event.name());
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        bus.publish(AppEvent::Connected);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_every_subscriber_sees_event() {
        let bus = EventBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.publish(AppEvent::VotesReset { cleared: 2 });

        assert_eq!(a.try_recv().unwrap(), AppEvent::VotesReset { cleared: 2 });
        assert_eq!(b.try_recv().unwrap(), AppEvent::VotesReset { cleared: 2 });
    }
}
