//! Event system for zone notifications.
//!
//! Decoded zone events and link transitions are published to any number of
//! subscribers. Publishing never waits: a subscriber that falls behind the
//! channel capacity skips the events it missed.

use std::time::Duration;

use tokio::sync::broadcast;

use crate::types::{ZoneState, ZoneStatus};

/// Event types that can be published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Serial link opened.
    Connected,
    /// Serial link lost.
    Disconnected,
    /// Zone status snapshot received.
    ZoneStatus(ZoneStatus),
    /// Zone power and keypad bitmap received.
    ZoneState(ZoneState),
}

impl Event {
    /// Returns the zone this event describes, if it is zone scoped.
    #[must_use]
    pub const fn zone(&self) -> Option<u8> {
        match self {
            Self::ZoneStatus(status) => Some(status.zone),
            _ => None,
        }
    }
}

/// A subscription to events.
pub struct Subscription {
    receiver: broadcast::Receiver<Event>,
}

impl Subscription {
    /// Receives the next event.
    ///
    /// Returns `None` once the publisher is gone.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::debug!("subscriber lagged, skipped {} events", n);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Waits for the next event matching `filter`, up to `timeout`.
    pub async fn wait_for<F>(&mut self, filter: F, timeout: Duration) -> Option<Event>
    where
        F: Fn(&Event) -> bool,
    {
        tokio::time::timeout(timeout, async {
            loop {
                match self.recv().await {
                    Some(event) if filter(&event) => return Some(event),
                    Some(_) => {}
                    None => return None,
                }
            }
        })
        .await
        .ok()
        .flatten()
    }
}

/// Publishes events to subscribers.
#[derive(Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<Event>,
}

impl EventPublisher {
    /// Creates a new publisher buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    pub fn publish(&self, event: Event) {
        // No receivers is fine
        let _ = self.sender.send(event);
    }

    /// Subscribes to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Level;

    fn status(zone: u8) -> ZoneStatus {
        ZoneStatus {
            zone,
            power: true,
            mute: false,
            party_mode: false,
            party_input: 0,
            input: 1,
            volume: 40,
            treble: Level::Value(0),
            bass: Level::Value(0),
            balance: Level::Value(0),
        }
    }

    #[tokio::test]
    async fn test_event_publish() {
        let publisher = EventPublisher::new(16);
        let mut sub = publisher.subscribe();

        publisher.publish(Event::Connected);

        let event = tokio::time::timeout(Duration::from_millis(100), sub.recv())
            .await
            .unwrap();
        assert_eq!(event, Some(Event::Connected));
    }

    #[test]
    fn test_publish_without_subscribers() {
        let publisher = EventPublisher::new(4);
        assert_eq!(publisher.subscriber_count(), 0);
        publisher.publish(Event::Disconnected);
    }

    #[tokio::test]
    async fn test_wait_for_filters() {
        let publisher = EventPublisher::new(16);
        let mut sub = publisher.subscribe();

        publisher.publish(Event::Connected);
        publisher.publish(Event::ZoneStatus(status(2)));
        publisher.publish(Event::ZoneStatus(status(5)));

        let event = sub
            .wait_for(|e| e.zone() == Some(5), Duration::from_millis(100))
            .await;
        assert_eq!(event.and_then(|e| e.zone()), Some(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_timeout() {
        let publisher = EventPublisher::new(16);
        let mut sub = publisher.subscribe();
        publisher.publish(Event::Connected);

        let event = sub
            .wait_for(|e| matches!(e, Event::Disconnected), Duration::from_secs(1))
            .await;
        assert!(event.is_none());
    }

    #[tokio::test]
    async fn test_lagged_subscriber_keeps_receiving() {
        let publisher = EventPublisher::new(2);
        let mut sub = publisher.subscribe();
        for zone in 1..=5 {
            publisher.publish(Event::ZoneStatus(status(zone)));
        }

        let event = sub.recv().await;
        assert_eq!(event.and_then(|e| e.zone()), Some(4));
    }
}
