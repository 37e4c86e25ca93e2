//! Progress event system for SSE broadcasting.
//!
//! [`EventBus`] wraps a `tokio::sync::broadcast` channel. Every subscriber
//! sees the same events in the same order; a slow or disconnected subscriber
//! lags or drops on its own without delaying anyone else. Nothing is
//! replayed to late joiners.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Importance of a progress event, mirrored by the console colors in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// One line of progress, ready for broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub message: String,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    /// Create a new event stamped with the current time.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity,
            timestamp: Utc::now(),
        }
    }
}

/// Broadcast channel fanning progress events out to all connected observers.
pub struct EventBus {
    tx: broadcast::Sender<ProgressEvent>,
}

impl EventBus {
    /// Create a new event bus. `capacity` is the per-subscriber buffer size.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Register a new observer. Dropping the receiver unregisters it.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.tx.subscribe()
    }

    /// Broadcast an event to all current observers, best-effort.
    pub fn publish(&self, severity: Severity, message: impl Into<String>) {
        let event = ProgressEvent::new(severity, message);
        tracing::debug!(severity = ?event.severity, "{}", event.message);

        // Ignore send errors (no subscribers).
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_and_receive() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(Severity::Info, "Fetching playlist information...");

        let event = rx.try_recv().unwrap();
        assert_eq!(event.severity, Severity::Info);
        assert_eq!(event.message, "Fetching playlist information...");
    }

    #[test]
    fn two_subscribers_see_identical_order() {
        let bus = EventBus::new(64);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.publish(Severity::Info, "one");
        bus.publish(Severity::Success, "two");
        bus.publish(Severity::Warning, "three");
        bus.publish(Severity::Error, "four");

        for expected in ["one", "two", "three", "four"] {
            let ea = a.try_recv().unwrap();
            let eb = b.try_recv().unwrap();
            assert_eq!(ea.message, expected);
            assert_eq!(eb.message, expected);
            assert_eq!(ea.severity, eb.severity);
        }
    }

    #[test]
    fn no_subscribers_does_not_panic() {
        let bus = EventBus::new(4);
        bus.publish(Severity::Error, "nobody listening");
    }

    #[test]
    fn dropped_subscriber_does_not_affect_others() {
        let bus = EventBus::new(16);
        let gone = bus.subscribe();
        let mut kept = bus.subscribe();
        drop(gone);

        bus.publish(Severity::Info, "still delivered");
        assert_eq!(kept.try_recv().unwrap().message, "still delivered");
    }

    #[test]
    fn event_serde_roundtrip() {
        let event = ProgressEvent::new(Severity::Warning, "Skipped 1 video");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""severity":"warning""#));

        let back: ProgressEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.message, event.message);
        assert_eq!(back.severity, event.severity);
    }
}
