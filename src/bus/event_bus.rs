use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

const BUS_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    pub id: String,
    pub run_id: String,
    pub seq: i64,
    pub category: String,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub created_at: String,
}

/// Broadcast bus bound to a single run id.
pub struct EventBus {
    run_id: String,
    tx: broadcast::Sender<RunEvent>,
    seq: AtomicI64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_run_id(Uuid::new_v4().to_string())
    }

    pub fn with_run_id(run_id: impl Into<String>) -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self {
            run_id: run_id.into(),
            tx,
            seq: AtomicI64::new(0),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Builds, stamps and publishes an event.
    pub fn emit(
        &self,
        category: &str,
        event_type: &str,
        payload: serde_json::Value,
    ) -> RunEvent {
        let event = RunEvent {
            id: Uuid::new_v4().to_string(),
            run_id: self.run_id.clone(),
            seq: self.seq.fetch_add(1, Ordering::Relaxed),
            category: category.to_string(),
            event_type: event_type.to_string(),
            payload,
            created_at: Utc::now().to_rfc3339(),
        };
        // Nobody listening is normal for library use.
        if self.tx.send(event.clone()).is_err() {
            tracing::debug!(event_type, "no event subscribers");
        }
        event
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::bus::event_types::{CATEGORY_RUN, EVENT_RUN_PHASE};

    #[tokio::test]
    async fn events_are_sequenced_and_stamped() {
        let bus = EventBus::with_run_id("run-1");
        let mut rx = bus.subscribe();

        bus.emit(CATEGORY_RUN, EVENT_RUN_PHASE, json!({"phase": "opening"}));
        bus.emit(CATEGORY_RUN, EVENT_RUN_PHASE, json!({"phase": "playing"}));

        let first = rx.recv().await.expect("first event");
        let second = rx.recv().await.expect("second event");
        assert_eq!(first.run_id, "run-1");
        assert_eq!((first.seq, second.seq), (0, 1));
        assert_eq!(second.payload["phase"], "playing");
        assert!(chrono::DateTime::parse_from_rfc3339(&first.created_at).is_ok());
    }

    #[test]
    fn emitting_without_subscribers_is_fine() {
        let bus = EventBus::new();
        let event = bus.emit(CATEGORY_RUN, EVENT_RUN_PHASE, json!({}));
        assert_eq!(event.seq, 0);
    }
}
