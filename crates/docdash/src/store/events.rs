//! Change notifications for views that mirror the task store.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::sync::polling::PollState;

/// Something visible changed in the task store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    /// The task list and dashboard were replaced by a full refresh.
    Reconciled {
        task_count: usize,
        processing: usize,
    },
    /// An uploaded task was inserted at the head.
    TaskInserted { id: String, filename: String },
    /// A task was removed, either by a delete or because the service no longer knows it.
    TaskRemoved { id: String },
    /// A delete failed and the task was put back.
    TaskRestored { id: String, index: usize },
    /// A single task was replaced from its status record.
    TaskUpdated { id: String },
    SummaryUpdated { id: String },
    SummaryFailed { id: String, message: String },
    /// A refresh failed; the store still holds the last good state.
    RefreshFailed { message: String },
    PollStateChanged { from: PollState, to: PollState },
}

impl StoreEvent {
    /// Id of the task this event concerns, if any.
    pub fn task_id(&self) -> Option<&str> {
        match self {
            StoreEvent::TaskInserted { id, .. }
            | StoreEvent::TaskRemoved { id }
            | StoreEvent::TaskRestored { id, .. }
            | StoreEvent::TaskUpdated { id }
            | StoreEvent::SummaryUpdated { id }
            | StoreEvent::SummaryFailed { id, .. } => Some(id),
            StoreEvent::Reconciled { .. }
            | StoreEvent::RefreshFailed { .. }
            | StoreEvent::PollStateChanged { .. } => None,
        }
    }
}

impl std::fmt::Display for StoreEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreEvent::Reconciled {
                task_count,
                processing,
            } => write!(f, "Synced {} tasks ({} processing)", task_count, processing),
            StoreEvent::TaskInserted { id, filename } => {
                write!(f, "Uploaded {} as {}", filename, id)
            }
            StoreEvent::TaskRemoved { id } => write!(f, "Removed {}", id),
            StoreEvent::TaskRestored { id, index } => {
                write!(f, "Restored {} at position {}", id, index)
            }
            StoreEvent::TaskUpdated { id } => write!(f, "Updated {}", id),
            StoreEvent::SummaryUpdated { id } => write!(f, "Summary ready for {}", id),
            StoreEvent::SummaryFailed { id, message } => {
                write!(f, "Summary for {} failed: {}", id, message)
            }
            StoreEvent::RefreshFailed { message } => write!(f, "Refresh failed: {}", message),
            StoreEvent::PollStateChanged { from, to } => {
                write!(f, "Polling {} -> {}", from, to)
            }
        }
    }
}

/// Broadcasts store events to any number of views.
#[derive(Clone)]
pub struct StoreBroadcaster {
    sender: Arc<broadcast::Sender<StoreEvent>>,
}

impl StoreBroadcaster {
    /// Creates a new broadcaster with the specified channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Sends an event to all subscribers.
    pub fn send(&self, event: StoreEvent) {
        // No subscribers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for StoreBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let broadcaster = StoreBroadcaster::default();
        let mut rx = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 1);

        broadcaster.send(StoreEvent::TaskRemoved {
            id: "t1".to_string(),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.task_id(), Some("t1"));
        assert_eq!(event.to_string(), "Removed t1");
    }

    #[test]
    fn test_send_without_subscribers_is_silent() {
        let broadcaster = StoreBroadcaster::new(4);
        broadcaster.send(StoreEvent::RefreshFailed {
            message: "offline".to_string(),
        });
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = StoreEvent::PollStateChanged {
            from: PollState::Idle,
            to: PollState::Polling,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "poll_state_changed");
        assert_eq!(json["from"], "idle");
        assert_eq!(json["to"], "polling");
    }
}
