//! Store event channel
//!
//! The store accessor publishes here; the notification layer subscribes.
//! Write failures never reach the caller that scheduled the write, so a
//! subscriber is the only place they can be observed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

/// Default number of events buffered for slow subscribers
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreOperation {
    Create,
    Update,
    /// Create-or-replace (budgets, profiles)
    Write,
    Read,
    List,
}

impl StoreOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Write => "write",
            Self::Read => "read",
            Self::List => "list",
        }
    }
}

/// A write that reached the store
#[derive(Debug, Clone, Serialize)]
pub struct StoreWrite {
    pub path: String,
    pub operation: StoreOperation,
    pub user_id: String,
    pub at: DateTime<Utc>,
}

/// An operation the store rejected or could not complete
#[derive(Debug, Clone, Serialize)]
pub struct StoreFailure {
    pub path: String,
    pub operation: StoreOperation,
    /// Caller identity, if any
    pub user_id: Option<String>,
    /// Data the caller tried to write
    pub request_data: Option<serde_json::Value>,
    /// Machine-readable error kind, e.g. `permission_denied`
    pub kind: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StoreEvent {
    Persisted(StoreWrite),
    Failed(StoreFailure),
}

impl StoreEvent {
    /// The user the event should be shown to
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::Persisted(w) => Some(&w.user_id),
            Self::Failed(f) => f.user_id.as_deref(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Publisher half of the channel; cheap to clone
#[derive(Clone)]
pub struct StoreEvents {
    sender: broadcast::Sender<StoreEvent>,
}

impl StoreEvents {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish to current subscribers. Events with no subscriber are dropped.
    pub fn publish(&self, event: StoreEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }
}

impl Default for StoreEvents {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
