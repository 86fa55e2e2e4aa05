//! Write-failure notifications
//!
//! Store writes report rejections on the event channel, not to the request
//! that scheduled them. A background task keeps the most recent failures per
//! user so the client can show them.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use budgetwise_core::store::{StoreEvent, StoreEvents, StoreFailure};

/// Failures kept per user
const MAX_PER_USER: usize = 20;

type Inbox = Arc<Mutex<HashMap<String, VecDeque<StoreFailure>>>>;

#[derive(Clone, Default)]
pub struct Notifications {
    inbox: Inbox,
}

impl Notifications {
    /// Subscribe to `events` and start collecting failures
    pub fn spawn(events: &StoreEvents) -> Self {
        let notifications = Self::default();
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime; write failures will not be collected");
            return notifications;
        };

        let mut receiver = events.subscribe();
        let collector = notifications.clone();
        runtime.spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => collector.record(event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Notification collector fell behind; events dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("Store event channel closed");
        });

        notifications
    }

    pub fn record(&self, event: StoreEvent) {
        let StoreEvent::Failed(failure) = event else {
            return;
        };
        let Some(user_id) = failure.user_id.clone() else {
            return;
        };
        if let Ok(mut inbox) = self.inbox.lock() {
            let queue = inbox.entry(user_id).or_default();
            queue.push_front(failure);
            queue.truncate(MAX_PER_USER);
        }
    }

    /// Newest first
    pub fn for_user(&self, user_id: &str) -> Vec<StoreFailure> {
        self.inbox
            .lock()
            .ok()
            .and_then(|inbox| inbox.get(user_id).map(|q| q.iter().cloned().collect()))
            .unwrap_or_default()
    }
}
