//! Publish/subscribe channel for row changes.

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl ChangeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

/// One row-level event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowChange {
    pub table: String,
    pub kind: ChangeKind,
    pub row_id: String,
    /// Full row after the change; `None` for deletes.
    pub row: Option<Value>,
}

impl RowChange {
    pub fn new(
        table: impl Into<String>,
        kind: ChangeKind,
        row_id: impl ToString,
        row: Option<Value>,
    ) -> Self {
        Self {
            table: table.into(),
            kind,
            row_id: row_id.to_string(),
            row,
        }
    }
}

/// Subscription key: table, optional event kind, optional row id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeFilter {
    table: String,
    kind: Option<ChangeKind>,
    row_id: Option<String>,
}

impl ChangeFilter {
    /// All events on `table`.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            kind: None,
            row_id: None,
        }
    }

    pub fn with_kind(mut self, kind: ChangeKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_row_id(mut self, row_id: impl ToString) -> Self {
        self.row_id = Some(row_id.to_string());
        self
    }

    pub fn matches(&self, change: &RowChange) -> bool {
        self.table == change.table
            && self.kind.map_or(true, |kind| kind == change.kind)
            && self
                .row_id
                .as_deref()
                .map_or(true, |row_id| row_id == change.row_id)
    }
}

struct Subscriber {
    id: u64,
    filter: ChangeFilter,
    sender: Sender<RowChange>,
}

#[derive(Default)]
struct FeedState {
    next_id: u64,
    subscribers: Vec<Subscriber>,
}

/// Cloneable handle; clones share one subscriber list.
#[derive(Clone, Default)]
pub struct ChangeFeed {
    state: Arc<Mutex<FeedState>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, filter: ChangeFilter) -> Subscription {
        let (sender, receiver) = mpsc::channel();
        let mut state = lock(&self.state);
        let id = state.next_id;
        state.next_id += 1;
        debug!(
            "event=feed_subscribe module=realtime status=ok subscriber={id} table={}",
            filter.table
        );
        state.subscribers.push(Subscriber {
            id,
            filter,
            sender,
        });
        Subscription {
            id,
            receiver,
            state: Arc::downgrade(&self.state),
        }
    }

    /// Delivers `change` to every matching subscriber and returns how many
    /// received it. Subscribers whose receiver is gone are pruned.
    pub fn publish(&self, change: RowChange) -> usize {
        let mut state = lock(&self.state);
        let mut delivered = 0;
        state.subscribers.retain(|subscriber| {
            if !subscriber.filter.matches(&change) {
                return true;
            }
            match subscriber.sender.send(change.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => false,
            }
        });
        debug!(
            "event=feed_publish module=realtime status=ok table={} kind={} row_id={} delivered={delivered}",
            change.table,
            change.kind.as_str(),
            change.row_id
        );
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.state).subscribers.len()
    }
}

/// Receiving end of one filtered subscription.
pub struct Subscription {
    id: u64,
    receiver: Receiver<RowChange>,
    state: Weak<Mutex<FeedState>>,
}

impl Subscription {
    pub fn try_recv(&self) -> Option<RowChange> {
        self.receiver.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<RowChange> {
        match self.receiver.recv_timeout(timeout) {
            Ok(change) => Some(change),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// All events queued so far, oldest first.
    pub fn drain(&self) -> Vec<RowChange> {
        self.receiver.try_iter().collect()
    }

    /// False once every handle of the originating feed is gone.
    pub fn is_attached(&self) -> bool {
        self.state.strong_count() > 0
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            lock(&state)
                .subscribers
                .retain(|subscriber| subscriber.id != self.id);
        }
    }
}

fn lock(state: &Mutex<FeedState>) -> MutexGuard<'_, FeedState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::{ChangeFeed, ChangeFilter, ChangeKind, RowChange};
    use serde_json::json;

    #[test]
    fn filters_by_table_kind_and_row() {
        let feed = ChangeFeed::new();
        let all_notes = feed.subscribe(ChangeFilter::table("notes"));
        let one_row = feed.subscribe(
            ChangeFilter::table("notes")
                .with_kind(ChangeKind::Update)
                .with_row_id("n1"),
        );

        feed.publish(RowChange::new("notes", ChangeKind::Insert, "n2", None));
        feed.publish(RowChange::new(
            "notes",
            ChangeKind::Update,
            "n1",
            Some(json!({"content": "x"})),
        ));
        feed.publish(RowChange::new("tags", ChangeKind::Insert, "1", None));

        assert_eq!(all_notes.drain().len(), 2);
        let received = one_row.drain();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].row_id, "n1");
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let feed = ChangeFeed::new();
        let subscription = feed.subscribe(ChangeFilter::table("notes"));
        assert_eq!(feed.subscriber_count(), 1);
        drop(subscription);
        assert_eq!(feed.subscriber_count(), 0);
        assert_eq!(
            feed.publish(RowChange::new("notes", ChangeKind::Delete, "n1", None)),
            0
        );
    }

    #[test]
    fn subscription_detaches_when_feed_is_dropped() {
        let feed = ChangeFeed::new();
        let subscription = feed.subscribe(ChangeFilter::table("notes"));
        let clone = feed.clone();
        drop(feed);
        assert!(subscription.is_attached());
        drop(clone);
        assert!(!subscription.is_attached());
    }

    #[test]
    fn change_kind_serializes_uppercase() {
        assert_eq!(serde_json::to_value(ChangeKind::Insert).unwrap(), "INSERT");
    }
}
