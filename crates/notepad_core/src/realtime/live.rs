//! Local cache for one field of one row, reconciled from the change feed.
//!
//! # Invariants
//! - `set_local` only touches the cache; persisting is the caller's job.
//! - `sync` applies queued events in order; the last update wins outright.
//! - A delete event marks the field as removed and stops further updates.

use crate::realtime::feed::{ChangeFeed, ChangeFilter, ChangeKind, Subscription};
use log::warn;
use serde::de::DeserializeOwned;

/// How remote updates are merged into a local cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// A remote value replaces the local value wholesale.
    #[default]
    LastWriterWins,
}

pub struct LiveField<T> {
    field: String,
    value: T,
    removed: bool,
    policy: ConflictPolicy,
    subscription: Subscription,
}

impl<T: DeserializeOwned> LiveField<T> {
    /// Subscribes to every event on `table`/`row_id` and seeds the cache.
    pub fn attach(
        feed: &ChangeFeed,
        table: &str,
        row_id: impl ToString,
        field: impl Into<String>,
        initial: T,
    ) -> Self {
        Self {
            field: field.into(),
            value: initial,
            removed: false,
            policy: ConflictPolicy::LastWriterWins,
            subscription: feed.subscribe(ChangeFilter::table(table).with_row_id(row_id)),
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub fn set_local(&mut self, value: T) {
        self.value = value;
    }

    /// Applies queued remote events. Returns `true` when the cache changed.
    pub fn sync(&mut self) -> bool {
        let mut changed = false;
        for change in self.subscription.drain() {
            if self.removed {
                break;
            }
            match change.kind {
                ChangeKind::Delete => {
                    self.removed = true;
                    changed = true;
                }
                ChangeKind::Insert | ChangeKind::Update => {
                    let Some(raw) = change.row.as_ref().and_then(|row| row.get(&self.field))
                    else {
                        continue;
                    };
                    match serde_json::from_value::<T>(raw.clone()) {
                        Ok(remote) => match self.policy {
                            ConflictPolicy::LastWriterWins => {
                                self.value = remote;
                                changed = true;
                            }
                        },
                        Err(err) => warn!(
                            "event=live_field_sync module=realtime status=error table={} row_id={} field={} error={}",
                            change.table, change.row_id, self.field, err
                        ),
                    }
                }
            }
        }
        changed
    }
}
