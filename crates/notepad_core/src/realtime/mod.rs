//! In-process row change feed and live field reconciliation.
//!
//! # Responsibility
//! - Fan out row-level insert/update/delete events to filtered subscribers.
//! - Give widgets an explicit local cache that incoming events overwrite.
//!
//! # Invariants
//! - Dropping a subscription unsubscribes it.
//! - Publishing never blocks on a slow subscriber.

pub mod feed;
pub mod live;

pub use feed::{ChangeFeed, ChangeFilter, ChangeKind, RowChange, Subscription};
pub use live::{ConflictPolicy, LiveField};
