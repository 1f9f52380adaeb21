//! Core domain logic for the online notepad.
//! This crate is the single source of truth for business invariants.

pub mod action;
pub mod db;
pub mod logging;
pub mod model;
pub mod pomodoro;
pub mod realtime;
pub mod repo;
pub mod search;
pub mod service;
pub mod storage;

pub use action::{parse_tags_field, ActionResult};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::note::{Note, NoteCategory, NoteDraft, NoteId, NoteVersion, NoteVersionId};
pub use realtime::{ChangeFeed, ChangeFilter, ChangeKind, ConflictPolicy, LiveField, RowChange};
pub use repo::{RepoError, RepoResult};
pub use search::notes::{search_notes, NoteSearchQuery, SearchError, SearchResult};
pub use service::note_service::{NoteService, NoteServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
