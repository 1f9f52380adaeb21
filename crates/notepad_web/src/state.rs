//! Shared handler state.
//!
//! # Responsibility
//! - Own the single SQLite connection, the change feed and the blob store.
//! - Run blocking database and filesystem work off the async runtime.
//!
//! # Invariants
//! - Every service built through [`Workspace`] publishes to the same feed.
//! - A poisoned connection lock is recovered, never propagated as a panic.

use crate::config::ServerConfig;
use crate::error::ActionError;
use notepad_core::repo::board_repo::SqliteBoardRepository;
use notepad_core::repo::meeting_repo::SqliteMeetingRepository;
use notepad_core::repo::mind_map_repo::SqliteMindMapRepository;
use notepad_core::repo::note_repo::SqliteNoteRepository;
use notepad_core::repo::prompt_repo::SqlitePromptRepository;
use notepad_core::repo::tag_repo::SqliteTagRepository;
use notepad_core::service::board_service::BoardService;
use notepad_core::service::meeting_service::MeetingService;
use notepad_core::service::mind_map_service::MindMapService;
use notepad_core::service::prompt_service::PromptService;
use notepad_core::service::tag_service::TagService;
use notepad_core::storage::{BlobStore, FsBlobStore};
use notepad_core::{open_db, ActionResult, ChangeFeed, DbResult, NoteService};
use rusqlite::Connection;
use std::sync::{Arc, Mutex, PoisonError};

pub type SharedBlobStore = Arc<dyn BlobStore + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    feed: ChangeFeed,
    blobs: SharedBlobStore,
}

/// Borrowed view handed to blocking handler bodies.
pub struct Workspace<'a> {
    conn: &'a Connection,
    feed: &'a ChangeFeed,
}

impl AppState {
    pub fn new(conn: Connection, feed: ChangeFeed, blobs: SharedBlobStore) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            feed,
            blobs,
        }
    }

    /// Opens the configured database and filesystem blob store.
    pub fn open(config: &ServerConfig) -> DbResult<Self> {
        let conn = open_db(&config.db_path)?;
        let blobs = FsBlobStore::new(&config.blob_dir, config.public_base_url.clone());
        Ok(Self::new(conn, ChangeFeed::new(), Arc::new(blobs)))
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    /// Runs `work` against the database on the blocking pool.
    pub async fn blocking<T, F>(&self, work: F) -> Result<T, ActionError>
    where
        T: Send + 'static,
        F: FnOnce(&Workspace<'_>) -> Result<T, ActionError> + Send + 'static,
    {
        let state = self.clone();
        tokio::task::spawn_blocking(move || {
            let conn = state.db.lock().unwrap_or_else(PoisonError::into_inner);
            work(&Workspace {
                conn: &conn,
                feed: &state.feed,
            })
        })
        .await
        .unwrap_or_else(|err| Err(ActionError::Internal(format!("worker failed: {err}"))))
    }

    /// Like [`AppState::blocking`], wrapped into the action envelope.
    pub async fn run<T, F>(&self, action: &'static str, work: F) -> ActionResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Workspace<'_>) -> Result<T, ActionError> + Send + 'static,
    {
        ActionResult::from_result(action, self.blocking(work).await)
    }

    /// Runs blob store work on the blocking pool without taking the
    /// database lock.
    pub async fn with_blobs<T, F>(&self, work: F) -> Result<T, ActionError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn BlobStore) -> Result<T, ActionError> + Send + 'static,
    {
        let blobs = Arc::clone(&self.blobs);
        tokio::task::spawn_blocking(move || work(blobs.as_ref()))
            .await
            .unwrap_or_else(|err| Err(ActionError::Internal(format!("worker failed: {err}"))))
    }
}

impl<'a> Workspace<'a> {
    pub fn conn(&self) -> &'a Connection {
        self.conn
    }

    pub fn notes(&self) -> Result<NoteService<SqliteNoteRepository<'a>>, ActionError> {
        let repo = SqliteNoteRepository::try_new(self.conn)?;
        Ok(NoteService::new(repo).with_feed(self.feed.clone()))
    }

    pub fn board(&self) -> Result<BoardService<SqliteBoardRepository<'a>>, ActionError> {
        Ok(BoardService::new(SqliteBoardRepository::try_new(self.conn)?))
    }

    pub fn mind_map(&self) -> Result<MindMapService<SqliteMindMapRepository<'a>>, ActionError> {
        Ok(MindMapService::new(SqliteMindMapRepository::try_new(self.conn)?))
    }

    pub fn tags(&self) -> Result<TagService<SqliteTagRepository<'a>>, ActionError> {
        Ok(TagService::new(SqliteTagRepository::try_new(self.conn)?))
    }

    pub fn meetings(&self) -> Result<MeetingService<SqliteMeetingRepository<'a>>, ActionError> {
        Ok(MeetingService::new(SqliteMeetingRepository::try_new(self.conn)?))
    }

    pub fn prompts(&self) -> Result<PromptService<SqlitePromptRepository<'a>>, ActionError> {
        Ok(PromptService::new(SqlitePromptRepository::try_new(self.conn)?))
    }
}
