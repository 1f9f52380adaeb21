//! Case-insensitive substring search over notes.
//!
//! # Responsibility
//! - Match the query against title OR content.
//! - Apply the optional archived filter.
//!
//! # Invariants
//! - Results are ordered newest first (`created_at DESC`).
//! - No ranking and no paging; every match is returned.
//! - `%`, `_` and `\` in the query match literally.
//! - An empty query matches every note.

use crate::db::DbError;
use crate::model::note::Note;
use crate::repo::note_repo::{folded_like_pattern, note_from_row, NOTE_COLUMNS};
use crate::repo::RepoError;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SearchResult<T> = Result<T, SearchError>;

#[derive(Debug)]
pub enum SearchError {
    Db(DbError),
    InvalidData(String),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid search row: {message}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<RepoError> for SearchError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Db(err) => Self::Db(err),
            other => Self::InvalidData(other.to_string()),
        }
    }
}

/// Search options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteSearchQuery {
    pub text: String,
    /// `None` searches both active and archived notes.
    pub archived: Option<bool>,
}

impl NoteSearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            archived: None,
        }
    }

    pub fn archived(mut self, archived: Option<bool>) -> Self {
        self.archived = archived;
        self
    }
}

/// Returns every note whose title or content contains `query.text`.
pub fn search_notes(conn: &Connection, query: &NoteSearchQuery) -> SearchResult<Vec<Note>> {
    let pattern = folded_like_pattern(query.text.trim());
    let mut sql = format!(
        "SELECT {NOTE_COLUMNS}
         FROM notes
         WHERE (casefold(title) LIKE ? ESCAPE '\\'
             OR casefold(content) LIKE ? ESCAPE '\\')"
    );
    let mut bind_values = vec![Value::Text(pattern.clone()), Value::Text(pattern)];
    if let Some(archived) = query.archived {
        sql.push_str(" AND is_archived = ?");
        bind_values.push(Value::Integer(i64::from(archived)));
    }
    sql.push_str(" ORDER BY created_at DESC, rowid DESC;");

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut notes = Vec::new();
    while let Some(row) = rows.next()? {
        notes.push(note_from_row(row)?);
    }
    Ok(notes)
}
