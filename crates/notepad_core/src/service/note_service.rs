//! Note use-case service.
//!
//! # Responsibility
//! - Provide note create/update/archive/delete/restore and query APIs.
//! - Maintain links, outline, live content and collaborators.
//! - Publish note row changes to the change feed.
//! - Derive a plain-text preview from HTML content for list views.
//!
//! # Invariants
//! - Every saved revision bumps `version_count` by one and appends exactly
//!   one `NoteVersion`, atomically.
//! - A version can only be restored onto the note it belongs to.
//! - Stored outlines always pass `OutlineTree` validation.

use crate::model::note::{
    Note, NoteAnalytics, NoteDraft, NoteId, NoteSummary, NoteValidationError, NoteVersion,
    NoteVersionId,
};
use crate::model::outline::{OutlineEdit, OutlineError, OutlineItem, OutlineTree};
use crate::realtime::{ChangeFeed, ChangeKind, RowChange};
use crate::repo::note_repo::{NoteListQuery, NoteRepository};
use crate::repo::{now_epoch_ms, RepoError};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const NOTES_TABLE: &str = "notes";
pub const LINK_CANDIDATE_LIMIT: u32 = 5;
const PREVIEW_CHARS: usize = 100;

static HTML_IMAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<img\b[^>]*\bsrc\s*=\s*["']([^"']+)["']"#).expect("valid image regex")
});
static HTML_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

#[derive(Debug)]
pub enum NoteServiceError {
    Validation(NoteValidationError),
    Outline(OutlineError),
    NoteNotFound(NoteId),
    SharedNoteNotFound(String),
    VersionNotFound(NoteVersionId),
    /// The version exists but belongs to another note.
    VersionMismatch {
        version_id: NoteVersionId,
        note_id: NoteId,
    },
    VersionConflict {
        note_id: NoteId,
        expected: i64,
        actual: i64,
    },
    InvalidCollaborator,
    Repo(RepoError),
    InconsistentState(&'static str),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Outline(err) => write!(f, "{err}"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::SharedNoteNotFound(share_id) => write!(f, "shared note not found: {share_id}"),
            Self::VersionNotFound(id) => write!(f, "note version not found: {id}"),
            Self::VersionMismatch {
                version_id,
                note_id,
            } => write!(f, "version {version_id} does not belong to note {note_id}"),
            Self::VersionConflict {
                note_id,
                expected,
                actual,
            } => write!(
                f,
                "note {note_id} was modified concurrently: expected version {expected}, found {actual}"
            ),
            Self::InvalidCollaborator => write!(f, "collaborator must not be blank"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent note state: {details}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Outline(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity: "note", id } => match id.parse() {
                Ok(note_id) => Self::NoteNotFound(note_id),
                Err(_) => Self::Repo(RepoError::NotFound { entity: "note", id }),
            },
            RepoError::VersionConflict {
                note_id,
                expected,
                actual,
            } => Self::VersionConflict {
                note_id,
                expected,
                actual,
            },
            other => Self::Repo(other),
        }
    }
}

impl From<NoteValidationError> for NoteServiceError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<OutlineError> for NoteServiceError {
    fn from(value: OutlineError) -> Self {
        Self::Outline(value)
    }
}

pub type NoteServiceResult<T> = Result<T, NoteServiceError>;

/// Plain-text projection of HTML content for list views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlPreview {
    pub preview_text: Option<String>,
    pub preview_image: Option<String>,
}

/// Note service facade over repository implementations.
pub struct NoteService<R: NoteRepository> {
    repo: R,
    feed: Option<ChangeFeed>,
}

impl<R: NoteRepository> NoteService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo, feed: None }
    }

    /// Publishes note row changes to `feed` after every successful write.
    pub fn with_feed(mut self, feed: ChangeFeed) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Creates a note at version 1 with its first snapshot.
    pub fn add_note(&self, draft: NoteDraft) -> NoteServiceResult<Note> {
        let draft = draft.normalized()?;
        let now = now_epoch_ms();
        let mut note = Note::from_draft(draft);
        note.created_at = now;
        note.updated_at = now;

        self.repo.create_note(&note)?;
        let stored = self.read_back(note.id, "created note not found in read-back")?;
        info!(
            "event=note_add module=service status=ok note_id={} tags={}",
            stored.id,
            stored.tags.len()
        );
        self.publish(ChangeKind::Insert, &stored);
        Ok(stored)
    }

    /// Saves a new revision. With `expected_version`, rejects the write when
    /// another revision landed first.
    pub fn update_note(
        &self,
        note_id: NoteId,
        draft: NoteDraft,
        expected_version: Option<i64>,
    ) -> NoteServiceResult<Note> {
        let draft = draft.normalized()?;
        let note = self.repo.save_revision(note_id, &draft, expected_version)?;
        info!(
            "event=note_update module=service status=ok note_id={} version_count={}",
            note.id, note.version_count
        );
        self.publish(ChangeKind::Update, &note);
        Ok(note)
    }

    /// Removes the note row; versions are kept.
    pub fn delete_note(&self, note_id: NoteId) -> NoteServiceResult<()> {
        self.repo.delete_note(note_id)?;
        info!("event=note_delete module=service status=ok note_id={note_id}");
        if let Some(feed) = &self.feed {
            feed.publish(RowChange::new(
                NOTES_TABLE,
                ChangeKind::Delete,
                note_id,
                None,
            ));
        }
        Ok(())
    }

    pub fn archive_note(&self, note_id: NoteId) -> NoteServiceResult<Note> {
        self.set_archived(note_id, true)
    }

    pub fn unarchive_note(&self, note_id: NoteId) -> NoteServiceResult<Note> {
        self.set_archived(note_id, false)
    }

    /// Copies a snapshot back onto its note as a new revision.
    pub fn restore_note_version(
        &self,
        note_id: NoteId,
        version_id: NoteVersionId,
    ) -> NoteServiceResult<Note> {
        let version = self
            .repo
            .get_version(version_id)?
            .ok_or(NoteServiceError::VersionNotFound(version_id))?;
        if version.note_id != note_id {
            return Err(NoteServiceError::VersionMismatch {
                version_id,
                note_id,
            });
        }

        let note = self.repo.save_revision(note_id, &version.draft(), None)?;
        info!(
            "event=note_restore module=service status=ok note_id={} version_id={} version_count={}",
            note.id, version_id, note.version_count
        );
        self.publish(ChangeKind::Update, &note);
        Ok(note)
    }

    /// Newest first.
    pub fn get_note_versions(&self, note_id: NoteId) -> NoteServiceResult<Vec<NoteVersion>> {
        Ok(self.repo.list_versions(note_id)?)
    }

    pub fn get_note(&self, note_id: NoteId) -> NoteServiceResult<Note> {
        self.repo
            .get_note(note_id)?
            .ok_or(NoteServiceError::NoteNotFound(note_id))
    }

    pub fn get_shared_note(&self, share_id: &str) -> NoteServiceResult<Note> {
        self.repo
            .get_note_by_share_id(share_id.trim())?
            .ok_or_else(|| NoteServiceError::SharedNoteNotFound(share_id.to_string()))
    }

    /// Newest first.
    pub fn list_notes(&self, archived: bool) -> NoteServiceResult<Vec<Note>> {
        Ok(self.repo.list_notes(&NoteListQuery {
            archived: Some(archived),
        })?)
    }

    /// Appends a one-directional link. Repeated links are kept as-is.
    pub fn link_notes(&self, source: NoteId, target: NoteId) -> NoteServiceResult<Vec<NoteId>> {
        let linked = self.repo.append_link(source, target)?;
        info!(
            "event=note_link module=service status=ok source={source} target={target} links={}",
            linked.len()
        );
        self.publish_current(source)?;
        Ok(linked)
    }

    /// `(id, title)` of every linked note that still exists.
    pub fn get_linked_notes(&self, note_id: NoteId) -> NoteServiceResult<Vec<NoteSummary>> {
        let note = self.get_note(note_id)?;
        Ok(self.repo.summaries(&note.linked_notes)?)
    }

    /// Other notes whose title contains `query`; blank queries match nothing.
    pub fn find_link_candidates(
        &self,
        note_id: NoteId,
        query: &str,
    ) -> NoteServiceResult<Vec<NoteSummary>> {
        let needle = query.trim();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .repo
            .title_candidates(note_id, needle, LINK_CANDIDATE_LIMIT)?)
    }

    /// Validates and replaces the whole outline.
    pub fn update_note_outline(
        &self,
        note_id: NoteId,
        outline: &[OutlineItem],
    ) -> NoteServiceResult<Vec<OutlineItem>> {
        let items = OutlineTree::from_items(outline)?.to_items();
        self.repo.set_outline(note_id, &items)?;
        info!(
            "event=note_outline module=service status=ok note_id={note_id} roots={}",
            items.len()
        );
        self.publish_current(note_id)?;
        Ok(items)
    }

    /// Appends an item at the end of `parent`'s children, or at the root.
    pub fn add_outline_item(
        &self,
        note_id: NoteId,
        parent: Option<&str>,
        content: &str,
    ) -> NoteServiceResult<OutlineEdit> {
        self.edit_outline(note_id, "add", |tree| tree.add_item(parent, content).map(Some))
    }

    pub fn edit_outline_item(
        &self,
        note_id: NoteId,
        item_id: &str,
        content: &str,
    ) -> NoteServiceResult<OutlineEdit> {
        self.edit_outline(note_id, "edit", |tree| {
            tree.set_content(item_id, content).map(|()| None)
        })
    }

    /// Reorders one sibling level; `parent == None` addresses the roots.
    pub fn move_outline_item(
        &self,
        note_id: NoteId,
        parent: Option<&str>,
        from: usize,
        to: usize,
    ) -> NoteServiceResult<OutlineEdit> {
        self.edit_outline(note_id, "move", |tree| {
            tree.move_sibling(parent, from, to).map(|()| None)
        })
    }

    /// Removes an item together with its subtree.
    pub fn remove_outline_item(
        &self,
        note_id: NoteId,
        item_id: &str,
    ) -> NoteServiceResult<OutlineEdit> {
        self.edit_outline(note_id, "remove", |tree| tree.remove_item(item_id).map(|()| None))
    }

    /// Live-editor write: replaces content without a new revision.
    pub fn set_note_content(&self, note_id: NoteId, content: &str) -> NoteServiceResult<Note> {
        self.repo.set_content(note_id, content)?;
        let note = self.read_back(note_id, "note missing after content write")?;
        self.publish(ChangeKind::Update, &note);
        Ok(note)
    }

    pub fn add_collaborator(&self, note_id: NoteId, user: &str) -> NoteServiceResult<Vec<String>> {
        let user = user.trim();
        if user.is_empty() {
            return Err(NoteServiceError::InvalidCollaborator);
        }
        let collaborators = self.repo.append_collaborator(note_id, user)?;
        self.publish_current(note_id)?;
        Ok(collaborators)
    }

    pub fn get_analytics(&self) -> NoteServiceResult<NoteAnalytics> {
        Ok(self.repo.analytics()?)
    }

    fn set_archived(&self, note_id: NoteId, archived: bool) -> NoteServiceResult<Note> {
        self.repo.set_archived(note_id, archived)?;
        let note = self.read_back(note_id, "note missing after archive toggle")?;
        info!("event=note_archive module=service status=ok note_id={note_id} archived={archived}");
        self.publish(ChangeKind::Update, &note);
        Ok(note)
    }

    fn edit_outline<F>(
        &self,
        note_id: NoteId,
        op: &'static str,
        edit: F,
    ) -> NoteServiceResult<OutlineEdit>
    where
        F: FnOnce(&mut OutlineTree) -> Result<Option<String>, OutlineError>,
    {
        let note = self.get_note(note_id)?;
        let mut tree = OutlineTree::from_items(&note.outline)?;
        let item_id = edit(&mut tree)?;
        let outline = tree.to_items();
        self.repo.set_outline(note_id, &outline)?;
        info!(
            "event=note_outline module=service status=ok note_id={note_id} op={op} items={}",
            tree.len()
        );
        self.publish_current(note_id)?;
        Ok(OutlineEdit { item_id, outline })
    }

    fn read_back(&self, note_id: NoteId, details: &'static str) -> NoteServiceResult<Note> {
        self.repo
            .get_note(note_id)?
            .ok_or(NoteServiceError::InconsistentState(details))
    }

    fn publish_current(&self, note_id: NoteId) -> NoteServiceResult<()> {
        if self.feed.is_some() {
            let note = self.read_back(note_id, "note missing after write")?;
            self.publish(ChangeKind::Update, &note);
        }
        Ok(())
    }

    fn publish(&self, kind: ChangeKind, note: &Note) {
        if let Some(feed) = &self.feed {
            feed.publish(RowChange::new(
                NOTES_TABLE,
                kind,
                note.id,
                serde_json::to_value(note).ok(),
            ));
        }
    }
}

/// Derives list-view preview fields from HTML content.
///
/// Rules:
/// - `preview_image`: `src` of the first `<img>` tag.
/// - `preview_text`: tags removed, common entities decoded, whitespace
///   collapsed, first 100 chars retained.
pub fn derive_html_preview(content: &str) -> HtmlPreview {
    let preview_image = HTML_IMAGE_RE
        .captures(content)
        .and_then(|caps| caps.get(1).map(|m| m.as_str().trim().to_string()))
        .filter(|value| !value.is_empty());

    let without_tags = HTML_TAG_RE.replace_all(content, " ");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    let normalized = WHITESPACE_RE.replace_all(&decoded, " ");
    let trimmed = normalized.trim();
    let preview_text = if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.chars().take(PREVIEW_CHARS).collect())
    };

    HtmlPreview {
        preview_text,
        preview_image,
    }
}
