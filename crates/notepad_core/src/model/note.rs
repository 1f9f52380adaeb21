//! Note and note-version records.
//!
//! # Invariants
//! - `version_count` starts at 1 and grows by exactly one per saved revision.
//! - `NoteVersion` rows are append-only snapshots of title/content/category/tags.
//! - `linked_notes` is a one-directional edge list owned by the source note.

use crate::model::outline::OutlineItem;
use crate::model::tag::normalize_tags;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

pub type NoteId = Uuid;
pub type NoteVersionId = Uuid;

/// Fixed category set offered by the note form.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum NoteCategory {
    #[default]
    Personal,
    Work,
    Study,
    Other,
}

impl NoteCategory {
    pub const ALL: [NoteCategory; 4] = [Self::Personal, Self::Work, Self::Study, Self::Other];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Personal => "Personal",
            Self::Work => "Work",
            Self::Study => "Study",
            Self::Other => "Other",
        }
    }
}

impl Display for NoteCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteCategory {
    type Err = NoteValidationError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| NoteValidationError::UnknownCategory(trimmed.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    BlankTitle,
    UnknownCategory(String),
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "note title must not be blank"),
            Self::UnknownCategory(value) => write!(
                f,
                "unknown note category `{value}`; expected Personal|Work|Study|Other"
            ),
        }
    }
}

impl Error for NoteValidationError {}

/// User-editable note fields, as submitted by the note form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDraft {
    pub title: String,
    /// Rich-text HTML body. Stored as-is.
    pub content: String,
    pub category: NoteCategory,
    pub tags: Vec<String>,
}

impl NoteDraft {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        category: NoteCategory,
        tags: Vec<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            category,
            tags,
        }
    }

    /// Trims the title and normalizes tags; rejects a blank title.
    pub fn normalized(self) -> Result<Self, NoteValidationError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(NoteValidationError::BlankTitle);
        }
        Ok(Self {
            title,
            content: self.content,
            category: self.category,
            tags: normalize_tags(&self.tags),
        })
    }
}

/// Canonical note row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub category: NoteCategory,
    pub tags: Vec<String>,
    pub version_count: i64,
    pub is_archived: bool,
    /// Opaque public id used by the read-only share page.
    pub share_id: String,
    pub collaborators: Vec<String>,
    pub linked_notes: Vec<NoteId>,
    pub outline: Vec<OutlineItem>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Note {
    /// Builds a first-revision note from a draft with fresh ids.
    pub fn from_draft(draft: NoteDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: draft.title,
            content: draft.content,
            category: draft.category,
            tags: draft.tags,
            version_count: 1,
            is_archived: false,
            share_id: Uuid::new_v4().simple().to_string(),
            collaborators: Vec::new(),
            linked_notes: Vec::new(),
            outline: Vec::new(),
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Current user-editable fields.
    pub fn draft(&self) -> NoteDraft {
        NoteDraft::new(
            self.title.clone(),
            self.content.clone(),
            self.category,
            self.tags.clone(),
        )
    }
}

/// Append-only snapshot written on every saved revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteVersion {
    pub id: NoteVersionId,
    pub note_id: NoteId,
    pub title: String,
    pub content: String,
    pub category: NoteCategory,
    pub tags: Vec<String>,
    pub created_at: i64,
}

impl NoteVersion {
    pub fn draft(&self) -> NoteDraft {
        NoteDraft::new(
            self.title.clone(),
            self.content.clone(),
            self.category,
            self.tags.clone(),
        )
    }
}

/// `(id, title)` pair used by link lists and link search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSummary {
    pub id: NoteId,
    pub title: String,
}

/// Dashboard counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteAnalytics {
    pub total_notes: u64,
    pub archived_notes: u64,
    /// Keyed by the stored category label.
    pub category_counts: BTreeMap<String, u64>,
}

#[cfg(test)]
mod tests {
    use super::{Note, NoteCategory, NoteDraft, NoteValidationError};

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("work".parse::<NoteCategory>().unwrap(), NoteCategory::Work);
        assert_eq!(" STUDY ".parse::<NoteCategory>().unwrap(), NoteCategory::Study);
        assert!(matches!(
            "Hobby".parse::<NoteCategory>(),
            Err(NoteValidationError::UnknownCategory(value)) if value == "Hobby"
        ));
    }

    #[test]
    fn normalized_draft_trims_title_and_cleans_tags() {
        let draft = NoteDraft::new(
            "  Groceries ",
            "milk",
            NoteCategory::Personal,
            vec![" home ".to_string(), String::new(), "home".to_string()],
        )
        .normalized()
        .unwrap();
        assert_eq!(draft.title, "Groceries");
        assert_eq!(draft.tags, vec!["home".to_string()]);
    }

    #[test]
    fn blank_title_is_rejected() {
        let err = NoteDraft::new("   ", "body", NoteCategory::Other, Vec::new())
            .normalized()
            .unwrap_err();
        assert_eq!(err, NoteValidationError::BlankTitle);
    }

    #[test]
    fn new_note_starts_at_first_revision_with_share_id() {
        let note = Note::from_draft(NoteDraft::new(
            "t",
            "c",
            NoteCategory::Work,
            Vec::new(),
        ));
        assert_eq!(note.version_count, 1);
        assert!(!note.is_archived);
        assert_eq!(note.share_id.len(), 32);
    }

    #[test]
    fn category_serializes_as_label() {
        let json = serde_json::to_value(NoteCategory::Study).unwrap();
        assert_eq!(json, "Study");
    }
}
