//! Error type shared by every HTTP handler.

use axum::extract::rejection::{FormRejection, JsonRejection, QueryRejection};
use notepad_core::service::board_service::BoardServiceError;
use notepad_core::service::meeting_service::MeetingServiceError;
use notepad_core::service::mind_map_service::MindMapServiceError;
use notepad_core::service::prompt_service::PromptServiceError;
use notepad_core::service::tag_service::TagServiceError;
use notepad_core::storage::BlobError;
use notepad_core::{NoteServiceError, RepoError, SearchError};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum ActionError {
    /// Malformed or missing request input.
    BadRequest(String),
    Repo(RepoError),
    Note(NoteServiceError),
    Board(BoardServiceError),
    MindMap(MindMapServiceError),
    Meeting(MeetingServiceError),
    Tag(TagServiceError),
    Prompt(PromptServiceError),
    Search(SearchError),
    Blob(BlobError),
    Internal(String),
}

impl ActionError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// True when the failure means the addressed row or object is absent.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Repo(RepoError::NotFound { .. }) => true,
            Self::Note(
                NoteServiceError::NoteNotFound(_)
                | NoteServiceError::SharedNoteNotFound(_)
                | NoteServiceError::VersionNotFound(_),
            ) => true,
            Self::MindMap(MindMapServiceError::NodeNotFound(_)) => true,
            Self::Blob(BlobError::NotFound { .. }) => true,
            _ => false,
        }
    }
}

impl Display for ActionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest(message) => write!(f, "{message}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Note(err) => write!(f, "{err}"),
            Self::Board(err) => write!(f, "{err}"),
            Self::MindMap(err) => write!(f, "{err}"),
            Self::Meeting(err) => write!(f, "{err}"),
            Self::Tag(err) => write!(f, "{err}"),
            Self::Prompt(err) => write!(f, "{err}"),
            Self::Search(err) => write!(f, "{err}"),
            Self::Blob(err) => write!(f, "{err}"),
            Self::Internal(message) => write!(f, "internal error: {message}"),
        }
    }
}

impl Error for ActionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Note(err) => Some(err),
            Self::Board(err) => Some(err),
            Self::MindMap(err) => Some(err),
            Self::Meeting(err) => Some(err),
            Self::Tag(err) => Some(err),
            Self::Prompt(err) => Some(err),
            Self::Search(err) => Some(err),
            Self::Blob(err) => Some(err),
            Self::BadRequest(_) | Self::Internal(_) => None,
        }
    }
}

macro_rules! from_service_error {
    ($($source:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$source> for ActionError {
                fn from(value: $source) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

from_service_error! {
    RepoError => Repo,
    NoteServiceError => Note,
    BoardServiceError => Board,
    MindMapServiceError => MindMap,
    MeetingServiceError => Meeting,
    TagServiceError => Tag,
    PromptServiceError => Prompt,
    SearchError => Search,
    BlobError => Blob,
}

impl From<FormRejection> for ActionError {
    fn from(value: FormRejection) -> Self {
        Self::BadRequest(value.body_text())
    }
}

impl From<QueryRejection> for ActionError {
    fn from(value: QueryRejection) -> Self {
        Self::BadRequest(value.body_text())
    }
}

impl From<JsonRejection> for ActionError {
    fn from(value: JsonRejection) -> Self {
        Self::BadRequest(value.body_text())
    }
}
