//! Tag dictionary use-cases for the tag autocomplete widget.

use crate::model::tag::Tag;
use crate::repo::tag_repo::TagRepository;
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const TAG_SUGGESTION_LIMIT: u32 = 5;

#[derive(Debug)]
pub enum TagServiceError {
    InvalidName,
    Repo(RepoError),
}

impl Display for TagServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "tag name must not be blank"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TagServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidName => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for TagServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub struct TagService<R: TagRepository> {
    repo: R,
}

impl<R: TagRepository> TagService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// At most five names containing `query`, case-insensitively.
    pub fn get_tags(&self, query: &str) -> Result<Vec<String>, TagServiceError> {
        let tags = self.repo.search_tags(query.trim(), TAG_SUGGESTION_LIMIT)?;
        Ok(tags.into_iter().map(|tag| tag.name).collect())
    }

    /// Adds a dictionary entry; an existing case-insensitive match is returned
    /// unchanged.
    pub fn add_tag(&self, name: &str) -> Result<Tag, TagServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TagServiceError::InvalidName);
        }
        let tag = self.repo.insert_tag(name)?;
        info!("event=tag_add module=service status=ok tag_id={}", tag.id);
        Ok(tag)
    }

    pub fn list_tags(&self) -> Result<Vec<Tag>, TagServiceError> {
        Ok(self.repo.list_tags()?)
    }
}
