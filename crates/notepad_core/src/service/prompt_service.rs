//! AI writing-assistant prompt history.

use crate::model::ai_prompt::AiPrompt;
use crate::repo::prompt_repo::PromptRepository;
use crate::repo::{now_epoch_ms, RepoError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

#[derive(Debug)]
pub enum PromptServiceError {
    BlankPrompt,
    Repo(RepoError),
}

impl Display for PromptServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankPrompt => write!(f, "prompt must not be blank"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PromptServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::BlankPrompt => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for PromptServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub struct PromptService<R: PromptRepository> {
    repo: R,
}

impl<R: PromptRepository> PromptService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn save_ai_prompt(
        &self,
        prompt: &str,
        response: &str,
    ) -> Result<AiPrompt, PromptServiceError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(PromptServiceError::BlankPrompt);
        }
        let record = AiPrompt {
            id: Uuid::new_v4(),
            prompt: prompt.to_string(),
            response: response.to_string(),
            created_at: now_epoch_ms(),
        };
        self.repo.insert_prompt(&record)?;
        info!(
            "event=ai_prompt_save module=service status=ok prompt_id={}",
            record.id
        );
        Ok(record)
    }

    /// Newest first.
    pub fn get_ai_prompts(&self) -> Result<Vec<AiPrompt>, PromptServiceError> {
        Ok(self.repo.list_prompts()?)
    }
}
