//! Stored AI prompt/response pairs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type AiPromptId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiPrompt {
    pub id: AiPromptId,
    pub prompt: String,
    pub response: String,
    pub created_at: i64,
}
