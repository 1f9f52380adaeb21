//! AI prompt/response persistence.

use crate::db::ensure_tables;
use crate::model::ai_prompt::AiPrompt;
use crate::repo::{parse_uuid, RepoResult};
use rusqlite::{params, Connection};

pub trait PromptRepository {
    fn insert_prompt(&self, prompt: &AiPrompt) -> RepoResult<()>;
    /// Newest first.
    fn list_prompts(&self) -> RepoResult<Vec<AiPrompt>>;
}

pub struct SqlitePromptRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePromptRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["ai_prompts"])?;
        Ok(Self { conn })
    }
}

impl PromptRepository for SqlitePromptRepository<'_> {
    fn insert_prompt(&self, prompt: &AiPrompt) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO ai_prompts (id, prompt, response, created_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                prompt.id.to_string(),
                prompt.prompt,
                prompt.response,
                prompt.created_at
            ],
        )?;
        Ok(())
    }

    fn list_prompts(&self) -> RepoResult<Vec<AiPrompt>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, prompt, response, created_at
             FROM ai_prompts
             ORDER BY created_at DESC, rowid DESC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut prompts = Vec::new();
        while let Some(row) = rows.next()? {
            let id: String = row.get("id")?;
            prompts.push(AiPrompt {
                id: parse_uuid(&id, "ai_prompts.id")?,
                prompt: row.get("prompt")?,
                response: row.get("response")?,
                created_at: row.get("created_at")?,
            });
        }
        Ok(prompts)
    }
}
