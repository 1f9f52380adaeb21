//! Tag dictionary persistence.
//!
//! # Invariants
//! - Names are unique case-insensitively (`COLLATE NOCASE`).
//! - The dictionary is not linked to `notes.tags`.

use crate::db::ensure_tables;
use crate::model::tag::Tag;
use crate::repo::note_repo::folded_like_pattern;
use crate::repo::RepoResult;
use rusqlite::{params, Connection};

pub trait TagRepository {
    /// Inserts `name` unless a case-insensitive match exists, then returns
    /// the stored row.
    fn insert_tag(&self, name: &str) -> RepoResult<Tag>;
    /// Up to `limit` names containing `needle`, alphabetical.
    fn search_tags(&self, needle: &str, limit: u32) -> RepoResult<Vec<Tag>>;
    fn list_tags(&self) -> RepoResult<Vec<Tag>>;
}

pub struct SqliteTagRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTagRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["tags"])?;
        Ok(Self { conn })
    }

    fn collect(&self, sql: &str, params: impl rusqlite::Params) -> RepoResult<Vec<Tag>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            tags.push(Tag {
                id: row.get("id")?,
                name: row.get("name")?,
            });
        }
        Ok(tags)
    }
}

impl TagRepository for SqliteTagRepository<'_> {
    fn insert_tag(&self, name: &str) -> RepoResult<Tag> {
        self.conn
            .execute("INSERT OR IGNORE INTO tags (name) VALUES (?1);", [name])?;
        let tag = self.conn.query_row(
            "SELECT id, name FROM tags WHERE name = ?1;",
            [name],
            |row| {
                Ok(Tag {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )?;
        Ok(tag)
    }

    fn search_tags(&self, needle: &str, limit: u32) -> RepoResult<Vec<Tag>> {
        let pattern = folded_like_pattern(needle);
        self.collect(
            "SELECT id, name
             FROM tags
             WHERE casefold(name) LIKE ?1 ESCAPE '\\'
             ORDER BY name COLLATE NOCASE ASC
             LIMIT ?2;",
            params![pattern, i64::from(limit)],
        )
    }

    fn list_tags(&self) -> RepoResult<Vec<Tag>> {
        self.collect(
            "SELECT id, name FROM tags ORDER BY name COLLATE NOCASE ASC;",
            [],
        )
    }
}
