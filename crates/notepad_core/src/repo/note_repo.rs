//! Note and note-version persistence.
//!
//! # Responsibility
//! - Persist note rows together with their append-only version history.
//! - Own the revision write: counter bump, field write and snapshot insert.
//!
//! # Invariants
//! - `create_note` and `save_revision` write the note row and its version row
//!   in one `IMMEDIATE` transaction.
//! - `version_count` is only ever bumped in SQL (`version_count + 1`).
//! - Listing order is `created_at DESC`, ties broken by insertion order.
//! - Deleting a note leaves its versions in place.

use crate::db::ensure_tables;
use crate::model::note::{
    Note, NoteAnalytics, NoteCategory, NoteDraft, NoteId, NoteSummary, NoteVersion, NoteVersionId,
};
use crate::model::outline::OutlineItem;
use crate::repo::{
    begin_immediate, from_json_text, now_epoch_ms, parse_uuid, to_json_text, RepoError,
    RepoResult,
};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, Transaction};
use uuid::Uuid;

pub(crate) const NOTE_COLUMNS: &str = "id, title, content, category, tags, version_count, \
     is_archived, share_id, collaborators, linked_notes, outline, created_at, updated_at";

const VERSION_COLUMNS: &str = "id, note_id, title, content, category, tags, created_at";

/// Query options for the dashboard note lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoteListQuery {
    /// `Some(true)` archived only, `Some(false)` active only, `None` both.
    pub archived: Option<bool>,
}

/// Repository interface for notes and their version history.
pub trait NoteRepository {
    /// Inserts a first-revision note plus its initial version snapshot.
    fn create_note(&self, note: &Note) -> RepoResult<()>;
    /// Writes new fields, bumps `version_count` and appends a snapshot.
    ///
    /// With `expected_version`, fails with `VersionConflict` when the stored
    /// counter differs.
    fn save_revision(
        &self,
        note_id: NoteId,
        draft: &NoteDraft,
        expected_version: Option<i64>,
    ) -> RepoResult<Note>;
    fn get_note(&self, note_id: NoteId) -> RepoResult<Option<Note>>;
    fn get_note_by_share_id(&self, share_id: &str) -> RepoResult<Option<Note>>;
    fn list_notes(&self, query: &NoteListQuery) -> RepoResult<Vec<Note>>;
    fn set_archived(&self, note_id: NoteId, archived: bool) -> RepoResult<()>;
    fn delete_note(&self, note_id: NoteId) -> RepoResult<()>;
    /// Newest first.
    fn list_versions(&self, note_id: NoteId) -> RepoResult<Vec<NoteVersion>>;
    fn get_version(&self, version_id: NoteVersionId) -> RepoResult<Option<NoteVersion>>;
    /// Appends `target` to `source.linked_notes` and returns the new list.
    fn append_link(&self, source: NoteId, target: NoteId) -> RepoResult<Vec<NoteId>>;
    /// `(id, title)` for the ids that still exist, in the given order.
    fn summaries(&self, ids: &[NoteId]) -> RepoResult<Vec<NoteSummary>>;
    /// Up to `limit` notes other than `exclude` whose title contains `needle`.
    fn title_candidates(
        &self,
        exclude: NoteId,
        needle: &str,
        limit: u32,
    ) -> RepoResult<Vec<NoteSummary>>;
    fn set_outline(&self, note_id: NoteId, outline: &[OutlineItem]) -> RepoResult<()>;
    fn set_content(&self, note_id: NoteId, content: &str) -> RepoResult<()>;
    fn append_collaborator(&self, note_id: NoteId, user: &str) -> RepoResult<Vec<String>>;
    fn analytics(&self) -> RepoResult<NoteAnalytics>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["notes", "note_versions"])?;
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create_note(&self, note: &Note) -> RepoResult<()> {
        let tx = begin_immediate(self.conn)?;
        tx.execute(
            "INSERT INTO notes (
                id, title, content, category, tags, version_count, is_archived,
                share_id, collaborators, linked_notes, outline, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13);",
            params![
                note.id.to_string(),
                note.title,
                note.content,
                note.category.as_str(),
                to_json_text(&note.tags, "notes.tags")?,
                note.version_count,
                note.is_archived,
                note.share_id,
                to_json_text(&note.collaborators, "notes.collaborators")?,
                to_json_text(&note.linked_notes, "notes.linked_notes")?,
                to_json_text(&note.outline, "notes.outline")?,
                note.created_at,
                note.updated_at,
            ],
        )?;
        insert_version(&tx, note.id, &note.draft(), note.created_at)?;
        tx.commit()?;
        Ok(())
    }

    fn save_revision(
        &self,
        note_id: NoteId,
        draft: &NoteDraft,
        expected_version: Option<i64>,
    ) -> RepoResult<Note> {
        let id_text = note_id.to_string();
        let tx = begin_immediate(self.conn)?;

        let current: Option<i64> = tx
            .query_row(
                "SELECT version_count FROM notes WHERE id = ?1;",
                [id_text.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(current) = current else {
            return Err(RepoError::not_found("note", note_id));
        };
        if let Some(expected) = expected_version {
            if expected != current {
                return Err(RepoError::VersionConflict {
                    note_id,
                    expected,
                    actual: current,
                });
            }
        }

        let now = now_epoch_ms();
        tx.execute(
            "UPDATE notes
             SET
                title = ?2,
                content = ?3,
                category = ?4,
                tags = ?5,
                version_count = version_count + 1,
                updated_at = ?6
             WHERE id = ?1;",
            params![
                id_text,
                draft.title,
                draft.content,
                draft.category.as_str(),
                to_json_text(&draft.tags, "notes.tags")?,
                now,
            ],
        )?;
        insert_version(&tx, note_id, draft, now)?;

        let note = select_note(&tx, "id = ?1", &id_text)?
            .ok_or_else(|| RepoError::not_found("note", note_id))?;
        tx.commit()?;
        Ok(note)
    }

    fn get_note(&self, note_id: NoteId) -> RepoResult<Option<Note>> {
        select_note(self.conn, "id = ?1", &note_id.to_string())
    }

    fn get_note_by_share_id(&self, share_id: &str) -> RepoResult<Option<Note>> {
        select_note(self.conn, "share_id = ?1", share_id)
    }

    fn list_notes(&self, query: &NoteListQuery) -> RepoResult<Vec<Note>> {
        let mut sql = format!("SELECT {NOTE_COLUMNS} FROM notes");
        let mut bind_values: Vec<i64> = Vec::new();
        if let Some(archived) = query.archived {
            sql.push_str(" WHERE is_archived = ?");
            bind_values.push(i64::from(archived));
        }
        sql.push_str(" ORDER BY created_at DESC, rowid DESC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(note_from_row(row)?);
        }
        Ok(notes)
    }

    fn set_archived(&self, note_id: NoteId, archived: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notes SET is_archived = ?2, updated_at = ?3 WHERE id = ?1;",
            params![note_id.to_string(), archived, now_epoch_ms()],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("note", note_id));
        }
        Ok(())
    }

    fn delete_note(&self, note_id: NoteId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM notes WHERE id = ?1;", [note_id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::not_found("note", note_id));
        }
        Ok(())
    }

    fn list_versions(&self, note_id: NoteId) -> RepoResult<Vec<NoteVersion>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {VERSION_COLUMNS}
             FROM note_versions
             WHERE note_id = ?1
             ORDER BY seq DESC;"
        ))?;
        let mut rows = stmt.query([note_id.to_string()])?;
        let mut versions = Vec::new();
        while let Some(row) = rows.next()? {
            versions.push(version_from_row(row)?);
        }
        Ok(versions)
    }

    fn get_version(&self, version_id: NoteVersionId) -> RepoResult<Option<NoteVersion>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {VERSION_COLUMNS} FROM note_versions WHERE id = ?1;"
        ))?;
        let mut rows = stmt.query([version_id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(version_from_row(row)?)),
            None => Ok(None),
        }
    }

    fn append_link(&self, source: NoteId, target: NoteId) -> RepoResult<Vec<NoteId>> {
        let source_text = source.to_string();
        let tx = begin_immediate(self.conn)?;
        if !note_exists(&tx, &target.to_string())? {
            return Err(RepoError::not_found("note", target));
        }
        let stored: Option<String> = tx
            .query_row(
                "SELECT linked_notes FROM notes WHERE id = ?1;",
                [source_text.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(stored) = stored else {
            return Err(RepoError::not_found("note", source));
        };

        let mut linked: Vec<NoteId> = from_json_text(&stored, "notes.linked_notes")?;
        linked.push(target);
        tx.execute(
            "UPDATE notes SET linked_notes = ?2, updated_at = ?3 WHERE id = ?1;",
            params![
                source_text,
                to_json_text(&linked, "notes.linked_notes")?,
                now_epoch_ms()
            ],
        )?;
        tx.commit()?;
        Ok(linked)
    }

    fn summaries(&self, ids: &[NoteId]) -> RepoResult<Vec<NoteSummary>> {
        let mut stmt = self
            .conn
            .prepare("SELECT title FROM notes WHERE id = ?1;")?;
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            let title: Option<String> = stmt
                .query_row([id.to_string()], |row| row.get(0))
                .optional()?;
            if let Some(title) = title {
                out.push(NoteSummary { id: *id, title });
            }
        }
        Ok(out)
    }

    fn title_candidates(
        &self,
        exclude: NoteId,
        needle: &str,
        limit: u32,
    ) -> RepoResult<Vec<NoteSummary>> {
        let pattern = folded_like_pattern(needle);
        let mut stmt = self.conn.prepare(
            "SELECT id, title
             FROM notes
             WHERE id <> ?1
               AND casefold(title) LIKE ?2 ESCAPE '\\'
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?3;",
        )?;
        let mut rows = stmt.query(params![exclude.to_string(), pattern, i64::from(limit)])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let id: String = row.get(0)?;
            out.push(NoteSummary {
                id: parse_uuid(&id, "notes.id")?,
                title: row.get(1)?,
            });
        }
        Ok(out)
    }

    fn set_outline(&self, note_id: NoteId, outline: &[OutlineItem]) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notes SET outline = ?2, updated_at = ?3 WHERE id = ?1;",
            params![
                note_id.to_string(),
                to_json_text(outline, "notes.outline")?,
                now_epoch_ms()
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("note", note_id));
        }
        Ok(())
    }

    fn set_content(&self, note_id: NoteId, content: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notes SET content = ?2, updated_at = ?3 WHERE id = ?1;",
            params![note_id.to_string(), content, now_epoch_ms()],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("note", note_id));
        }
        Ok(())
    }

    fn append_collaborator(&self, note_id: NoteId, user: &str) -> RepoResult<Vec<String>> {
        let id_text = note_id.to_string();
        let tx = begin_immediate(self.conn)?;
        let stored: Option<String> = tx
            .query_row(
                "SELECT collaborators FROM notes WHERE id = ?1;",
                [id_text.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(stored) = stored else {
            return Err(RepoError::not_found("note", note_id));
        };

        let mut collaborators: Vec<String> = from_json_text(&stored, "notes.collaborators")?;
        collaborators.push(user.to_string());
        tx.execute(
            "UPDATE notes SET collaborators = ?2, updated_at = ?3 WHERE id = ?1;",
            params![
                id_text,
                to_json_text(&collaborators, "notes.collaborators")?,
                now_epoch_ms()
            ],
        )?;
        tx.commit()?;
        Ok(collaborators)
    }

    fn analytics(&self) -> RepoResult<NoteAnalytics> {
        let (total, archived): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(is_archived), 0) FROM notes;",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let mut analytics = NoteAnalytics {
            total_notes: count_to_u64(total)?,
            archived_notes: count_to_u64(archived)?,
            ..NoteAnalytics::default()
        };
        let mut stmt = self
            .conn
            .prepare("SELECT category, COUNT(*) FROM notes GROUP BY category;")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let category: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            analytics
                .category_counts
                .insert(category, count_to_u64(count)?);
        }
        Ok(analytics)
    }
}

/// Escapes `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern.
/// `%needle%` LIKE pattern over the lowercase fold of `needle`; match it
/// against `casefold(column)`.
pub(crate) fn folded_like_pattern(needle: &str) -> String {
    format!("%{}%", escape_like(&needle.to_lowercase()))
}

pub(crate) fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

pub(crate) fn note_from_row(row: &Row<'_>) -> RepoResult<Note> {
    let id: String = row.get("id")?;
    let category: String = row.get("category")?;
    let tags: String = row.get("tags")?;
    let collaborators: String = row.get("collaborators")?;
    let linked_notes: String = row.get("linked_notes")?;
    let outline: String = row.get("outline")?;

    Ok(Note {
        id: parse_uuid(&id, "notes.id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        category: parse_category(&category, "notes.category")?,
        tags: from_json_text(&tags, "notes.tags")?,
        version_count: row.get("version_count")?,
        is_archived: row.get("is_archived")?,
        share_id: row.get("share_id")?,
        collaborators: from_json_text(&collaborators, "notes.collaborators")?,
        linked_notes: from_json_text(&linked_notes, "notes.linked_notes")?,
        outline: from_json_text(&outline, "notes.outline")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn version_from_row(row: &Row<'_>) -> RepoResult<NoteVersion> {
    let id: String = row.get("id")?;
    let note_id: String = row.get("note_id")?;
    let category: String = row.get("category")?;
    let tags: String = row.get("tags")?;
    Ok(NoteVersion {
        id: parse_uuid(&id, "note_versions.id")?,
        note_id: parse_uuid(&note_id, "note_versions.note_id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        category: parse_category(&category, "note_versions.category")?,
        tags: from_json_text(&tags, "note_versions.tags")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_category(value: &str, column: &'static str) -> RepoResult<NoteCategory> {
    value
        .parse()
        .map_err(|err| RepoError::InvalidData(format!("{column}: {err}")))
}

fn count_to_u64(value: i64) -> RepoResult<u64> {
    u64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("negative aggregate count {value}")))
}

fn select_note(conn: &Connection, predicate: &str, value: &str) -> RepoResult<Option<Note>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {NOTE_COLUMNS} FROM notes WHERE {predicate};"
    ))?;
    let mut rows = stmt.query([value])?;
    match rows.next()? {
        Some(row) => Ok(Some(note_from_row(row)?)),
        None => Ok(None),
    }
}

fn insert_version(
    tx: &Transaction<'_>,
    note_id: NoteId,
    draft: &NoteDraft,
    created_at: i64,
) -> RepoResult<NoteVersionId> {
    let version_id = Uuid::new_v4();
    tx.execute(
        "INSERT INTO note_versions (id, note_id, title, content, category, tags, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            version_id.to_string(),
            note_id.to_string(),
            draft.title,
            draft.content,
            draft.category.as_str(),
            to_json_text(&draft.tags, "note_versions.tags")?,
            created_at,
        ],
    )?;
    Ok(version_id)
}

fn note_exists(conn: &Connection, id: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM notes WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

#[cfg(test)]
mod tests {
    use super::{escape_like, folded_like_pattern};

    #[test]
    fn escape_like_guards_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("egg"), "egg");
    }

    #[test]
    fn folded_pattern_lowercases_unicode_before_escaping() {
        assert_eq!(folded_like_pattern("ÉCOLE_"), "%école\\_%");
    }
}
