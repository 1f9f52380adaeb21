//! Kanban board persistence.
//!
//! # Responsibility
//! - Load a board as a nested, position-ordered view.
//! - Append columns and tasks at the end of their parent.
//! - Persist a planned move as one batch of position writes.
//!
//! # Invariants
//! - New columns/tasks take `position = current sibling count`.
//! - `apply_positions` is all-or-nothing.

use crate::db::ensure_tables;
use crate::model::board::{
    BoardColumn, BoardId, BoardTask, BoardView, ColumnId, PositionWrite, TaskId,
};
use crate::repo::{begin_immediate, now_epoch_ms, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

pub trait BoardRepository {
    /// Oldest board, if any.
    fn first_board_id(&self) -> RepoResult<Option<BoardId>>;
    fn insert_board(&self, title: &str) -> RepoResult<BoardId>;
    fn load_board(&self, board_id: BoardId) -> RepoResult<BoardView>;
    fn insert_column(&self, board_id: BoardId, title: &str) -> RepoResult<BoardColumn>;
    fn insert_task(&self, column_id: ColumnId, content: &str) -> RepoResult<BoardTask>;
    fn apply_positions(&self, writes: &[PositionWrite]) -> RepoResult<()>;
}

pub struct SqliteBoardRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBoardRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["boards", "board_columns", "board_tasks"])?;
        Ok(Self { conn })
    }
}

impl BoardRepository for SqliteBoardRepository<'_> {
    fn first_board_id(&self) -> RepoResult<Option<BoardId>> {
        let id: Option<String> = self
            .conn
            .query_row(
                "SELECT id FROM boards ORDER BY created_at ASC, rowid ASC LIMIT 1;",
                [],
                |row| row.get(0),
            )
            .optional()?;
        id.map(|text| parse_uuid(&text, "boards.id")).transpose()
    }

    fn insert_board(&self, title: &str) -> RepoResult<BoardId> {
        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO boards (id, title, created_at) VALUES (?1, ?2, ?3);",
            params![id.to_string(), title, now_epoch_ms()],
        )?;
        Ok(id)
    }

    fn load_board(&self, board_id: BoardId) -> RepoResult<BoardView> {
        let board_text = board_id.to_string();
        let title: Option<String> = self
            .conn
            .query_row(
                "SELECT title FROM boards WHERE id = ?1;",
                [board_text.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(title) = title else {
            return Err(RepoError::not_found("board", board_id));
        };

        let mut columns = Vec::new();
        let mut column_stmt = self.conn.prepare(
            "SELECT id, title, position
             FROM board_columns
             WHERE board_id = ?1
             ORDER BY position ASC, rowid ASC;",
        )?;
        let mut rows = column_stmt.query([board_text.as_str()])?;
        while let Some(row) = rows.next()? {
            let id: String = row.get("id")?;
            columns.push(BoardColumn {
                id: parse_uuid(&id, "board_columns.id")?,
                board_id,
                title: row.get("title")?,
                position: row.get("position")?,
                tasks: Vec::new(),
            });
        }

        let mut task_stmt = self.conn.prepare(
            "SELECT id, content, position
             FROM board_tasks
             WHERE column_id = ?1
             ORDER BY position ASC, rowid ASC;",
        )?;
        for column in &mut columns {
            let mut rows = task_stmt.query([column.id.to_string()])?;
            while let Some(row) = rows.next()? {
                let id: String = row.get("id")?;
                column.tasks.push(BoardTask {
                    id: parse_uuid(&id, "board_tasks.id")?,
                    column_id: column.id,
                    content: row.get("content")?,
                    position: row.get("position")?,
                });
            }
        }

        Ok(BoardView {
            id: board_id,
            title,
            columns,
        })
    }

    fn insert_column(&self, board_id: BoardId, title: &str) -> RepoResult<BoardColumn> {
        let board_text = board_id.to_string();
        let tx = begin_immediate(self.conn)?;
        let exists: i64 = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM boards WHERE id = ?1);",
            [board_text.as_str()],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::not_found("board", board_id));
        }
        let position: i64 = tx.query_row(
            "SELECT COUNT(*) FROM board_columns WHERE board_id = ?1;",
            [board_text.as_str()],
            |row| row.get(0),
        )?;
        let id = Uuid::new_v4();
        tx.execute(
            "INSERT INTO board_columns (id, board_id, title, position) VALUES (?1, ?2, ?3, ?4);",
            params![id.to_string(), board_text, title, position],
        )?;
        tx.commit()?;
        Ok(BoardColumn {
            id,
            board_id,
            title: title.to_string(),
            position,
            tasks: Vec::new(),
        })
    }

    fn insert_task(&self, column_id: ColumnId, content: &str) -> RepoResult<BoardTask> {
        let column_text = column_id.to_string();
        let tx = begin_immediate(self.conn)?;
        let exists: i64 = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM board_columns WHERE id = ?1);",
            [column_text.as_str()],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::not_found("board column", column_id));
        }
        let position: i64 = tx.query_row(
            "SELECT COUNT(*) FROM board_tasks WHERE column_id = ?1;",
            [column_text.as_str()],
            |row| row.get(0),
        )?;
        let id = Uuid::new_v4();
        tx.execute(
            "INSERT INTO board_tasks (id, column_id, content, position) VALUES (?1, ?2, ?3, ?4);",
            params![id.to_string(), column_text, content, position],
        )?;
        tx.commit()?;
        Ok(BoardTask {
            id,
            column_id,
            content: content.to_string(),
            position,
        })
    }

    fn apply_positions(&self, writes: &[PositionWrite]) -> RepoResult<()> {
        let tx = begin_immediate(self.conn)?;
        {
            let mut stmt = tx.prepare(
                "UPDATE board_tasks SET column_id = ?2, position = ?3 WHERE id = ?1;",
            )?;
            for write in writes {
                let changed = stmt.execute(params![
                    write.task_id.to_string(),
                    write.column_id.to_string(),
                    write.position
                ])?;
                if changed == 0 {
                    return Err(missing_task(write.task_id));
                }
            }
        }
        tx.commit()?;
        Ok(())
    }
}

fn missing_task(task_id: TaskId) -> RepoError {
    RepoError::not_found("board task", task_id)
}
