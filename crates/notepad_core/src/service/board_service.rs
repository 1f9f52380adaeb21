//! Kanban board use-case service.
//!
//! # Responsibility
//! - Lazily create the single board on first access.
//! - Append columns/tasks and persist drag-and-drop moves.
//!
//! # Invariants
//! - A persisted move leaves every task of each touched column with
//!   `position == index`.
//! - The position batch of one move commits atomically.

use crate::model::board::{
    BoardColumn, BoardId, BoardTask, BoardView, ColumnId, DragLocation, KanbanError,
};
use crate::repo::board_repo::BoardRepository;
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const DEFAULT_BOARD_TITLE: &str = "My Board";

#[derive(Debug)]
pub enum BoardServiceError {
    Kanban(KanbanError),
    InvalidTitle,
    InvalidContent,
    Repo(RepoError),
}

impl Display for BoardServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Kanban(err) => write!(f, "{err}"),
            Self::InvalidTitle => write!(f, "column title must not be blank"),
            Self::InvalidContent => write!(f, "task content must not be blank"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BoardServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Kanban(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::InvalidTitle | Self::InvalidContent => None,
        }
    }
}

impl From<RepoError> for BoardServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<KanbanError> for BoardServiceError {
    fn from(value: KanbanError) -> Self {
        Self::Kanban(value)
    }
}

pub struct BoardService<R: BoardRepository> {
    repo: R,
}

impl<R: BoardRepository> BoardService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns the board id, creating the default board when none exists.
    pub fn ensure_board(&self) -> Result<BoardId, BoardServiceError> {
        if let Some(id) = self.repo.first_board_id()? {
            return Ok(id);
        }
        let id = self.repo.insert_board(DEFAULT_BOARD_TITLE)?;
        info!("event=board_create module=service status=ok board_id={id}");
        Ok(id)
    }

    /// Board with columns and tasks in position order.
    pub fn fetch_board(&self) -> Result<BoardView, BoardServiceError> {
        let board_id = self.ensure_board()?;
        Ok(self.repo.load_board(board_id)?)
    }

    pub fn add_column(
        &self,
        board_id: BoardId,
        title: &str,
    ) -> Result<BoardColumn, BoardServiceError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(BoardServiceError::InvalidTitle);
        }
        let column = self.repo.insert_column(board_id, title)?;
        info!(
            "event=board_add_column module=service status=ok board_id={board_id} column_id={} position={}",
            column.id, column.position
        );
        Ok(column)
    }

    pub fn add_task(
        &self,
        column_id: ColumnId,
        content: &str,
    ) -> Result<BoardTask, BoardServiceError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(BoardServiceError::InvalidContent);
        }
        let task = self.repo.insert_task(column_id, content)?;
        info!(
            "event=board_add_task module=service status=ok column_id={column_id} task_id={} position={}",
            task.id, task.position
        );
        Ok(task)
    }

    /// Applies a drag result and returns the board as persisted. A missing
    /// destination leaves the board untouched.
    pub fn move_task(
        &self,
        source: DragLocation,
        destination: Option<DragLocation>,
    ) -> Result<BoardView, BoardServiceError> {
        let mut board = self.fetch_board()?;
        let Some(plan) = board.move_task(source, destination)? else {
            return Ok(board);
        };

        self.repo.apply_positions(&plan.writes)?;
        info!(
            "event=board_move_task module=service status=ok task_id={} writes={}",
            plan.task_id,
            plan.writes.len()
        );
        Ok(board)
    }
}
