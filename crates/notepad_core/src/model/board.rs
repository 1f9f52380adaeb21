//! Kanban board model and drag-and-drop move planner.
//!
//! # Responsibility
//! - Define board/column/task rows and the nested board view.
//! - Plan a task move as a full set of position writes.
//!
//! # Invariants
//! - After a planned move, every task in each touched column has
//!   `position == index` (dense, zero-based, no gaps).
//! - A move with no destination is a no-op.
//! - Destination indices past the end are clamped to append.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type BoardId = Uuid;
pub type ColumnId = Uuid;
pub type TaskId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardTask {
    pub id: TaskId,
    pub column_id: ColumnId,
    pub content: String,
    pub position: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardColumn {
    pub id: ColumnId,
    pub board_id: BoardId,
    pub title: String,
    pub position: i64,
    /// Ordered by `position`.
    pub tasks: Vec<BoardTask>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardView {
    pub id: BoardId,
    pub title: String,
    /// Ordered by `position`.
    pub columns: Vec<BoardColumn>,
}

/// Drag endpoint: a column and an index inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragLocation {
    pub column_id: ColumnId,
    pub index: usize,
}

/// One row update produced by the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionWrite {
    pub task_id: TaskId,
    pub column_id: ColumnId,
    pub position: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovePlan {
    pub task_id: TaskId,
    pub writes: Vec<PositionWrite>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KanbanError {
    ColumnNotFound(ColumnId),
    TaskIndexOutOfRange {
        column_id: ColumnId,
        index: usize,
        len: usize,
    },
}

impl Display for KanbanError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ColumnNotFound(id) => write!(f, "board column not found: {id}"),
            Self::TaskIndexOutOfRange {
                column_id,
                index,
                len,
            } => write!(
                f,
                "task index {index} out of range for column {column_id} with {len} tasks"
            ),
        }
    }
}

impl Error for KanbanError {}

impl BoardView {
    /// Applies a drag result to this view and returns the writes needed to
    /// persist it. `Ok(None)` means the drop landed outside any column.
    pub fn move_task(
        &mut self,
        source: DragLocation,
        destination: Option<DragLocation>,
    ) -> Result<Option<MovePlan>, KanbanError> {
        let Some(destination) = destination else {
            return Ok(None);
        };

        let source_idx = self.column_index(source.column_id)?;
        let destination_idx = self.column_index(destination.column_id)?;

        let source_len = self.columns[source_idx].tasks.len();
        if source.index >= source_len {
            return Err(KanbanError::TaskIndexOutOfRange {
                column_id: source.column_id,
                index: source.index,
                len: source_len,
            });
        }

        let mut task = self.columns[source_idx].tasks.remove(source.index);
        task.column_id = destination.column_id;
        let task_id = task.id;

        let target = &mut self.columns[destination_idx].tasks;
        let insert_at = destination.index.min(target.len());
        target.insert(insert_at, task);

        let mut writes = reindex(&mut self.columns[destination_idx]);
        if source_idx != destination_idx {
            writes.extend(reindex(&mut self.columns[source_idx]));
        }

        Ok(Some(MovePlan { task_id, writes }))
    }

    fn column_index(&self, column_id: ColumnId) -> Result<usize, KanbanError> {
        self.columns
            .iter()
            .position(|column| column.id == column_id)
            .ok_or(KanbanError::ColumnNotFound(column_id))
    }
}

fn reindex(column: &mut BoardColumn) -> Vec<PositionWrite> {
    column
        .tasks
        .iter_mut()
        .enumerate()
        .map(|(index, task)| {
            task.position = index as i64;
            PositionWrite {
                task_id: task.id,
                column_id: column.id,
                position: task.position,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{BoardColumn, BoardTask, BoardView, DragLocation, KanbanError};
    use uuid::Uuid;

    fn column(board_id: Uuid, title: &str, position: i64, tasks: &[&str]) -> BoardColumn {
        let id = Uuid::new_v4();
        BoardColumn {
            id,
            board_id,
            title: title.to_string(),
            position,
            tasks: tasks
                .iter()
                .enumerate()
                .map(|(index, content)| BoardTask {
                    id: Uuid::new_v4(),
                    column_id: id,
                    content: (*content).to_string(),
                    position: index as i64,
                })
                .collect(),
        }
    }

    fn board() -> BoardView {
        let id = Uuid::new_v4();
        BoardView {
            id,
            title: "Sprint".to_string(),
            columns: vec![
                column(id, "Todo", 0, &["t1", "t2", "t3"]),
                column(id, "Doing", 1, &["d1"]),
            ],
        }
    }

    fn contents(view: &BoardView, column: usize) -> Vec<&str> {
        view.columns[column]
            .tasks
            .iter()
            .map(|task| task.content.as_str())
            .collect()
    }

    #[test]
    fn missing_destination_is_noop() {
        let mut view = board();
        let before = view.clone();
        let source = DragLocation {
            column_id: view.columns[0].id,
            index: 0,
        };
        assert_eq!(view.move_task(source, None).unwrap(), None);
        assert_eq!(view, before);
    }

    #[test]
    fn cross_column_move_rewrites_both_columns() {
        let mut view = board();
        let todo = view.columns[0].id;
        let doing = view.columns[1].id;
        let plan = view
            .move_task(
                DragLocation {
                    column_id: todo,
                    index: 1,
                },
                Some(DragLocation {
                    column_id: doing,
                    index: 0,
                }),
            )
            .unwrap()
            .unwrap();

        assert_eq!(contents(&view, 0), vec!["t1", "t3"]);
        assert_eq!(contents(&view, 1), vec!["t2", "d1"]);
        assert_eq!(plan.writes.len(), 4);
        let moved = plan
            .writes
            .iter()
            .find(|write| write.task_id == plan.task_id)
            .unwrap();
        assert_eq!(moved.column_id, doing);
        assert_eq!(moved.position, 0);
        for column in &view.columns {
            for (index, task) in column.tasks.iter().enumerate() {
                assert_eq!(task.position, index as i64);
                assert_eq!(task.column_id, column.id);
            }
        }
    }

    #[test]
    fn same_column_reorder_and_clamped_index() {
        let mut view = board();
        let todo = view.columns[0].id;
        let plan = view
            .move_task(
                DragLocation {
                    column_id: todo,
                    index: 0,
                },
                Some(DragLocation {
                    column_id: todo,
                    index: 99,
                }),
            )
            .unwrap()
            .unwrap();
        assert_eq!(contents(&view, 0), vec!["t2", "t3", "t1"]);
        assert_eq!(plan.writes.len(), 3);
    }

    #[test]
    fn unknown_column_and_bad_source_index_fail() {
        let mut view = board();
        let todo = view.columns[0].id;
        let err = view
            .move_task(
                DragLocation {
                    column_id: todo,
                    index: 5,
                },
                Some(DragLocation {
                    column_id: todo,
                    index: 0,
                }),
            )
            .unwrap_err();
        assert!(matches!(err, KanbanError::TaskIndexOutOfRange { len: 3, .. }));

        let ghost = Uuid::new_v4();
        let err = view
            .move_task(
                DragLocation {
                    column_id: todo,
                    index: 0,
                },
                Some(DragLocation {
                    column_id: ghost,
                    index: 0,
                }),
            )
            .unwrap_err();
        assert_eq!(err, KanbanError::ColumnNotFound(ghost));
    }
}
