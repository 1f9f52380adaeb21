use notepad_core::db::open_db_in_memory;
use notepad_core::model::board::{BoardView, DragLocation};
use notepad_core::repo::board_repo::SqliteBoardRepository;
use notepad_core::service::board_service::{
    BoardService, BoardServiceError, DEFAULT_BOARD_TITLE,
};
use rusqlite::Connection;

fn service(conn: &Connection) -> BoardService<SqliteBoardRepository<'_>> {
    BoardService::new(SqliteBoardRepository::try_new(conn).unwrap())
}

fn seeded(service: &BoardService<SqliteBoardRepository<'_>>) -> BoardView {
    let board_id = service.ensure_board().unwrap();
    let todo = service.add_column(board_id, "Todo").unwrap();
    let doing = service.add_column(board_id, "Doing").unwrap();
    for content in ["write", "review", "ship"] {
        service.add_task(todo.id, content).unwrap();
    }
    service.add_task(doing.id, "deploy").unwrap();
    service.fetch_board().unwrap()
}

fn contents(view: &BoardView, column: usize) -> Vec<String> {
    view.columns[column]
        .tasks
        .iter()
        .map(|task| task.content.clone())
        .collect()
}

fn assert_dense_positions(view: &BoardView) {
    for column in &view.columns {
        for (index, task) in column.tasks.iter().enumerate() {
            assert_eq!(task.position, index as i64, "column {}", column.title);
            assert_eq!(task.column_id, column.id);
        }
    }
}

#[test]
fn board_is_created_once_with_default_title() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let first = service.ensure_board().unwrap();
    let second = service.ensure_board().unwrap();
    assert_eq!(first, second);
    let board = service.fetch_board().unwrap();
    assert_eq!(board.title, DEFAULT_BOARD_TITLE);
    assert!(board.columns.is_empty());
}

#[test]
fn columns_and_tasks_append_at_sibling_count() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let board = seeded(&service);

    assert_eq!(board.columns.len(), 2);
    assert_eq!(board.columns[0].title, "Todo");
    assert_eq!(board.columns[1].position, 1);
    assert_eq!(contents(&board, 0), vec!["write", "review", "ship"]);
    assert_dense_positions(&board);
}

#[test]
fn cross_column_move_persists_dense_positions() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let board = seeded(&service);
    let todo = board.columns[0].id;
    let doing = board.columns[1].id;

    let moved = service
        .move_task(
            DragLocation {
                column_id: todo,
                index: 0,
            },
            Some(DragLocation {
                column_id: doing,
                index: 1,
            }),
        )
        .unwrap();
    assert_eq!(contents(&moved, 0), vec!["review", "ship"]);
    assert_eq!(contents(&moved, 1), vec!["deploy", "write"]);

    let reloaded = service.fetch_board().unwrap();
    assert_eq!(reloaded, moved);
    assert_dense_positions(&reloaded);
}

#[test]
fn same_column_reorder_and_drop_outside() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let board = seeded(&service);
    let todo = board.columns[0].id;

    service
        .move_task(
            DragLocation {
                column_id: todo,
                index: 2,
            },
            Some(DragLocation {
                column_id: todo,
                index: 0,
            }),
        )
        .unwrap();
    let reloaded = service.fetch_board().unwrap();
    assert_eq!(contents(&reloaded, 0), vec!["ship", "write", "review"]);
    assert_dense_positions(&reloaded);

    let unchanged = service
        .move_task(
            DragLocation {
                column_id: todo,
                index: 0,
            },
            None,
        )
        .unwrap();
    assert_eq!(unchanged, reloaded);
}

#[test]
fn invalid_inputs_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let board = seeded(&service);
    let todo = board.columns[0].id;

    assert!(matches!(
        service.add_column(board.id, "  "),
        Err(BoardServiceError::InvalidTitle)
    ));
    assert!(matches!(
        service.add_task(todo, ""),
        Err(BoardServiceError::InvalidContent)
    ));
    assert!(matches!(
        service.add_task(uuid::Uuid::new_v4(), "orphan"),
        Err(BoardServiceError::Repo(_))
    ));
    assert!(matches!(
        service.move_task(
            DragLocation {
                column_id: todo,
                index: 9,
            },
            Some(DragLocation {
                column_id: todo,
                index: 0,
            }),
        ),
        Err(BoardServiceError::Kanban(_))
    ));
}
