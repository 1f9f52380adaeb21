//! Form-driven action endpoints.
//!
//! # Responsibility
//! - Decode form, query and JSON input into service calls.
//! - Answer every action with the `{success, data}` / `{error}` envelope.
//!
//! # Invariants
//! - Action responses are always HTTP 200; failures live in the envelope.
//! - Input decoding errors surface as envelope errors, not rejections.

use crate::error::ActionError;
use crate::state::AppState;
use axum::extract::rejection::{FormRejection, JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use notepad_core::model::ai_prompt::AiPrompt;
use notepad_core::model::board::{BoardColumn, BoardTask, BoardView, DragLocation};
use notepad_core::model::meeting::{Meeting, NewMeeting};
use notepad_core::model::mind_map::MindMapNode;
use notepad_core::model::note::{NoteAnalytics, NoteSummary};
use notepad_core::model::outline::{OutlineEdit, OutlineItem};
use notepad_core::model::tag::Tag;
use notepad_core::service::meeting_service::parse_meeting_time;
use notepad_core::{
    parse_tags_field, search_notes, ActionResult, Note, NoteCategory, NoteDraft, NoteId,
    NoteSearchQuery, NoteVersion,
};
use serde::Deserialize;
use uuid::Uuid;

type Envelope<T> = Json<ActionResult<T>>;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notes", get(list_notes).post(add_note))
        .route("/notes/search", get(search))
        .route("/notes/:id", get(get_note).post(update_note))
        .route("/notes/:id/delete", post(delete_note))
        .route("/notes/:id/archive", post(archive_note))
        .route("/notes/:id/unarchive", post(unarchive_note))
        .route("/notes/:id/versions", get(note_versions))
        .route(
            "/notes/:id/versions/:version_id/restore",
            post(restore_version),
        )
        .route("/notes/:id/links", get(linked_notes).post(link_note))
        .route("/notes/:id/link-candidates", get(link_candidates))
        .route("/notes/:id/outline", post(update_outline))
        .route("/notes/:id/outline/items", post(add_outline_item))
        .route("/notes/:id/outline/items/:item_id", post(edit_outline_item))
        .route(
            "/notes/:id/outline/items/:item_id/delete",
            post(remove_outline_item),
        )
        .route("/notes/:id/outline/moves", post(move_outline_item))
        .route("/notes/:id/content", post(set_content))
        .route("/notes/:id/collaborators", post(add_collaborator))
        .route("/shared/:share_id", get(shared_note))
        .route("/analytics", get(analytics))
        .route("/tags", get(get_tags).post(add_tag))
        .route("/meetings", get(get_meetings).post(create_meeting))
        .route("/ai-prompts", get(get_ai_prompts).post(save_ai_prompt))
        .route("/board", get(fetch_board))
        .route("/board/columns", post(add_column))
        .route("/board/tasks", post(add_task))
        .route("/board/moves", post(move_task))
        .route("/mind-map", get(list_nodes).post(add_node))
        .route("/mind-map/:id/position", post(move_node))
        .route("/mind-map/:id/parent", post(reparent_node))
        .route("/mind-map/:id/delete", post(delete_node))
}

fn parse_uuid(field: &str, raw: &str) -> Result<Uuid, ActionError> {
    Uuid::parse_str(raw.trim())
        .map_err(|err| ActionError::bad_request(format!("invalid {field} `{raw}`: {err}")))
}

fn parse_optional_uuid(field: &str, raw: Option<&str>) -> Result<Option<Uuid>, ActionError> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => parse_uuid(field, value).map(Some),
        None => Ok(None),
    }
}

fn parse_coordinate(field: &str, raw: &str) -> Result<f64, ActionError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|err| ActionError::bad_request(format!("invalid {field} `{raw}`: {err}")))
}

#[derive(Debug, Deserialize)]
struct NoteForm {
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    tags: String,
    /// Only read by updates; blank means "no check".
    #[serde(default)]
    expected_version: String,
}

impl NoteForm {
    fn draft(&self) -> Result<NoteDraft, ActionError> {
        let category = if self.category.trim().is_empty() {
            NoteCategory::default()
        } else {
            self.category
                .parse::<NoteCategory>()
                .map_err(|err| ActionError::bad_request(err.to_string()))?
        };
        Ok(NoteDraft::new(
            self.title.clone(),
            self.content.clone(),
            category,
            parse_tags_field(&self.tags),
        ))
    }

    fn expected_version(&self) -> Result<Option<i64>, ActionError> {
        let raw = self.expected_version.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse::<i64>().map(Some).map_err(|err| {
            ActionError::bad_request(format!("invalid expected_version `{raw}`: {err}"))
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    #[serde(default)]
    archived: bool,
}

async fn list_notes(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Envelope<Vec<Note>> {
    let result = state
        .run("list_notes", move |ws| {
            let Query(query) = query?;
            Ok(ws.notes()?.list_notes(query.archived)?)
        })
        .await;
    Json(result)
}

async fn add_note(
    State(state): State<AppState>,
    form: Result<Form<NoteForm>, FormRejection>,
) -> Envelope<Note> {
    let result = state
        .run("add_note", move |ws| {
            let Form(form) = form?;
            Ok(ws.notes()?.add_note(form.draft()?)?)
        })
        .await;
    Json(result)
}

async fn get_note(State(state): State<AppState>, Path(id): Path<String>) -> Envelope<Note> {
    let result = state
        .run("get_note", move |ws| {
            let note_id = parse_uuid("note id", &id)?;
            Ok(ws.notes()?.get_note(note_id)?)
        })
        .await;
    Json(result)
}

async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    form: Result<Form<NoteForm>, FormRejection>,
) -> Envelope<Note> {
    let result = state
        .run("update_note", move |ws| {
            let note_id = parse_uuid("note id", &id)?;
            let Form(form) = form?;
            let expected = form.expected_version()?;
            Ok(ws.notes()?.update_note(note_id, form.draft()?, expected)?)
        })
        .await;
    Json(result)
}

async fn delete_note(State(state): State<AppState>, Path(id): Path<String>) -> Envelope<()> {
    let result = state
        .run("delete_note", move |ws| {
            let note_id = parse_uuid("note id", &id)?;
            Ok(ws.notes()?.delete_note(note_id)?)
        })
        .await;
    Json(result)
}

async fn archive_note(State(state): State<AppState>, Path(id): Path<String>) -> Envelope<Note> {
    let result = state
        .run("archive_note", move |ws| {
            let note_id = parse_uuid("note id", &id)?;
            Ok(ws.notes()?.archive_note(note_id)?)
        })
        .await;
    Json(result)
}

async fn unarchive_note(State(state): State<AppState>, Path(id): Path<String>) -> Envelope<Note> {
    let result = state
        .run("unarchive_note", move |ws| {
            let note_id = parse_uuid("note id", &id)?;
            Ok(ws.notes()?.unarchive_note(note_id)?)
        })
        .await;
    Json(result)
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
    archived: Option<bool>,
}

async fn search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Envelope<Vec<Note>> {
    let result = state
        .run("search_notes", move |ws| {
            let Query(params) = params?;
            let query = NoteSearchQuery::new(params.q).archived(params.archived);
            Ok(search_notes(ws.conn(), &query)?)
        })
        .await;
    Json(result)
}

async fn note_versions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Envelope<Vec<NoteVersion>> {
    let result = state
        .run("get_note_versions", move |ws| {
            let note_id = parse_uuid("note id", &id)?;
            Ok(ws.notes()?.get_note_versions(note_id)?)
        })
        .await;
    Json(result)
}

async fn restore_version(
    State(state): State<AppState>,
    Path((id, version_id)): Path<(String, String)>,
) -> Envelope<Note> {
    let result = state
        .run("restore_note_version", move |ws| {
            let note_id = parse_uuid("note id", &id)?;
            let version_id = parse_uuid("version id", &version_id)?;
            Ok(ws.notes()?.restore_note_version(note_id, version_id)?)
        })
        .await;
    Json(result)
}

#[derive(Debug, Deserialize)]
struct LinkForm {
    target_id: String,
}

async fn link_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    form: Result<Form<LinkForm>, FormRejection>,
) -> Envelope<Vec<NoteId>> {
    let result = state
        .run("link_notes", move |ws| {
            let source = parse_uuid("note id", &id)?;
            let Form(form) = form?;
            let target = parse_uuid("target_id", &form.target_id)?;
            Ok(ws.notes()?.link_notes(source, target)?)
        })
        .await;
    Json(result)
}

async fn linked_notes(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Envelope<Vec<NoteSummary>> {
    let result = state
        .run("get_linked_notes", move |ws| {
            let note_id = parse_uuid("note id", &id)?;
            Ok(ws.notes()?.get_linked_notes(note_id)?)
        })
        .await;
    Json(result)
}

#[derive(Debug, Deserialize)]
struct TextQuery {
    #[serde(default)]
    q: String,
}

async fn link_candidates(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<TextQuery>, QueryRejection>,
) -> Envelope<Vec<NoteSummary>> {
    let result = state
        .run("find_link_candidates", move |ws| {
            let note_id = parse_uuid("note id", &id)?;
            let Query(query) = query?;
            Ok(ws.notes()?.find_link_candidates(note_id, &query.q)?)
        })
        .await;
    Json(result)
}

async fn update_outline(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Vec<OutlineItem>>, JsonRejection>,
) -> Envelope<Vec<OutlineItem>> {
    let result = state
        .run("update_note_outline", move |ws| {
            let note_id = parse_uuid("note id", &id)?;
            let Json(outline) = body?;
            Ok(ws.notes()?.update_note_outline(note_id, &outline)?)
        })
        .await;
    Json(result)
}

#[derive(Debug, Deserialize)]
struct OutlineItemForm {
    parent: Option<String>,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct OutlineMoveForm {
    parent: Option<String>,
    from: usize,
    to: usize,
}

fn outline_parent(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}

async fn add_outline_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    form: Result<Form<OutlineItemForm>, FormRejection>,
) -> Envelope<OutlineEdit> {
    let result = state
        .run("add_outline_item", move |ws| {
            let note_id = parse_uuid("note id", &id)?;
            let Form(form) = form?;
            let parent = outline_parent(form.parent.as_deref());
            Ok(ws.notes()?.add_outline_item(note_id, parent, &form.content)?)
        })
        .await;
    Json(result)
}

async fn edit_outline_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(String, String)>,
    form: Result<Form<OutlineItemForm>, FormRejection>,
) -> Envelope<OutlineEdit> {
    let result = state
        .run("edit_outline_item", move |ws| {
            let note_id = parse_uuid("note id", &id)?;
            let Form(form) = form?;
            Ok(ws.notes()?.edit_outline_item(note_id, &item_id, &form.content)?)
        })
        .await;
    Json(result)
}

async fn remove_outline_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(String, String)>,
) -> Envelope<OutlineEdit> {
    let result = state
        .run("remove_outline_item", move |ws| {
            let note_id = parse_uuid("note id", &id)?;
            Ok(ws.notes()?.remove_outline_item(note_id, &item_id)?)
        })
        .await;
    Json(result)
}

async fn move_outline_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    form: Result<Form<OutlineMoveForm>, FormRejection>,
) -> Envelope<OutlineEdit> {
    let result = state
        .run("move_outline_item", move |ws| {
            let note_id = parse_uuid("note id", &id)?;
            let Form(form) = form?;
            let parent = outline_parent(form.parent.as_deref());
            Ok(ws.notes()?.move_outline_item(note_id, parent, form.from, form.to)?)
        })
        .await;
    Json(result)
}

#[derive(Debug, Deserialize)]
struct ContentForm {
    #[serde(default)]
    content: String,
}

async fn set_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
    form: Result<Form<ContentForm>, FormRejection>,
) -> Envelope<Note> {
    let result = state
        .run("set_note_content", move |ws| {
            let note_id = parse_uuid("note id", &id)?;
            let Form(form) = form?;
            Ok(ws.notes()?.set_note_content(note_id, &form.content)?)
        })
        .await;
    Json(result)
}

#[derive(Debug, Deserialize)]
struct CollaboratorForm {
    #[serde(default)]
    user: String,
}

async fn add_collaborator(
    State(state): State<AppState>,
    Path(id): Path<String>,
    form: Result<Form<CollaboratorForm>, FormRejection>,
) -> Envelope<Vec<String>> {
    let result = state
        .run("add_collaborator", move |ws| {
            let note_id = parse_uuid("note id", &id)?;
            let Form(form) = form?;
            Ok(ws.notes()?.add_collaborator(note_id, &form.user)?)
        })
        .await;
    Json(result)
}

async fn shared_note(
    State(state): State<AppState>,
    Path(share_id): Path<String>,
) -> Envelope<Note> {
    let result = state
        .run("get_shared_note", move |ws| {
            Ok(ws.notes()?.get_shared_note(&share_id)?)
        })
        .await;
    Json(result)
}

async fn analytics(State(state): State<AppState>) -> Envelope<NoteAnalytics> {
    let result = state
        .run("get_analytics", |ws| Ok(ws.notes()?.get_analytics()?))
        .await;
    Json(result)
}

async fn get_tags(
    State(state): State<AppState>,
    query: Result<Query<TextQuery>, QueryRejection>,
) -> Envelope<Vec<String>> {
    let result = state
        .run("get_tags", move |ws| {
            let Query(query) = query?;
            Ok(ws.tags()?.get_tags(&query.q)?)
        })
        .await;
    Json(result)
}

#[derive(Debug, Deserialize)]
struct TagForm {
    #[serde(default)]
    name: String,
}

async fn add_tag(
    State(state): State<AppState>,
    form: Result<Form<TagForm>, FormRejection>,
) -> Envelope<Tag> {
    let result = state
        .run("add_tag", move |ws| {
            let Form(form) = form?;
            Ok(ws.tags()?.add_tag(&form.name)?)
        })
        .await;
    Json(result)
}

async fn get_meetings(State(state): State<AppState>) -> Envelope<Vec<Meeting>> {
    let result = state
        .run("get_meetings", |ws| Ok(ws.meetings()?.get_meetings()?))
        .await;
    Json(result)
}

#[derive(Debug, Deserialize)]
struct MeetingForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    start_time: String,
    end_time: String,
    /// JSON array or comma-separated names.
    #[serde(default)]
    attendees: String,
}

async fn create_meeting(
    State(state): State<AppState>,
    form: Result<Form<MeetingForm>, FormRejection>,
) -> Envelope<Meeting> {
    let result = state
        .run("create_meeting", move |ws| {
            let Form(form) = form?;
            let meeting = NewMeeting {
                title: form.title,
                description: form.description,
                start_time: parse_meeting_time(&form.start_time)?,
                end_time: parse_meeting_time(&form.end_time)?,
                attendees: parse_tags_field(&form.attendees),
            };
            Ok(ws.meetings()?.create_meeting(meeting)?)
        })
        .await;
    Json(result)
}

async fn get_ai_prompts(State(state): State<AppState>) -> Envelope<Vec<AiPrompt>> {
    let result = state
        .run("get_ai_prompts", |ws| Ok(ws.prompts()?.get_ai_prompts()?))
        .await;
    Json(result)
}

#[derive(Debug, Deserialize)]
struct PromptForm {
    #[serde(default)]
    prompt: String,
    #[serde(default)]
    response: String,
}

async fn save_ai_prompt(
    State(state): State<AppState>,
    form: Result<Form<PromptForm>, FormRejection>,
) -> Envelope<AiPrompt> {
    let result = state
        .run("save_ai_prompt", move |ws| {
            let Form(form) = form?;
            Ok(ws.prompts()?.save_ai_prompt(&form.prompt, &form.response)?)
        })
        .await;
    Json(result)
}

async fn fetch_board(State(state): State<AppState>) -> Envelope<BoardView> {
    let result = state
        .run("fetch_board", |ws| Ok(ws.board()?.fetch_board()?))
        .await;
    Json(result)
}

#[derive(Debug, Deserialize)]
struct ColumnForm {
    #[serde(default)]
    title: String,
}

/// Appends a column to the board, creating the board on first use.
async fn add_column(
    State(state): State<AppState>,
    form: Result<Form<ColumnForm>, FormRejection>,
) -> Envelope<BoardColumn> {
    let result = state
        .run("add_column", move |ws| {
            let Form(form) = form?;
            let board = ws.board()?;
            let board_id = board.ensure_board()?;
            Ok(board.add_column(board_id, &form.title)?)
        })
        .await;
    Json(result)
}

#[derive(Debug, Deserialize)]
struct TaskForm {
    column_id: String,
    #[serde(default)]
    content: String,
}

async fn add_task(
    State(state): State<AppState>,
    form: Result<Form<TaskForm>, FormRejection>,
) -> Envelope<BoardTask> {
    let result = state
        .run("add_task", move |ws| {
            let Form(form) = form?;
            let column_id = parse_uuid("column_id", &form.column_id)?;
            Ok(ws.board()?.add_task(column_id, &form.content)?)
        })
        .await;
    Json(result)
}

/// Drag-and-drop result; `destination` is absent when dropped outside.
#[derive(Debug, Deserialize)]
struct MoveRequest {
    source: DragLocation,
    #[serde(default)]
    destination: Option<DragLocation>,
}

async fn move_task(
    State(state): State<AppState>,
    body: Result<Json<MoveRequest>, JsonRejection>,
) -> Envelope<BoardView> {
    let result = state
        .run("move_task", move |ws| {
            let Json(request) = body?;
            Ok(ws
                .board()?
                .move_task(request.source, request.destination)?)
        })
        .await;
    Json(result)
}

async fn list_nodes(State(state): State<AppState>) -> Envelope<Vec<MindMapNode>> {
    let result = state
        .run("list_mind_map_nodes", |ws| Ok(ws.mind_map()?.list_nodes()?))
        .await;
    Json(result)
}

#[derive(Debug, Deserialize)]
struct NodeForm {
    #[serde(default)]
    content: String,
    #[serde(default)]
    x: String,
    #[serde(default)]
    y: String,
    #[serde(default)]
    parent_id: String,
}

impl NodeForm {
    fn position(&self) -> Result<Option<(f64, f64)>, ActionError> {
        match (self.x.trim().is_empty(), self.y.trim().is_empty()) {
            (true, true) => Ok(None),
            (false, false) => Ok(Some((
                parse_coordinate("x", &self.x)?,
                parse_coordinate("y", &self.y)?,
            ))),
            _ => Err(ActionError::bad_request("x and y must be given together")),
        }
    }
}

async fn add_node(
    State(state): State<AppState>,
    form: Result<Form<NodeForm>, FormRejection>,
) -> Envelope<MindMapNode> {
    let result = state
        .run("add_mind_map_node", move |ws| {
            let Form(form) = form?;
            let position = form.position()?;
            let parent_id = parse_optional_uuid("parent_id", Some(&form.parent_id))?;
            Ok(ws
                .mind_map()?
                .add_node(&form.content, position, parent_id)?)
        })
        .await;
    Json(result)
}

#[derive(Debug, Deserialize)]
struct PositionForm {
    x: String,
    y: String,
}

async fn move_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
    form: Result<Form<PositionForm>, FormRejection>,
) -> Envelope<MindMapNode> {
    let result = state
        .run("move_mind_map_node", move |ws| {
            let node_id = parse_uuid("node id", &id)?;
            let Form(form) = form?;
            let x = parse_coordinate("x", &form.x)?;
            let y = parse_coordinate("y", &form.y)?;
            Ok(ws.mind_map()?.move_node(node_id, x, y)?)
        })
        .await;
    Json(result)
}

#[derive(Debug, Deserialize)]
struct ParentForm {
    /// Blank detaches the node to the top level.
    #[serde(default)]
    parent_id: String,
}

async fn reparent_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
    form: Result<Form<ParentForm>, FormRejection>,
) -> Envelope<MindMapNode> {
    let result = state
        .run("reparent_mind_map_node", move |ws| {
            let node_id = parse_uuid("node id", &id)?;
            let Form(form) = form?;
            let parent_id = parse_optional_uuid("parent_id", Some(&form.parent_id))?;
            Ok(ws.mind_map()?.reparent(node_id, parent_id)?)
        })
        .await;
    Json(result)
}

async fn delete_node(State(state): State<AppState>, Path(id): Path<String>) -> Envelope<()> {
    let result = state
        .run("delete_mind_map_node", move |ws| {
            let node_id = parse_uuid("node id", &id)?;
            Ok(ws.mind_map()?.delete_node(node_id)?)
        })
        .await;
    Json(result)
}

#[cfg(test)]
mod tests {
    use super::{parse_optional_uuid, NoteForm, NodeForm};
    use notepad_core::NoteCategory;

    fn note_form(category: &str, expected_version: &str) -> NoteForm {
        NoteForm {
            title: "Groceries".to_string(),
            content: "milk".to_string(),
            category: category.to_string(),
            tags: "home, errands".to_string(),
            expected_version: expected_version.to_string(),
        }
    }

    #[test]
    fn note_form_defaults_blank_category_and_parses_tags() {
        let draft = note_form("  ", "").draft().unwrap();
        assert_eq!(draft.category, NoteCategory::Personal);
        assert_eq!(draft.tags, vec!["home".to_string(), "errands".to_string()]);
        assert_eq!(note_form("work", "").draft().unwrap().category, NoteCategory::Work);
        assert!(note_form("hobby", "").draft().is_err());
    }

    #[test]
    fn expected_version_is_optional_but_must_be_numeric() {
        assert_eq!(note_form("", " ").expected_version().unwrap(), None);
        assert_eq!(note_form("", "3").expected_version().unwrap(), Some(3));
        assert!(note_form("", "three").expected_version().is_err());
    }

    #[test]
    fn node_position_requires_both_coordinates() {
        let form = |x: &str, y: &str| NodeForm {
            content: "idea".to_string(),
            x: x.to_string(),
            y: y.to_string(),
            parent_id: String::new(),
        };
        assert_eq!(form("", "").position().unwrap(), None);
        assert_eq!(form("1.5", "2").position().unwrap(), Some((1.5, 2.0)));
        assert!(form("1", "").position().is_err());
        assert!(form("a", "2").position().is_err());
    }

    #[test]
    fn blank_optional_uuid_is_none() {
        assert_eq!(parse_optional_uuid("parent_id", Some("  ")).unwrap(), None);
        assert!(parse_optional_uuid("parent_id", Some("nope")).is_err());
    }
}
