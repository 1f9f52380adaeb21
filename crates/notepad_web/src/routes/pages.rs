//! Server-rendered HTML pages.
//!
//! # Invariants
//! - User-provided text is escaped, except note content on the share page
//!   which is rendered as stored.

use crate::error::ActionError;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use notepad_core::model::note::NoteAnalytics;
use notepad_core::service::note_service::derive_html_preview;
use notepad_core::{search_notes, Note, NoteSearchQuery};
use serde::Deserialize;
use std::fmt::Write;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard))
        .route("/share/:share_id", get(share_page))
}

type Page = (StatusCode, Html<String>);

#[derive(Debug, Default, Deserialize)]
struct DashboardQuery {
    #[serde(default)]
    q: String,
}

/// Both tabs are narrowed by `?q=` (title or content substring).
async fn dashboard(State(state): State<AppState>, Query(query): Query<DashboardQuery>) -> Page {
    let search = query.q.trim().to_string();
    let needle = search.clone();
    let loaded = state
        .blocking(move |ws| {
            let notes = ws.notes()?;
            let (active, archived) = if needle.is_empty() {
                (notes.list_notes(false)?, notes.list_notes(true)?)
            } else {
                let query = NoteSearchQuery::new(needle);
                (
                    search_notes(ws.conn(), &query.clone().archived(Some(false)))?,
                    search_notes(ws.conn(), &query.archived(Some(true)))?,
                )
            };
            Ok((active, archived, notes.get_analytics()?))
        })
        .await;
    match loaded {
        Ok((active, archived, analytics)) => (
            StatusCode::OK,
            Html(render_dashboard(&search, &active, &archived, &analytics)),
        ),
        Err(err) => error_page("dashboard", &err),
    }
}

async fn share_page(State(state): State<AppState>, Path(share_id): Path<String>) -> Page {
    let loaded = state
        .blocking(move |ws| Ok(ws.notes()?.get_shared_note(&share_id)?))
        .await;
    match loaded {
        Ok(note) => (StatusCode::OK, Html(render_shared_note(&note))),
        Err(err) => error_page("share_page", &err),
    }
}

fn error_page(page: &'static str, err: &ActionError) -> Page {
    if err.is_not_found() {
        return (
            StatusCode::NOT_FOUND,
            Html(layout("Not found", "<h1>Note not found</h1>")),
        );
    }
    log::error!("event=page_render module=web status=error page={page} error={err}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(layout("Error", "<h1>Something went wrong</h1>")),
    )
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n{body}\n</body></html>\n",
        html_escape(title)
    )
}

fn render_dashboard(
    search: &str,
    active: &[Note],
    archived: &[Note],
    analytics: &NoteAnalytics,
) -> String {
    let mut body = String::from("<h1>Notes</h1>\n");
    let _ = write!(
        body,
        "<form method=\"get\" action=\"/\"><input type=\"search\" name=\"q\" value=\"{}\"></form>\n",
        html_escape(search)
    );
    let _ = write!(
        body,
        "<section id=\"analytics\"><p>Total notes: {}</p><p>Archived: {}</p><ul>",
        analytics.total_notes, analytics.archived_notes
    );
    for (category, count) in &analytics.category_counts {
        let _ = write!(body, "<li>{}: {count}</li>", html_escape(category));
    }
    body.push_str("</ul></section>\n");

    render_note_list(&mut body, "active", "Active", active);
    render_note_list(&mut body, "archived", "Archived", archived);
    layout("Notes", &body)
}

fn render_note_list(body: &mut String, id: &str, heading: &str, notes: &[Note]) {
    let _ = write!(body, "<section id=\"{id}\"><h2>{heading}</h2>");
    if notes.is_empty() {
        body.push_str("<p>No notes</p></section>\n");
        return;
    }
    body.push_str("<ul>");
    for note in notes {
        let preview = derive_html_preview(&note.content);
        let _ = write!(
            body,
            "<li><a href=\"/share/{}\">{}</a> <span class=\"category\">{}</span>",
            html_escape(&note.share_id),
            html_escape(&note.title),
            note.category
        );
        if let Some(image) = preview.preview_image {
            let _ = write!(body, "<img src=\"{}\" alt=\"\">", html_escape(&image));
        }
        if let Some(text) = preview.preview_text {
            let _ = write!(body, "<p>{}</p>", html_escape(&text));
        }
        body.push_str("</li>");
    }
    body.push_str("</ul></section>\n");
}

fn render_shared_note(note: &Note) -> String {
    let mut body = format!(
        "<article><h1>{}</h1><p class=\"category\">{}</p>",
        html_escape(&note.title),
        note.category
    );
    if !note.tags.is_empty() {
        body.push_str("<ul class=\"tags\">");
        for tag in &note.tags {
            let _ = write!(body, "<li>{}</li>", html_escape(tag));
        }
        body.push_str("</ul>");
    }
    let _ = write!(body, "<div class=\"content\">{}</div></article>", note.content);
    layout(&note.title, &body)
}

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::{html_escape, render_shared_note};
    use notepad_core::{Note, NoteCategory, NoteDraft};

    #[test]
    fn escape_covers_markup_characters() {
        assert_eq!(
            html_escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn shared_note_escapes_title_and_tags_but_not_content() {
        let draft = NoteDraft::new(
            "<script>x</script>",
            "<p><b>bold</b></p>",
            NoteCategory::Study,
            vec!["a&b".to_string()],
        );
        let html = render_shared_note(&Note::from_draft(draft));
        assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("<li>a&amp;b</li>"));
        assert!(html.contains("<p><b>bold</b></p>"));
        assert!(html.contains("Study"));
    }
}
