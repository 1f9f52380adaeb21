//! Server-sent change events for a single note.
//!
//! # Invariants
//! - The feed subscription lives exactly as long as the client connection.
//! - Events are emitted in publish order, one SSE event per row change.

use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive};
use axum::response::{IntoResponse, Response, Sse};
use axum::routing::get;
use axum::Router;
use log::{debug, error, warn};
use notepad_core::realtime::Subscription;
use notepad_core::service::note_service::NOTES_TABLE;
use notepad_core::{ChangeFilter, RowChange};
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt as _;
use uuid::Uuid;

const POLL_INTERVAL: Duration = Duration::from_millis(200);
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);
const EVENT_BUFFER: usize = 32;

pub fn router() -> Router<AppState> {
    Router::new().route("/notes/:id/events", get(note_events))
}

/// Streams every update and delete of one note as `RowChange` JSON.
async fn note_events(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Ok(note_id) = Uuid::parse_str(id.trim()) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    // Subscribe before the existence check so no change slips in between.
    let subscription = state
        .feed()
        .subscribe(ChangeFilter::table(NOTES_TABLE).with_row_id(note_id));
    match state
        .blocking(move |ws| Ok(ws.notes()?.get_note(note_id)?))
        .await
    {
        Ok(_) => {}
        Err(err) if err.is_not_found() => return StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("event=note_events module=web status=error note_id={note_id} error={err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    let (sender, receiver) = mpsc::channel(EVENT_BUFFER);
    tokio::task::spawn_blocking(move || forward(subscription, sender));
    debug!("event=note_events module=web status=start note_id={note_id}");

    let stream = ReceiverStream::new(receiver).filter_map(|change: RowChange| {
        match serde_json::to_string(&change) {
            Ok(json) => Some(Ok::<_, Infallible>(
                Event::default().event(change.kind.as_str()).data(json),
            )),
            Err(err) => {
                warn!(
                    "event=note_events module=web status=error row_id={} error={err}",
                    change.row_id
                );
                None
            }
        }
    });
    Sse::new(stream)
        .keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL))
        .into_response()
}

/// Moves changes from the blocking feed subscription onto the async
/// channel until either side goes away.
fn forward(subscription: Subscription, sender: mpsc::Sender<RowChange>) {
    while subscription.is_attached() && !sender.is_closed() {
        let Some(change) = subscription.recv_timeout(POLL_INTERVAL) else {
            continue;
        };
        if sender.blocking_send(change).is_err() {
            break;
        }
    }
    debug!("event=note_events module=web status=closed");
}
