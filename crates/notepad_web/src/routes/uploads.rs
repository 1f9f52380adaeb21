//! Note image upload and public blob download.

use crate::error::ActionError;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use notepad_core::storage::{upload_note_image, BlobError};
use notepad_core::ActionResult;
use serde::{Deserialize, Serialize};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/uploads/note-images", post(upload_image))
        .route("/blobs/:bucket/:key", get(download_blob))
}

#[derive(Debug, Deserialize)]
struct UploadQuery {
    #[serde(default)]
    file_name: String,
}

#[derive(Debug, Serialize)]
pub struct UploadedImage {
    pub url: String,
}

/// Stores the raw request body as a note image and returns its public URL.
async fn upload_image(
    State(state): State<AppState>,
    query: Result<Query<UploadQuery>, QueryRejection>,
    body: Bytes,
) -> Json<ActionResult<UploadedImage>> {
    let result = state
        .with_blobs(move |store| {
            let Query(query) = query?;
            if body.is_empty() {
                return Err(ActionError::bad_request("upload body must not be empty"));
            }
            let url = upload_note_image(store, &query.file_name, &body)?;
            Ok(UploadedImage { url })
        })
        .await;
    Json(ActionResult::from_result("upload_note_image", result))
}

async fn download_blob(
    State(state): State<AppState>,
    Path((bucket, key)): Path<(String, String)>,
) -> Response {
    let content_type = mime_guess::from_path(&key)
        .first_or_octet_stream()
        .to_string();
    let result = state
        .with_blobs(move |store| Ok(store.read(&bucket, &key)?))
        .await;
    match result {
        Ok(bytes) => ([(header::CONTENT_TYPE, content_type)], bytes).into_response(),
        Err(ActionError::Blob(BlobError::NotFound { .. })) => StatusCode::NOT_FOUND.into_response(),
        Err(ActionError::Blob(BlobError::InvalidName(_))) => {
            StatusCode::BAD_REQUEST.into_response()
        }
        Err(err) => {
            log::error!("event=blob_download module=web status=error error={err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
