use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::warn;

use quillbox_db::models::NoteRow;
use quillbox_types::api::{NoteResponse, SearchParams};

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::AppState;

const MAX_TITLE_LEN: usize = 255;

pub async fn my_notes(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<NoteResponse>>, ApiError> {
    let notes = state.db.list_notes_by_owner(user.id)?;
    Ok(Json(notes.into_iter().map(note_response).collect()))
}

pub async fn search(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<NoteResponse>>, ApiError> {
    let notes = state.db.search_notes(user.id, &params.q)?;
    Ok(Json(notes.into_iter().map(note_response).collect()))
}

/// Create a note from a multipart form: `title`, `content`, optional `file`.
pub async fn create_note(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut title = String::new();
    let mut content = String::new();
    let mut upload: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("multipart error: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => {
                title = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Validation(format!("multipart error: {e}")))?;
            }
            "content" => {
                content = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Validation(format!("multipart error: {e}")))?;
            }
            "file" => {
                let filename = field.file_name().map(|s| s.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(format!("multipart error: {e}")))?;
                // Browsers send an empty file part when nothing was picked.
                if let Some(filename) = filename.filter(|f| !f.is_empty()) {
                    if !data.is_empty() {
                        upload = Some((filename, data));
                    }
                }
            }
            _ => {}
        }
    }

    let title = title.trim();
    let content = content.trim();
    if title.is_empty() {
        return Err(ApiError::Validation("title is required".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ApiError::Validation("title is too long".into()));
    }
    if content.is_empty() {
        return Err(ApiError::Validation("content is required".into()));
    }

    // Attachment bytes land on disk before the note row exists, so a
    // committed note never points at a missing file.
    let attachment = match &upload {
        Some((filename, data)) => Some(state.files.store(user.id, filename, data).await?),
        None => None,
    };

    let note = match state
        .db
        .insert_note(user.id, title, content, attachment.as_deref())
    {
        Ok(note) => note,
        Err(e) => {
            if let Some(reference) = &attachment {
                if let Err(remove_err) = state.files.remove(reference).await {
                    warn!("Failed to clean up attachment {}: {}", reference, remove_err);
                }
            }
            return Err(e.into());
        }
    };

    Ok((StatusCode::CREATED, Json(note_response(note))))
}

/// Delete a note scoped to the caller; a note owned by someone else is
/// indistinguishable from a missing one (404).
pub async fn delete_note(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(note_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let attachment = state.db.delete_note(note_id, user.id)?;

    if let Some(reference) = attachment {
        // Best-effort: a missing file is not a delete failure.
        match state.files.remove(&reference).await {
            Ok(true) => {}
            Ok(false) => warn!("Attachment {} was already missing", reference),
            Err(e) => warn!("Failed to remove attachment {}: {}", reference, e),
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

fn note_response(row: NoteRow) -> NoteResponse {
    NoteResponse {
        id: row.id,
        title: row.title,
        content: row.content,
        attachment: row.file_path,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}
