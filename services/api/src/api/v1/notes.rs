//! Note endpoints.
//!
//! Notes hang off a book owned by the same reader. The spaced-repetition
//! fields are returned here but only change through the flashcard endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tramdoc_id::{BookId, NoteId};

use crate::api::authz;
use crate::api::error::{ApiError, FieldError};
use crate::api::request_context::RequestContext;
use crate::db::{NewNote, NoteFilter, NotePatch, NoteRow, NoteType};
use crate::state::AppState;

/// Note routes.
///
/// /v1/notes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notes).post(create_note))
        .route(
            "/{note_id}",
            get(get_note).patch(update_note).delete(delete_note),
        )
}

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ListNotesQuery {
    pub book_id: Option<String>,
    #[serde(rename = "type")]
    pub note_type: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    pub book_id: String,
    pub content: String,
    #[serde(default)]
    pub page: i32,
    #[serde(default, rename = "type")]
    pub note_type: NoteType,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateNoteRequest {
    pub content: Option<String>,
    pub page: Option<i32>,
    #[serde(rename = "type")]
    pub note_type: Option<NoteType>,
}

#[derive(Debug, Serialize)]
pub struct NoteResponse {
    pub id: String,
    pub book_id: String,
    pub book_title: String,
    pub content: String,
    pub page: i32,
    #[serde(rename = "type")]
    pub note_type: NoteType,
    pub is_flashcard: bool,
    pub review_count: i32,
    pub ease: f64,
    pub interval: i32,
    pub next_review: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ListNotesResponse {
    pub items: Vec<NoteResponse>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub ok: bool,
}

impl From<NoteRow> for NoteResponse {
    fn from(row: NoteRow) -> Self {
        Self {
            id: row.note_id,
            book_id: row.book_id,
            book_title: row.book_title,
            content: row.content,
            page: row.page,
            note_type: row.note_type,
            is_flashcard: row.flashcard.is_flashcard,
            review_count: row.flashcard.review_count,
            ease: row.flashcard.ease,
            interval: row.flashcard.interval,
            next_review: row.flashcard.next_review,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub(super) fn parse_note_id(raw: &str, request_id: &str) -> Result<NoteId, ApiError> {
    raw.parse().map_err(|_| {
        ApiError::bad_request("invalid_note_id", "Invalid note ID format")
            .with_request_id(request_id.to_string())
    })
}

pub(super) fn note_not_found(note_id: &NoteId, request_id: &str) -> ApiError {
    ApiError::not_found("note_not_found", format!("Note {note_id} not found"))
        .with_request_id(request_id.to_string())
}

fn content_error(content: &str) -> Option<FieldError> {
    content
        .trim()
        .is_empty()
        .then(|| FieldError::new("content", "content cannot be empty"))
}

// =============================================================================
// Handlers
// =============================================================================

/// List the caller's notes, newest first.
///
/// GET /v1/notes?book_id=&type=&search=
async fn list_notes(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<ListNotesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = ctx.request_id.clone();
    let owner_id = authz::require_owner(&ctx)?;

    let book_id = match query.book_id.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(raw.parse::<BookId>().map_err(|_| {
            ApiError::bad_request("invalid_book_id", "Invalid book ID format")
                .with_request_id(request_id.clone())
        })?),
        None => None,
    };

    let note_type = match query.note_type.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(NoteType::parse(raw).ok_or_else(|| {
            ApiError::bad_request(
                "invalid_note_type",
                "type must be one of note, highlight, quote, takeaway",
            )
            .with_request_id(request_id.clone())
        })?),
        None => None,
    };

    let filter = NoteFilter {
        book_id,
        note_type,
        search: query.search.filter(|s| !s.is_empty()),
    };

    let rows = state
        .db()
        .note_store()
        .list(owner_id, &filter)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, request_id = %request_id, "Failed to list notes");
            ApiError::internal("internal_error", "Failed to list notes")
                .with_request_id(request_id.clone())
        })?;

    let items: Vec<NoteResponse> = rows.into_iter().map(NoteResponse::from).collect();
    let count = items.len();

    Ok(Json(ListNotesResponse { items, count }))
}

/// Attach a note to one of the caller's books.
///
/// POST /v1/notes
async fn create_note(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(req): Json<CreateNoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = ctx.request_id.clone();
    let owner_id = authz::require_owner(&ctx)?;

    let book_id: BookId = req.book_id.parse().map_err(|_| {
        ApiError::bad_request("invalid_book_id", "Invalid book ID format")
            .with_request_id(request_id.clone())
    })?;

    if let Some(error) = content_error(&req.content) {
        return Err(ApiError::bad_request("validation_failed", "Invalid note")
            .with_details(vec![error])
            .with_request_id(request_id));
    }

    let note = NewNote {
        owner_id: owner_id.to_string(),
        book_id,
        content: req.content,
        page: req.page,
        note_type: req.note_type,
    };

    let row = state
        .db()
        .note_store()
        .create(note)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, request_id = %request_id, book_id = %book_id, "Failed to create note");
            ApiError::internal("internal_error", "Failed to create note")
                .with_request_id(request_id.clone())
        })?
        .ok_or_else(|| {
            ApiError::not_found("book_not_found", format!("Book {book_id} not found"))
                .with_request_id(request_id.clone())
        })?;

    tracing::info!(request_id = %request_id, note_id = %row.note_id, book_id = %book_id, "Note created");

    Ok((StatusCode::CREATED, Json(NoteResponse::from(row))))
}

/// Get a single note.
///
/// GET /v1/notes/{note_id}
async fn get_note(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(note_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = ctx.request_id.clone();
    let owner_id = authz::require_owner(&ctx)?;
    let note_id = parse_note_id(&note_id, &request_id)?;

    let row = state
        .db()
        .note_store()
        .get(owner_id, &note_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, request_id = %request_id, note_id = %note_id, "Failed to get note");
            ApiError::internal("internal_error", "Failed to get note")
                .with_request_id(request_id.clone())
        })?
        .ok_or_else(|| note_not_found(&note_id, &request_id))?;

    Ok(Json(NoteResponse::from(row)))
}

/// Edit a note's content, page or type.
///
/// PATCH /v1/notes/{note_id}
async fn update_note(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(note_id): Path<String>,
    Json(req): Json<UpdateNoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = ctx.request_id.clone();
    let owner_id = authz::require_owner(&ctx)?;
    let note_id = parse_note_id(&note_id, &request_id)?;

    if let Some(error) = req.content.as_deref().and_then(content_error) {
        return Err(ApiError::bad_request("validation_failed", "Invalid note update")
            .with_details(vec![error])
            .with_request_id(request_id));
    }

    let patch = NotePatch {
        content: req.content,
        page: req.page,
        note_type: req.note_type,
    };

    let row = state
        .db()
        .note_store()
        .update(owner_id, &note_id, patch)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, request_id = %request_id, note_id = %note_id, "Failed to update note");
            ApiError::internal("internal_error", "Failed to update note")
                .with_request_id(request_id.clone())
        })?
        .ok_or_else(|| note_not_found(&note_id, &request_id))?;

    Ok(Json(NoteResponse::from(row)))
}

/// Delete a note, ending its flashcard schedule with it.
///
/// DELETE /v1/notes/{note_id}
async fn delete_note(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(note_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = ctx.request_id.clone();
    let owner_id = authz::require_owner(&ctx)?;
    let note_id = parse_note_id(&note_id, &request_id)?;

    let deleted = state
        .db()
        .note_store()
        .delete(owner_id, &note_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, request_id = %request_id, note_id = %note_id, "Failed to delete note");
            ApiError::internal("internal_error", "Failed to delete note")
                .with_request_id(request_id.clone())
        })?;

    if !deleted {
        return Err(note_not_found(&note_id, &request_id));
    }

    Ok(Json(DeleteResponse { ok: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_note_request_defaults() {
        let req: CreateNoteRequest = serde_json::from_str(
            r#"{"book_id": "book_01HV4Z2WQXKJNM8GPQY6VBKC3D", "content": "Fear is the mind-killer"}"#,
        )
        .unwrap();
        assert_eq!(req.note_type, NoteType::Note);
        assert_eq!(req.page, 0);
    }

    #[test]
    fn test_create_note_request_type_field() {
        let req: CreateNoteRequest = serde_json::from_str(
            r#"{"book_id": "book_01HV4Z2WQXKJNM8GPQY6VBKC3D", "content": "x", "type": "highlight"}"#,
        )
        .unwrap();
        assert_eq!(req.note_type, NoteType::Highlight);
    }

    #[test]
    fn test_update_note_ignores_schedule_fields() {
        let req: UpdateNoteRequest =
            serde_json::from_str(r#"{"page": 12, "ease": 1.3, "is_flashcard": true}"#).unwrap();
        assert_eq!(req.page, Some(12));
        assert!(req.content.is_none());
    }

    #[test]
    fn test_blank_content_rejected() {
        assert!(content_error("  \n").is_some());
        assert!(content_error("spice").is_none());
    }

    #[test]
    fn test_parse_note_id_rejects_book_id() {
        let err = parse_note_id(&BookId::new().to_string(), "req_1").unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.problem.code, "invalid_note_id");
    }
}
