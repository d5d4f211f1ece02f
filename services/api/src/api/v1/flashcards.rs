//! Flashcard endpoints: promotion, due queue and reviews.
//!
//! Scheduling itself lives in `tramdoc-srs`; these handlers validate input,
//! resolve ownership and hand the state transition to the note store.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tramdoc_id::NoteId;
use tramdoc_srs::{Quality, ReviewOutcome, SrsError};

use super::notes::{note_not_found, parse_note_id, ListNotesResponse, NoteResponse};
use crate::api::authz;
use crate::api::error::ApiError;
use crate::api::request_context::RequestContext;
use crate::db::DbError;
use crate::state::AppState;

/// Flashcard routes, merged into /v1/notes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/flashcard", post(promote_note))
        .route("/review", get(list_due))
        .route("/{note_id}/review", post(review_flashcard))
}

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct PromoteRequest {
    pub note_id: String,
}

#[derive(Debug, Serialize)]
pub struct PromoteResponse {
    pub note_id: String,
    pub next_review: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    /// Self-assessed recall, 0-5. Decoded loosely so that any bad value is
    /// reported as `invalid_quality` rather than a body rejection.
    #[serde(default)]
    pub quality: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub note_id: String,
    #[serde(flatten)]
    pub outcome: ReviewOutcome,
}

// =============================================================================
// Handlers
// =============================================================================

/// Turn a note into a flashcard due tomorrow.
///
/// POST /v1/notes/flashcard
async fn promote_note(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(req): Json<PromoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = ctx.request_id.clone();
    let owner_id = authz::require_owner(&ctx)?;
    let note_id = parse_note_id(&req.note_id, &request_id)?;

    let promoted = state
        .db()
        .note_store()
        .promote(owner_id, &note_id, Utc::now())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, request_id = %request_id, note_id = %note_id, "Failed to create flashcard");
            ApiError::internal("internal_error", "Failed to create flashcard")
                .with_request_id(request_id.clone())
        })?
        .ok_or_else(|| note_not_found(&note_id, &request_id))?;

    let next_review = promoted.next_review.ok_or_else(|| {
        tracing::error!(request_id = %request_id, note_id = %note_id, "Promoted flashcard has no due date");
        ApiError::internal("internal_error", "Failed to create flashcard")
            .with_request_id(request_id.clone())
    })?;

    tracing::info!(request_id = %request_id, note_id = %note_id, next_review = %next_review, "Flashcard created");

    Ok(Json(PromoteResponse {
        note_id: note_id.to_string(),
        next_review,
    }))
}

/// Flashcards due now, earliest first.
///
/// GET /v1/notes/review
async fn list_due(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = ctx.request_id.clone();
    let owner_id = authz::require_owner(&ctx)?;

    let rows = state
        .db()
        .note_store()
        .due(owner_id, Utc::now())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, request_id = %request_id, "Failed to fetch review notes");
            ApiError::internal("internal_error", "Failed to fetch review notes")
                .with_request_id(request_id.clone())
        })?;

    let items: Vec<NoteResponse> = rows.into_iter().map(NoteResponse::from).collect();
    let count = items.len();

    Ok(Json(ListNotesResponse { items, count }))
}

/// Record a review and reschedule the card.
///
/// POST /v1/notes/{note_id}/review
async fn review_flashcard(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(note_id): Path<String>,
    body: Result<Json<ReviewRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = ctx.request_id.clone();
    let owner_id = authz::require_owner(&ctx)?;
    let note_id = parse_note_id(&note_id, &request_id)?;

    let quality = body
        .map_err(|e| e.body_text())
        .and_then(|Json(req)| parse_quality(&req.quality))
        .map_err(|detail| {
            ApiError::bad_request("invalid_quality", detail).with_request_id(request_id.clone())
        })?;

    let outcome = state
        .db()
        .note_store()
        .review(owner_id, &note_id, quality, Utc::now())
        .await
        .map_err(|e| review_error(e, &note_id, &request_id))?;

    tracing::info!(
        request_id = %request_id,
        note_id = %note_id,
        quality = %quality,
        interval = outcome.interval,
        "Review recorded"
    );

    Ok(Json(ReviewResponse {
        note_id: note_id.to_string(),
        outcome,
    }))
}

fn parse_quality(value: &serde_json::Value) -> Result<Quality, String> {
    let raw = value
        .as_i64()
        .ok_or_else(|| format!("quality must be an integer between 0 and {}", Quality::MAX))?;
    Quality::new(raw).map_err(|e| e.to_string())
}

fn review_error(error: DbError, note_id: &NoteId, request_id: &str) -> ApiError {
    match error {
        DbError::FlashcardNotFound(_) | DbError::Schedule(SrsError::NotAFlashcard) => {
            ApiError::not_found("flashcard_not_found", format!("Flashcard {note_id} not found"))
                .with_request_id(request_id.to_string())
        }
        e => {
            tracing::error!(error = %e, request_id = %request_id, note_id = %note_id, "Failed to update flashcard");
            ApiError::internal("internal_error", "Failed to update flashcard")
                .with_request_id(request_id.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_parse_quality_accepts_scale() {
        for value in 0..=5 {
            let quality = parse_quality(&serde_json::json!(value)).unwrap();
            assert_eq!(i64::from(quality.value()), value);
        }
    }

    #[test]
    fn test_parse_quality_rejects_non_integers() {
        for body in [
            r#"{"quality": 6}"#,
            r#"{"quality": -1}"#,
            r#"{"quality": 4.5}"#,
            r#"{"quality": 99999999999999999999}"#,
            r#"{"quality": "4"}"#,
            r#"{}"#,
        ] {
            let req: ReviewRequest = serde_json::from_str(body).unwrap();
            assert!(parse_quality(&req.quality).is_err(), "{body} accepted");
        }
    }

    #[test]
    fn test_review_response_is_flat() {
        let response = ReviewResponse {
            note_id: "note_1".to_string(),
            outcome: ReviewOutcome {
                next_review: Utc::now(),
                interval: 15,
                ease: 2.5,
                review_count: 3,
            },
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["note_id"], "note_1");
        assert_eq!(json["interval"], 15);
        assert_eq!(json["ease"], 2.5);
        assert_eq!(json["review_count"], 3);
        assert!(json["next_review"].is_string());
    }

    #[test]
    fn test_missing_flashcard_maps_to_404() {
        let note_id = NoteId::new();
        let err = review_error(DbError::FlashcardNotFound(note_id), &note_id, "req_1");
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.problem.code, "flashcard_not_found");
    }

    #[test]
    fn test_overflow_maps_to_500() {
        let note_id = NoteId::new();
        let err = review_error(
            DbError::Schedule(SrsError::ScheduleOverflow { interval_days: 1e12 }),
            &note_id,
            "req_1",
        );
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
