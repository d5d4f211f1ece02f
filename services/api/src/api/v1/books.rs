//! Book catalog endpoints.
//!
//! Books are owner scoped: every query filters by the caller's owner id, so a
//! book owned by someone else is indistinguishable from a missing one.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tramdoc_id::BookId;

use crate::api::authz;
use crate::api::error::{ApiError, FieldError};
use crate::api::request_context::RequestContext;
use crate::db::{BookPatch, BookRow, BookStatus, DbError, NewBook};
use crate::state::AppState;

/// Book routes.
///
/// /v1/books
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route(
            "/{book_id}",
            get(get_book).patch(update_book).delete(delete_book),
        )
}

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ListBooksQuery {
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBookRequest {
    pub title: String,
    #[serde(default)]
    pub google_id: String,
    #[serde(default)]
    pub isbn: String,
    #[serde(default)]
    pub authors: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub publish_date: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cover_url: String,
    #[serde(default)]
    pub page_count: i32,
    #[serde(default)]
    pub status: BookStatus,
    #[serde(default)]
    pub location: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    pub authors: Option<String>,
    pub publisher: Option<String>,
    pub publish_date: Option<String>,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub page_count: Option<i32>,
    pub status: Option<BookStatus>,
    pub progress: Option<i32>,
    pub location: Option<String>,
    pub rating: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub finish_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct BookResponse {
    pub id: String,
    pub title: String,
    pub google_id: String,
    pub isbn: String,
    pub authors: String,
    pub publisher: String,
    pub publish_date: String,
    pub description: String,
    pub cover_url: String,
    pub page_count: i32,
    pub status: BookStatus,
    pub progress: i32,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ListBooksResponse {
    pub items: Vec<BookResponse>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub ok: bool,
}

impl From<BookRow> for BookResponse {
    fn from(row: BookRow) -> Self {
        Self {
            id: row.book_id,
            title: row.title,
            google_id: row.google_id,
            isbn: row.isbn,
            authors: row.authors,
            publisher: row.publisher,
            publish_date: row.publish_date,
            description: row.description,
            cover_url: row.cover_url,
            page_count: row.page_count,
            status: row.status,
            progress: row.progress,
            location: row.location,
            rating: row.rating,
            start_date: row.start_date,
            finish_date: row.finish_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl CreateBookRequest {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push(FieldError::new("title", "title cannot be empty"));
        }
        if self.page_count < 0 {
            errors.push(FieldError::new("page_count", "page_count cannot be negative"));
        }
        errors
    }
}

impl UpdateBookRequest {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            errors.push(FieldError::new("title", "title cannot be empty"));
        }
        if self.page_count.is_some_and(|p| p < 0) {
            errors.push(FieldError::new("page_count", "page_count cannot be negative"));
        }
        if self.progress.is_some_and(|p| !(0..=100).contains(&p)) {
            errors.push(FieldError::new("progress", "progress must be between 0 and 100"));
        }
        if self.rating.is_some_and(|r| !(0..=5).contains(&r)) {
            errors.push(FieldError::new("rating", "rating must be between 0 and 5"));
        }
        errors
    }
}

impl From<UpdateBookRequest> for BookPatch {
    fn from(req: UpdateBookRequest) -> Self {
        Self {
            title: req.title.map(|t| t.trim().to_string()),
            authors: req.authors,
            publisher: req.publisher,
            publish_date: req.publish_date,
            description: req.description,
            cover_url: req.cover_url,
            page_count: req.page_count,
            status: req.status,
            progress: req.progress,
            location: req.location,
            rating: req.rating,
            start_date: req.start_date,
            finish_date: req.finish_date,
        }
    }
}

fn parse_book_id(raw: &str, request_id: &str) -> Result<BookId, ApiError> {
    raw.parse().map_err(|_| {
        ApiError::bad_request("invalid_book_id", "Invalid book ID format")
            .with_request_id(request_id.to_string())
    })
}

fn book_not_found(book_id: &BookId, request_id: &str) -> ApiError {
    ApiError::not_found("book_not_found", format!("Book {book_id} not found"))
        .with_request_id(request_id.to_string())
}

// =============================================================================
// Handlers
// =============================================================================

/// List the caller's books, newest first.
///
/// GET /v1/books
async fn list_books(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<ListBooksQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = ctx.request_id.clone();
    let owner_id = authz::require_owner(&ctx)?;

    let status = match query.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(BookStatus::parse(raw).ok_or_else(|| {
            ApiError::bad_request(
                "invalid_status",
                "status must be one of want_to_read, reading, read",
            )
            .with_request_id(request_id.clone())
        })?),
        None => None,
    };
    let search = query.search.as_deref().filter(|s| !s.is_empty());

    let rows = state
        .db()
        .book_store()
        .list(owner_id, status, search)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, request_id = %request_id, "Failed to list books");
            ApiError::internal("internal_error", "Failed to list books")
                .with_request_id(request_id.clone())
        })?;

    let items: Vec<BookResponse> = rows.into_iter().map(BookResponse::from).collect();
    let count = items.len();

    Ok(Json(ListBooksResponse { items, count }))
}

/// Add a book to the caller's library.
///
/// POST /v1/books
async fn create_book(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(req): Json<CreateBookRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = ctx.request_id.clone();
    let owner_id = authz::require_owner(&ctx)?;

    let errors = req.validate();
    if !errors.is_empty() {
        return Err(ApiError::bad_request("validation_failed", "Invalid book")
            .with_details(errors)
            .with_request_id(request_id));
    }

    let book = NewBook {
        owner_id: owner_id.to_string(),
        google_id: req.google_id.trim().to_string(),
        isbn: req.isbn.trim().to_string(),
        title: req.title.trim().to_string(),
        authors: req.authors,
        publisher: req.publisher,
        publish_date: req.publish_date,
        description: req.description,
        cover_url: req.cover_url,
        page_count: req.page_count,
        status: req.status,
        location: req.location,
    };

    let row = state
        .db()
        .book_store()
        .create(book)
        .await
        .map_err(|e| match e {
            DbError::DuplicateBook => {
                ApiError::conflict("book_exists", "Book already exists in your library")
                    .with_request_id(request_id.clone())
            }
            e => {
                tracing::error!(error = %e, request_id = %request_id, "Failed to create book");
                ApiError::internal("internal_error", "Failed to create book")
                    .with_request_id(request_id.clone())
            }
        })?;

    tracing::info!(request_id = %request_id, book_id = %row.book_id, "Book added");

    Ok((StatusCode::CREATED, Json(BookResponse::from(row))))
}

/// Get a single book.
///
/// GET /v1/books/{book_id}
async fn get_book(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(book_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = ctx.request_id.clone();
    let owner_id = authz::require_owner(&ctx)?;
    let book_id = parse_book_id(&book_id, &request_id)?;

    let row = state
        .db()
        .book_store()
        .get(owner_id, &book_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, request_id = %request_id, book_id = %book_id, "Failed to get book");
            ApiError::internal("internal_error", "Failed to get book")
                .with_request_id(request_id.clone())
        })?
        .ok_or_else(|| book_not_found(&book_id, &request_id))?;

    Ok(Json(BookResponse::from(row)))
}

/// Update reading status, progress, rating or descriptive fields.
///
/// PATCH /v1/books/{book_id}
async fn update_book(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(book_id): Path<String>,
    Json(req): Json<UpdateBookRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = ctx.request_id.clone();
    let owner_id = authz::require_owner(&ctx)?;
    let book_id = parse_book_id(&book_id, &request_id)?;

    let errors = req.validate();
    if !errors.is_empty() {
        return Err(ApiError::bad_request("validation_failed", "Invalid book update")
            .with_details(errors)
            .with_request_id(request_id));
    }

    let row = state
        .db()
        .book_store()
        .update(owner_id, &book_id, BookPatch::from(req))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, request_id = %request_id, book_id = %book_id, "Failed to update book");
            ApiError::internal("internal_error", "Failed to update book")
                .with_request_id(request_id.clone())
        })?
        .ok_or_else(|| book_not_found(&book_id, &request_id))?;

    Ok(Json(BookResponse::from(row)))
}

/// Remove a book and its notes.
///
/// DELETE /v1/books/{book_id}
async fn delete_book(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(book_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = ctx.request_id.clone();
    let owner_id = authz::require_owner(&ctx)?;
    let book_id = parse_book_id(&book_id, &request_id)?;

    let deleted = state
        .db()
        .book_store()
        .delete(owner_id, &book_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, request_id = %request_id, book_id = %book_id, "Failed to delete book");
            ApiError::internal("internal_error", "Failed to delete book")
                .with_request_id(request_id.clone())
        })?;

    if !deleted {
        return Err(book_not_found(&book_id, &request_id));
    }

    tracing::info!(request_id = %request_id, book_id = %book_id, "Book deleted");

    Ok(Json(DeleteResponse { ok: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_book_request_defaults() {
        let req: CreateBookRequest = serde_json::from_str(r#"{"title": "Dune"}"#).unwrap();
        assert_eq!(req.title, "Dune");
        assert_eq!(req.status, BookStatus::WantToRead);
        assert_eq!(req.page_count, 0);
        assert!(req.validate().is_empty());
    }

    #[test]
    fn test_create_book_rejects_blank_title() {
        let req: CreateBookRequest = serde_json::from_str(r#"{"title": "   "}"#).unwrap();
        let errors = req.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "title");
    }

    #[test]
    fn test_update_book_validation() {
        let req: UpdateBookRequest =
            serde_json::from_str(r#"{"progress": 120, "rating": 6, "status": "reading"}"#).unwrap();
        let fields: Vec<_> = req.validate().into_iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["progress", "rating"]);
    }

    #[test]
    fn test_update_book_unknown_status_rejected() {
        let result = serde_json::from_str::<UpdateBookRequest>(r#"{"status": "abandoned"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_book_response_serialization() {
        let now = Utc::now();
        let response = BookResponse {
            id: "book_123".to_string(),
            title: "Dune".to_string(),
            google_id: String::new(),
            isbn: String::new(),
            authors: "Frank Herbert".to_string(),
            publisher: String::new(),
            publish_date: String::new(),
            description: String::new(),
            cover_url: String::new(),
            page_count: 412,
            status: BookStatus::Reading,
            progress: 10,
            location: String::new(),
            rating: None,
            start_date: None,
            finish_date: None,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "reading");
        assert!(json.get("rating").is_none());
    }
}
