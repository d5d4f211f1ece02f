//! API v1 routes.

mod books;
mod flashcards;
mod notes;

use axum::Router;

use crate::state::AppState;

/// Create API v1 routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/books", books::routes())
        // Flashcard routes share the /notes prefix with note CRUD.
        .nest("/notes", notes::routes().merge(flashcards::routes()))
}
