//! Database error types.

use thiserror::Error;
use tramdoc_id::NoteId;
use tramdoc_srs::SrsError;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Failed to connect to the database.
    #[error("failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),

    /// Failed to execute a query.
    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),

    /// Failed to run migrations.
    #[error("migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),

    /// Migration directory not found in the current environment.
    #[error("migration directory not found; tried {tried}. Last error: {last_error}. Run from repo root or services/api.")]
    MigrationDirNotFound { tried: String, last_error: String },

    /// The owner already has a book with the same ISBN or Google id.
    #[error("book already exists in library")]
    DuplicateBook,

    /// No flashcard with this id is owned by the caller.
    #[error("flashcard not found: {0}")]
    FlashcardNotFound(NoteId),

    /// The scheduler rejected the review.
    #[error("scheduling failed: {0}")]
    Schedule(#[from] SrsError),
}
