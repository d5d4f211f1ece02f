//! Note storage.
//!
//! Notes carry the spaced-repetition fields (`is_flashcard`, `review_count`,
//! `ease`, `interval`, `next_review`). Those columns are only written by
//! [`NoteStore::promote`] and [`NoteStore::review`]; ordinary note updates
//! never touch them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgPool, postgres::PgRow, Row};
use tracing::debug;
use tramdoc_id::{BookId, NoteId};
use tramdoc_srs::{FlashcardState, Quality, ReviewOutcome};

use super::{contains_pattern, DbError};

const NOTE_COLUMNS: &str = r#"
    n.note_id, n.owner_id, n.book_id, b.title AS book_title, n.content,
    n.page, n.note_type, n.is_flashcard, n.review_count, n.ease,
    n."interval", n.next_review, n.created_at, n.updated_at
"#;

/// Kind of note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteType {
    #[default]
    Note,
    Highlight,
    Quote,
    Takeaway,
}

impl NoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Highlight => "highlight",
            Self::Quote => "quote",
            Self::Takeaway => "takeaway",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "note" => Some(Self::Note),
            "highlight" => Some(Self::Highlight),
            "quote" => Some(Self::Quote),
            "takeaway" => Some(Self::Takeaway),
            _ => None,
        }
    }
}

/// Row from the notes table joined with its book title.
#[derive(Debug, Clone)]
pub struct NoteRow {
    pub note_id: String,
    pub owner_id: String,
    pub book_id: String,
    pub book_title: String,
    pub content: String,
    pub page: i32,
    pub note_type: NoteType,
    pub flashcard: FlashcardState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for NoteRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let note_type: String = row.try_get("note_type")?;
        let note_type = NoteType::parse(&note_type).ok_or_else(|| sqlx::Error::ColumnDecode {
            index: "note_type".to_string(),
            source: format!("unknown note type '{note_type}'").into(),
        })?;

        Ok(Self {
            note_id: row.try_get("note_id")?,
            owner_id: row.try_get("owner_id")?,
            book_id: row.try_get("book_id")?,
            book_title: row.try_get("book_title")?,
            content: row.try_get("content")?,
            page: row.try_get("page")?,
            note_type,
            flashcard: FlashcardState {
                is_flashcard: row.try_get("is_flashcard")?,
                review_count: row.try_get("review_count")?,
                ease: row.try_get("ease")?,
                interval: row.try_get("interval")?,
                next_review: row.try_get("next_review")?,
            },
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Filters for listing notes.
#[derive(Debug, Clone, Default)]
pub struct NoteFilter {
    pub book_id: Option<BookId>,
    pub note_type: Option<NoteType>,
    pub search: Option<String>,
}

/// Input for creating a note.
#[derive(Debug, Clone)]
pub struct NewNote {
    pub owner_id: String,
    pub book_id: BookId,
    pub content: String,
    pub page: i32,
    pub note_type: NoteType,
}

/// Partial update of a note's content fields.
#[derive(Debug, Clone, Default)]
pub struct NotePatch {
    pub content: Option<String>,
    pub page: Option<i32>,
    pub note_type: Option<NoteType>,
}

/// Store for the notes table.
#[derive(Clone)]
pub struct NoteStore {
    pool: PgPool,
}

impl NoteStore {
    /// Create a new note store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List an owner's notes, newest first.
    pub async fn list(&self, owner_id: &str, filter: &NoteFilter) -> Result<Vec<NoteRow>, DbError> {
        let sql = format!(
            r#"
            SELECT {NOTE_COLUMNS}
            FROM notes n
            JOIN books b ON b.book_id = n.book_id
            WHERE n.owner_id = $1
              AND ($2::TEXT IS NULL OR n.book_id = $2)
              AND ($3::TEXT IS NULL OR n.note_type = $3)
              AND ($4::TEXT IS NULL OR n.content ILIKE $4)
            ORDER BY n.created_at DESC, n.note_id DESC
            "#
        );

        sqlx::query_as::<_, NoteRow>(&sql)
            .bind(owner_id)
            .bind(filter.book_id.map(|id| id.to_string()))
            .bind(filter.note_type.map(|t| t.as_str()))
            .bind(filter.search.as_deref().map(contains_pattern))
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::Query)
    }

    /// Fetch a note if it belongs to `owner_id`.
    pub async fn get(&self, owner_id: &str, note_id: &NoteId) -> Result<Option<NoteRow>, DbError> {
        let sql = format!(
            r#"
            SELECT {NOTE_COLUMNS}
            FROM notes n
            JOIN books b ON b.book_id = n.book_id
            WHERE n.note_id = $1 AND n.owner_id = $2
            "#
        );

        sqlx::query_as::<_, NoteRow>(&sql)
            .bind(note_id.to_string())
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::Query)
    }

    /// Insert a note. Returns `None` if the book is not owned by the note's owner.
    pub async fn create(&self, note: NewNote) -> Result<Option<NoteRow>, DbError> {
        let note_id = NoteId::new();

        let inserted = sqlx::query(
            r#"
            INSERT INTO notes (note_id, owner_id, book_id, content, page, note_type)
            SELECT $1, $2, b.book_id, $4, $5, $6
            FROM books b
            WHERE b.book_id = $3 AND b.owner_id = $2
            "#,
        )
        .bind(note_id.to_string())
        .bind(&note.owner_id)
        .bind(note.book_id.to_string())
        .bind(&note.content)
        .bind(note.page)
        .bind(note.note_type.as_str())
        .execute(&self.pool)
        .await
        .map_err(DbError::Query)?;

        if inserted.rows_affected() == 0 {
            return Ok(None);
        }

        self.get(&note.owner_id, &note_id).await
    }

    /// Apply a partial update. Returns `None` if the note is not owned by `owner_id`.
    pub async fn update(
        &self,
        owner_id: &str,
        note_id: &NoteId,
        patch: NotePatch,
    ) -> Result<Option<NoteRow>, DbError> {
        let updated = sqlx::query(
            r#"
            UPDATE notes SET
                content    = COALESCE($3, content),
                page       = COALESCE($4, page),
                note_type  = COALESCE($5, note_type),
                updated_at = now()
            WHERE note_id = $1 AND owner_id = $2
            "#,
        )
        .bind(note_id.to_string())
        .bind(owner_id)
        .bind(patch.content)
        .bind(patch.page)
        .bind(patch.note_type.map(|t| t.as_str()))
        .execute(&self.pool)
        .await
        .map_err(DbError::Query)?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }

        self.get(owner_id, note_id).await
    }

    /// Delete a note owned by `owner_id`.
    pub async fn delete(&self, owner_id: &str, note_id: &NoteId) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM notes WHERE note_id = $1 AND owner_id = $2")
            .bind(note_id.to_string())
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(DbError::Query)?;

        Ok(result.rows_affected() > 0)
    }

    /// Promote a note to a flashcard, resetting its schedule.
    ///
    /// Returns the stored state, or `None` if the note is not owned by `owner_id`.
    pub async fn promote(
        &self,
        owner_id: &str,
        note_id: &NoteId,
        now: DateTime<Utc>,
    ) -> Result<Option<FlashcardState>, DbError> {
        let state = FlashcardState::promote(now);

        let updated = sqlx::query(
            r#"
            UPDATE notes SET
                is_flashcard = $3,
                review_count = $4,
                ease         = $5,
                "interval"   = $6,
                next_review  = $7,
                updated_at   = now()
            WHERE note_id = $1 AND owner_id = $2
            "#,
        )
        .bind(note_id.to_string())
        .bind(owner_id)
        .bind(state.is_flashcard)
        .bind(state.review_count)
        .bind(state.ease)
        .bind(state.interval)
        .bind(state.next_review)
        .execute(&self.pool)
        .await
        .map_err(DbError::Query)?;

        Ok((updated.rows_affected() > 0).then_some(state))
    }

    /// Flashcards due at `now`, earliest first; ties keep insertion order.
    pub async fn due(&self, owner_id: &str, now: DateTime<Utc>) -> Result<Vec<NoteRow>, DbError> {
        let sql = format!(
            r#"
            SELECT {NOTE_COLUMNS}
            FROM notes n
            JOIN books b ON b.book_id = n.book_id
            WHERE n.owner_id = $1
              AND n.is_flashcard
              AND n.next_review <= $2
            ORDER BY n.next_review ASC, n.created_at ASC, n.note_id ASC
            "#
        );

        sqlx::query_as::<_, NoteRow>(&sql)
            .bind(owner_id)
            .bind(now)
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::Query)
    }

    /// Record a review and reschedule the flashcard.
    ///
    /// The row is locked for the duration of the transaction so concurrent
    /// reviews of the same card serialize; the new schedule is written with a
    /// single `UPDATE`. Any error rolls the transaction back and leaves the
    /// stored state untouched.
    pub async fn review(
        &self,
        owner_id: &str,
        note_id: &NoteId,
        quality: Quality,
        now: DateTime<Utc>,
    ) -> Result<ReviewOutcome, DbError> {
        let mut tx = self.pool.begin().await.map_err(DbError::Query)?;

        let row = sqlx::query(
            r#"
            SELECT is_flashcard, review_count, ease, "interval", next_review
            FROM notes
            WHERE note_id = $1 AND owner_id = $2 AND is_flashcard
            FOR UPDATE
            "#,
        )
        .bind(note_id.to_string())
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(DbError::Query)?
        .ok_or(DbError::FlashcardNotFound(*note_id))?;

        let mut state = FlashcardState {
            is_flashcard: row.try_get("is_flashcard").map_err(DbError::Query)?,
            review_count: row.try_get("review_count").map_err(DbError::Query)?,
            ease: row.try_get("ease").map_err(DbError::Query)?,
            interval: row.try_get("interval").map_err(DbError::Query)?,
            next_review: row.try_get("next_review").map_err(DbError::Query)?,
        };

        let outcome = state.review(quality, now)?;
        state.apply(&outcome);

        sqlx::query(
            r#"
            UPDATE notes SET
                review_count = $2,
                ease         = $3,
                "interval"   = $4,
                next_review  = $5,
                updated_at   = now()
            WHERE note_id = $1
            "#,
        )
        .bind(note_id.to_string())
        .bind(state.review_count)
        .bind(state.ease)
        .bind(state.interval)
        .bind(state.next_review)
        .execute(&mut *tx)
        .await
        .map_err(DbError::Query)?;

        tx.commit().await.map_err(DbError::Query)?;

        debug!(
            note_id = %note_id,
            quality = %quality,
            interval = outcome.interval,
            review_count = outcome.review_count,
            "Flashcard rescheduled"
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_type_labels_roundtrip() {
        for t in [
            NoteType::Note,
            NoteType::Highlight,
            NoteType::Quote,
            NoteType::Takeaway,
        ] {
            assert_eq!(NoteType::parse(t.as_str()), Some(t));
        }
        assert_eq!(NoteType::parse("bookmark"), None);
    }

    #[test]
    fn test_note_type_default() {
        assert_eq!(NoteType::default(), NoteType::Note);
    }
}
