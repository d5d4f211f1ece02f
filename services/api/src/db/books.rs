//! Book catalog storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgPool, postgres::PgRow, Row};
use tramdoc_id::BookId;

use super::{contains_pattern, DbError};

const BOOK_COLUMNS: &str = r#"
    book_id, owner_id, google_id, isbn, title, authors, publisher,
    publish_date, description, cover_url, page_count, status, progress,
    location, rating, start_date, finish_date, created_at, updated_at
"#;

/// Reading status of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    #[default]
    WantToRead,
    Reading,
    Read,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WantToRead => "want_to_read",
            Self::Reading => "reading",
            Self::Read => "read",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "want_to_read" => Some(Self::WantToRead),
            "reading" => Some(Self::Reading),
            "read" => Some(Self::Read),
            _ => None,
        }
    }
}

/// Row from the books table.
#[derive(Debug, Clone)]
pub struct BookRow {
    pub book_id: String,
    pub owner_id: String,
    pub google_id: String,
    pub isbn: String,
    pub title: String,
    pub authors: String,
    pub publisher: String,
    pub publish_date: String,
    pub description: String,
    pub cover_url: String,
    pub page_count: i32,
    pub status: BookStatus,
    pub progress: i32,
    pub location: String,
    pub rating: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub finish_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for BookRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        let status = BookStatus::parse(&status).ok_or_else(|| sqlx::Error::ColumnDecode {
            index: "status".to_string(),
            source: format!("unknown book status '{status}'").into(),
        })?;

        Ok(Self {
            book_id: row.try_get("book_id")?,
            owner_id: row.try_get("owner_id")?,
            google_id: row.try_get("google_id")?,
            isbn: row.try_get("isbn")?,
            title: row.try_get("title")?,
            authors: row.try_get("authors")?,
            publisher: row.try_get("publisher")?,
            publish_date: row.try_get("publish_date")?,
            description: row.try_get("description")?,
            cover_url: row.try_get("cover_url")?,
            page_count: row.try_get("page_count")?,
            status,
            progress: row.try_get("progress")?,
            location: row.try_get("location")?,
            rating: row.try_get("rating")?,
            start_date: row.try_get("start_date")?,
            finish_date: row.try_get("finish_date")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Input for adding a book to a library.
#[derive(Debug, Clone, Default)]
pub struct NewBook {
    pub owner_id: String,
    pub google_id: String,
    pub isbn: String,
    pub title: String,
    pub authors: String,
    pub publisher: String,
    pub publish_date: String,
    pub description: String,
    pub cover_url: String,
    pub page_count: i32,
    pub status: BookStatus,
    pub location: String,
}

/// Partial update of a book; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct BookPatch {
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

/// Store for the books table.
#[derive(Clone)]
pub struct BookStore {
    pool: PgPool,
}

impl BookStore {
    /// Create a new book store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List an owner's books, newest first.
    pub async fn list(
        &self,
        owner_id: &str,
        status: Option<BookStatus>,
        search: Option<&str>,
    ) -> Result<Vec<BookRow>, DbError> {
        let sql = format!(
            r#"
            SELECT {BOOK_COLUMNS}
            FROM books
            WHERE owner_id = $1
              AND ($2::TEXT IS NULL OR status = $2)
              AND ($3::TEXT IS NULL OR title ILIKE $3 OR authors ILIKE $3)
            ORDER BY created_at DESC, book_id DESC
            "#
        );

        sqlx::query_as::<_, BookRow>(&sql)
            .bind(owner_id)
            .bind(status.map(|s| s.as_str()))
            .bind(search.map(contains_pattern))
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::Query)
    }

    /// Fetch a book if it belongs to `owner_id`.
    pub async fn get(&self, owner_id: &str, book_id: &BookId) -> Result<Option<BookRow>, DbError> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE book_id = $1 AND owner_id = $2");

        sqlx::query_as::<_, BookRow>(&sql)
            .bind(book_id.to_string())
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::Query)
    }

    /// Add a book, rejecting a second copy with the same ISBN or Google id.
    ///
    /// Duplicates are caught by the partial unique indexes on `books`, so two
    /// concurrent inserts of the same edition cannot both succeed.
    pub async fn create(&self, book: NewBook) -> Result<BookRow, DbError> {
        let book_id = BookId::new();
        let sql = format!(
            r#"
            INSERT INTO books (
                book_id, owner_id, google_id, isbn, title, authors, publisher,
                publish_date, description, cover_url, page_count, status, location
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {BOOK_COLUMNS}
            "#
        );

        sqlx::query_as::<_, BookRow>(&sql)
            .bind(book_id.to_string())
            .bind(&book.owner_id)
            .bind(&book.google_id)
            .bind(&book.isbn)
            .bind(&book.title)
            .bind(&book.authors)
            .bind(&book.publisher)
            .bind(&book.publish_date)
            .bind(&book.description)
            .bind(&book.cover_url)
            .bind(book.page_count)
            .bind(book.status.as_str())
            .bind(&book.location)
            .fetch_one(&self.pool)
            .await
            .map_err(insert_error)
    }

    /// Apply a partial update. Returns `None` if the book is not owned by `owner_id`.
    pub async fn update(
        &self,
        owner_id: &str,
        book_id: &BookId,
        patch: BookPatch,
    ) -> Result<Option<BookRow>, DbError> {
        let sql = format!(
            r#"
            UPDATE books SET
                title        = COALESCE($3, title),
                authors      = COALESCE($4, authors),
                publisher    = COALESCE($5, publisher),
                publish_date = COALESCE($6, publish_date),
                description  = COALESCE($7, description),
                cover_url    = COALESCE($8, cover_url),
                page_count   = COALESCE($9, page_count),
                status       = COALESCE($10, status),
                progress     = COALESCE($11, progress),
                location     = COALESCE($12, location),
                rating       = COALESCE($13, rating),
                start_date   = COALESCE($14, start_date),
                finish_date  = COALESCE($15, finish_date),
                updated_at   = now()
            WHERE book_id = $1 AND owner_id = $2
            RETURNING {BOOK_COLUMNS}
            "#
        );

        sqlx::query_as::<_, BookRow>(&sql)
            .bind(book_id.to_string())
            .bind(owner_id)
            .bind(patch.title)
            .bind(patch.authors)
            .bind(patch.publisher)
            .bind(patch.publish_date)
            .bind(patch.description)
            .bind(patch.cover_url)
            .bind(patch.page_count)
            .bind(patch.status.map(|s| s.as_str()))
            .bind(patch.progress)
            .bind(patch.location)
            .bind(patch.rating)
            .bind(patch.start_date)
            .bind(patch.finish_date)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::Query)
    }

    /// Delete a book and, through the foreign key, its notes.
    pub async fn delete(&self, owner_id: &str, book_id: &BookId) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM books WHERE book_id = $1 AND owner_id = $2")
            .bind(book_id.to_string())
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(DbError::Query)?;

        Ok(result.rows_affected() > 0)
    }
}

fn insert_error(error: sqlx::Error) -> DbError {
    match error {
        sqlx::Error::Database(ref e) if e.is_unique_violation() => DbError::DuplicateBook,
        e => DbError::Query(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_status_labels_roundtrip() {
        for status in [BookStatus::WantToRead, BookStatus::Reading, BookStatus::Read] {
            assert_eq!(BookStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BookStatus::parse("abandoned"), None);
    }

    #[test]
    fn test_other_insert_errors_stay_query_errors() {
        assert!(matches!(
            insert_error(sqlx::Error::RowNotFound),
            DbError::Query(sqlx::Error::RowNotFound)
        ));
    }

    #[test]
    fn test_book_status_serde_matches_column_labels() {
        let json = serde_json::to_string(&BookStatus::WantToRead).unwrap();
        assert_eq!(json, "\"want_to_read\"");
    }
}
