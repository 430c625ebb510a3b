//! Books repository for database operations

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{is_unique_violation, AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

/// Result of adding a book to the catalog
#[derive(Debug)]
pub enum AddOutcome {
    Created(Book),
    /// The ISBN was already held by the same library; copies were added to it
    CopiesAdded(Book),
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    // =========================================================================
    // READ
    // =========================================================================

    /// Get book by ISBN
    pub async fn get_by_isbn(&self, isbn: &str) -> AppResult<Book> {
        Self::find_on(&mut *self.pool.acquire().await?, isbn)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))
    }

    pub async fn find_on(conn: &mut PgConnection, isbn: &str) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE isbn = $1")
            .bind(isbn)
            .fetch_optional(conn)
            .await?;
        Ok(book)
    }

    /// Fetch and row-lock a book for the rest of the transaction
    pub async fn lock_on(conn: &mut PgConnection, isbn: &str) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE isbn = $1 FOR UPDATE")
            .bind(isbn)
            .fetch_optional(conn)
            .await?;
        Ok(book)
    }

    /// Search by case-insensitive substrings of title, authors and publisher
    pub async fn search(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        let filters = [
            ("title", &query.title),
            ("authors", &query.author),
            ("publisher", &query.publisher),
        ];
        for (column, value) in filters {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                params.push(format!("%{}%", escape_like(value)));
                conditions.push(format!("{} ILIKE ${}", column, params.len()));
            }
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let select_query = format!("SELECT * FROM books {} ORDER BY title, id", where_clause);
        let mut builder = sqlx::query_as::<_, Book>(&select_query);
        for param in &params {
            builder = builder.bind(param);
        }

        let books = builder.fetch_all(&self.pool).await?;
        Ok(books)
    }

    // =========================================================================
    // WRITE
    // =========================================================================

    /// Add a book, or add copies when the same library already holds the ISBN
    pub async fn add(&self, book: &CreateBook) -> AppResult<AddOutcome> {
        let mut tx = self.pool.begin().await?;

        let outcome = match Self::lock_on(&mut tx, &book.isbn).await? {
            Some(existing) if existing.library_id != book.library_id => {
                return Err(AppError::Conflict(format!(
                    "ISBN {} is already registered by library {}",
                    book.isbn, existing.library_id
                )));
            }
            Some(existing) => {
                let updated = sqlx::query_as::<_, Book>(
                    r#"
                    UPDATE books SET
                        total_copies = total_copies + $2,
                        available_copies = available_copies + $2,
                        updated_at = NOW()
                    WHERE id = $1
                    RETURNING *
                    "#,
                )
                .bind(existing.id)
                .bind(book.total_copies)
                .fetch_one(&mut *tx)
                .await?;
                AddOutcome::CopiesAdded(updated)
            }
            None => {
                let created = sqlx::query_as::<_, Book>(
                    r#"
                    INSERT INTO books (
                        isbn, title, authors, publisher, version,
                        total_copies, available_copies, library_id
                    ) VALUES ($1, $2, $3, $4, $5, $6, $6, $7)
                    RETURNING *
                    "#,
                )
                .bind(&book.isbn)
                .bind(&book.title)
                .bind(&book.authors)
                .bind(&book.publisher)
                .bind(&book.version)
                .bind(book.total_copies)
                .bind(book.library_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        AppError::Conflict(format!("ISBN {} already exists", book.isbn))
                    } else {
                        e.into()
                    }
                })?;
                AddOutcome::Created(created)
            }
        };

        tx.commit().await?;
        Ok(outcome)
    }

    /// Update a book; a new total shifts the available count by the same delta
    pub async fn update(&self, isbn: &str, update: &UpdateBook) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let current = Self::lock_on(&mut tx, isbn)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;

        let (total, available) = match update.total_copies {
            Some(total) => current.resized(total)?,
            None => (current.total_copies, current.available_copies),
        };

        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET
                title = COALESCE($2, title),
                authors = COALESCE($3, authors),
                publisher = COALESCE($4, publisher),
                version = COALESCE($5, version),
                total_copies = $6,
                available_copies = $7,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(current.id)
        .bind(&update.title)
        .bind(&update.authors)
        .bind(&update.publisher)
        .bind(&update.version)
        .bind(total)
        .bind(available)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Remove a book from the catalog
    pub async fn delete(&self, isbn: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE isbn = $1")
            .bind(isbn)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Book not found".to_string()));
        }
        Ok(())
    }

    // =========================================================================
    // COPY COUNTERS
    // =========================================================================

    /// Take one copy if any is left. `None` means nothing was available.
    pub async fn take_copy_on(conn: &mut PgConnection, isbn: &str) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET available_copies = available_copies - 1, updated_at = NOW()
            WHERE isbn = $1 AND available_copies > 0
            RETURNING *
            "#,
        )
        .bind(isbn)
        .fetch_optional(conn)
        .await?;
        Ok(book)
    }

    /// Put one copy back, never above the total. `None` means no row was changed.
    pub async fn restore_copy_on(conn: &mut PgConnection, isbn: &str) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET available_copies = available_copies + 1, updated_at = NOW()
            WHERE isbn = $1 AND available_copies < total_copies
            RETURNING *
            "#,
        )
        .bind(isbn)
        .fetch_optional(conn)
        .await?;
        Ok(book)
    }
}

/// Escape LIKE wildcards so user input only matches literally
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
