//! Issue requests and issue registry

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{is_unique_violation, AppError, AppResult},
    models::{
        book::Book,
        issue::{IssueRegistry, IssueStatus, NewIssue},
        request::{RequestEvent, RequestType},
    },
};

use super::books::BooksRepository;

#[derive(Clone)]
pub struct IssuesRepository {
    pool: Pool<Postgres>,
}

impl IssuesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    // =========================================================================
    // REQUESTS
    // =========================================================================

    /// List requests, optionally only the pending ones
    pub async fn list_requests(&self, pending_only: bool) -> AppResult<Vec<RequestEvent>> {
        let requests = sqlx::query_as::<_, RequestEvent>(
            r#"
            SELECT * FROM request_events
            WHERE NOT $1 OR approval_date IS NULL
            ORDER BY request_date, id
            "#,
        )
        .bind(pending_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }

    /// Get request by ID
    pub async fn get_request(&self, id: i32) -> AppResult<RequestEvent> {
        sqlx::query_as::<_, RequestEvent>("SELECT * FROM request_events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Issue request not found".to_string()))
    }

    /// Check for a pending request of the given type from a reader for a book
    pub async fn has_pending_request(
        &self,
        reader_id: i32,
        isbn: &str,
        request_type: RequestType,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM request_events
                WHERE reader_id = $1 AND isbn = $2 AND request_type = $3
                  AND approval_date IS NULL
            )
            "#,
        )
        .bind(reader_id)
        .bind(isbn)
        .bind(request_type)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Record a new pending request
    pub async fn create_request(
        &self,
        reader_id: i32,
        isbn: &str,
        request_type: RequestType,
        now: i64,
    ) -> AppResult<RequestEvent> {
        sqlx::query_as::<_, RequestEvent>(
            r#"
            INSERT INTO request_events (isbn, reader_id, request_date, request_type)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(isbn)
        .bind(reader_id)
        .bind(now)
        .bind(request_type)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("You already have a pending request for this book".to_string())
            } else {
                e.into()
            }
        })
    }

    /// Approve a pending request, taking one copy of its book
    pub async fn approve_request(
        &self,
        id: i32,
        approver_id: i32,
        now: i64,
    ) -> AppResult<(RequestEvent, Book)> {
        let mut tx = self.pool.begin().await?;

        let request = sqlx::query_as::<_, RequestEvent>(
            "SELECT * FROM request_events WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Issue request not found".to_string()))?;

        request.ensure_pending()?;

        let book = take_copy_or_explain(&mut tx, &request.isbn).await?;

        let approved = sqlx::query_as::<_, RequestEvent>(
            r#"
            UPDATE request_events SET approval_date = $2, approver_id = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(now)
        .bind(approver_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((approved, book))
    }

    /// Delete a pending request
    pub async fn delete_pending_request(&self, id: i32) -> AppResult<()> {
        let request = self.get_request(id).await?;
        request.ensure_pending()?;

        let result = sqlx::query("DELETE FROM request_events WHERE id = $1 AND approval_date IS NULL")
            .bind(id)
            .execute(&self.pool)
            .await?;

        // approved between the read and the delete
        if result.rows_affected() == 0 {
            return Err(AppError::Conflict("Request is already approved".to_string()));
        }
        Ok(())
    }

    // =========================================================================
    // REGISTRY
    // =========================================================================

    /// List registry rows, optionally only loans not yet returned
    pub async fn list_registry(&self, active_only: bool) -> AppResult<Vec<IssueRegistry>> {
        let rows = sqlx::query_as::<_, IssueRegistry>(
            r#"
            SELECT * FROM issue_registry
            WHERE NOT $1 OR return_date = 0
            ORDER BY issue_date, id
            "#,
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Get registry row by ID
    pub async fn get_issue(&self, id: i32) -> AppResult<IssueRegistry> {
        sqlx::query_as::<_, IssueRegistry>("SELECT * FROM issue_registry WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Issue record not found".to_string()))
    }

    /// Issue a book straight to a reader, taking one copy
    pub async fn issue_direct(&self, issue: &NewIssue) -> AppResult<(IssueRegistry, Book)> {
        let mut tx = self.pool.begin().await?;

        if BooksRepository::find_on(&mut tx, &issue.isbn).await?.is_none() {
            return Err(AppError::NotFound("Book not found".to_string()));
        }

        let reader_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                .bind(issue.reader_id)
                .fetch_one(&mut *tx)
                .await?;
        if !reader_exists {
            return Err(AppError::NotFound(format!("User with id {} not found", issue.reader_id)));
        }

        let book = take_copy_or_explain(&mut tx, &issue.isbn).await?;

        let record = sqlx::query_as::<_, IssueRegistry>(
            r#"
            INSERT INTO issue_registry (
                isbn, reader_id, issue_approver_id, issue_status,
                issue_date, expected_return_date, return_date, return_approver_id
            ) VALUES ($1, $2, $3, $4, $5, $6, 0, 0)
            RETURNING *
            "#,
        )
        .bind(&issue.isbn)
        .bind(issue.reader_id)
        .bind(issue.issue_approver_id)
        .bind(IssueStatus::Issued)
        .bind(issue.issue_date)
        .bind(issue.expected_return_date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((record, book))
    }

    /// Close a loan and put the copy back on the shelf.
    ///
    /// The returned book is `None` when the catalog no longer holds the ISBN
    /// or its counter was already full.
    pub async fn return_issue(
        &self,
        id: i32,
        return_approver_id: i32,
        now: i64,
    ) -> AppResult<(IssueRegistry, Option<Book>)> {
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, IssueRegistry>(
            "SELECT * FROM issue_registry WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Issue record not found".to_string()))?;

        record.ensure_not_returned()?;

        let book = BooksRepository::restore_copy_on(&mut tx, &record.isbn).await?;

        let returned = sqlx::query_as::<_, IssueRegistry>(
            r#"
            UPDATE issue_registry SET
                issue_status = $2,
                return_date = $3,
                return_approver_id = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(IssueStatus::Returned)
        .bind(now)
        .bind(return_approver_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((returned, book))
    }
}

/// Take a copy, telling a missing book apart from an exhausted one
async fn take_copy_or_explain(conn: &mut PgConnection, isbn: &str) -> AppResult<Book> {
    if let Some(book) = BooksRepository::take_copy_on(conn, isbn).await? {
        return Ok(book);
    }
    match BooksRepository::find_on(conn, isbn).await? {
        Some(_) => Err(AppError::BadRequest("No available copies to issue".to_string())),
        None => Err(AppError::NotFound("Book not found".to_string())),
    }
}
