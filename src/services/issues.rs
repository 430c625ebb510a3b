//! Book issue workflow: requests, approvals, direct issues and returns

use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    models::{
        issue::{IssueRegistry, NewIssue},
        request::{RequestEvent, RequestType},
        user::Identity,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct IssuesService {
    repository: Repository,
}

impl IssuesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// File a pending issue request for the calling reader
    pub async fn request_issue(&self, reader: Identity, isbn: &str) -> AppResult<RequestEvent> {
        let book = self.repository.books.get_by_isbn(isbn).await?;
        if !book.is_available() {
            return Err(AppError::BadRequest("Book not available for issue".to_string()));
        }

        if self
            .repository
            .issues
            .has_pending_request(reader.user_id, isbn, RequestType::Issue)
            .await?
        {
            return Err(AppError::Conflict(
                "You already have a pending request for this book".to_string(),
            ));
        }

        let request = self
            .repository
            .issues
            .create_request(reader.user_id, isbn, RequestType::Issue, Utc::now().timestamp())
            .await?;

        tracing::info!(request_id = request.id, reader_id = reader.user_id, isbn = %isbn, "Issue requested");
        Ok(request)
    }

    pub async fn list_requests(&self, pending_only: bool) -> AppResult<Vec<RequestEvent>> {
        self.repository.issues.list_requests(pending_only).await
    }

    pub async fn get_request(&self, id: i32) -> AppResult<RequestEvent> {
        self.repository.issues.get_request(id).await
    }

    /// Approve a pending request and take one copy off the shelf
    pub async fn approve(&self, id: i32, approver: Identity) -> AppResult<RequestEvent> {
        let (request, book) = self
            .repository
            .issues
            .approve_request(id, approver.user_id, Utc::now().timestamp())
            .await?;

        tracing::info!(
            request_id = request.id,
            approver_id = approver.user_id,
            isbn = %book.isbn,
            available = book.available_copies,
            "Issue request approved"
        );
        Ok(request)
    }

    /// Reject a pending request; the request is removed
    pub async fn disapprove(&self, id: i32, approver: Identity) -> AppResult<()> {
        self.repository.issues.delete_pending_request(id).await?;
        tracing::info!(request_id = id, approver_id = approver.user_id, "Issue request disapproved");
        Ok(())
    }

    /// Hand a book to a reader without a prior request
    pub async fn issue_direct(
        &self,
        isbn: &str,
        reader_id: i32,
        approver: Identity,
    ) -> AppResult<IssueRegistry> {
        let issue = NewIssue::new(isbn, reader_id, approver.user_id, Utc::now());
        let (record, book) = self.repository.issues.issue_direct(&issue).await?;

        tracing::info!(
            issue_id = record.id,
            reader_id,
            isbn = %isbn,
            available = book.available_copies,
            "Book issued"
        );
        Ok(record)
    }

    pub async fn list_registry(&self, active_only: bool) -> AppResult<Vec<IssueRegistry>> {
        self.repository.issues.list_registry(active_only).await
    }

    /// Record the return of an issued book
    pub async fn return_issue(&self, id: i32, approver: Identity) -> AppResult<IssueRegistry> {
        let (record, book) = self
            .repository
            .issues
            .return_issue(id, approver.user_id, Utc::now().timestamp())
            .await?;

        match book {
            Some(book) => tracing::info!(
                issue_id = record.id,
                isbn = %book.isbn,
                available = book.available_copies,
                "Book returned"
            ),
            None => tracing::warn!(
                issue_id = record.id,
                isbn = %record.isbn,
                "Book returned but no copy counter could be restored"
            ),
        }
        Ok(record)
    }
}
