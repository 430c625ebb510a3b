//! Libraries and books service

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookQuery, CreateBook, UpdateBook},
        library::{CreateLibrary, Library, UpdateLibrary},
        user::{Identity, Role},
    },
    repository::{books::AddOutcome, Repository},
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    // =========================================================================
    // LIBRARIES
    // =========================================================================

    pub async fn list_libraries(&self) -> AppResult<Vec<Library>> {
        self.repository.libraries.list().await
    }

    pub async fn get_library(&self, id: i32) -> AppResult<Library> {
        self.repository.libraries.get_by_id(id).await
    }

    pub async fn create_library(&self, library: CreateLibrary) -> AppResult<Library> {
        let created = self.repository.libraries.create(&library).await?;
        tracing::info!(library_id = created.id, name = %created.name, "Library created");
        Ok(created)
    }

    pub async fn update_library(&self, id: i32, library: UpdateLibrary) -> AppResult<Library> {
        self.repository.libraries.update(id, &library).await
    }

    /// Delete a library together with its books and memberships
    pub async fn delete_library(&self, id: i32) -> AppResult<()> {
        self.repository.libraries.delete(id).await?;
        tracing::info!(library_id = id, "Library deleted");
        Ok(())
    }

    // =========================================================================
    // BOOKS
    // =========================================================================

    /// Add a book to a library the caller administers
    pub async fn add_book(&self, caller: Identity, book: CreateBook) -> AppResult<AddOutcome> {
        if !self.repository.libraries.exists(book.library_id).await? {
            return Err(AppError::BadRequest(format!("Library ID {} not found", book.library_id)));
        }

        if caller.role == Role::Admin
            && !self
                .repository
                .memberships
                .is_member(caller.user_id, book.library_id)
                .await?
        {
            tracing::warn!(
                user_id = caller.user_id,
                library_id = book.library_id,
                "Admin tried to add a book outside its libraries"
            );
            return Err(AppError::Authorization(
                "You are not an admin of this library".to_string(),
            ));
        }

        let outcome = self.repository.books.add(&book).await?;
        match &outcome {
            AddOutcome::Created(b) => {
                tracing::info!(isbn = %b.isbn, library_id = b.library_id, copies = b.total_copies, "Book added")
            }
            AddOutcome::CopiesAdded(b) => {
                tracing::info!(isbn = %b.isbn, added = book.total_copies, total = b.total_copies, "Copies added")
            }
        }
        Ok(outcome)
    }

    pub async fn get_book(&self, isbn: &str) -> AppResult<Book> {
        self.repository.books.get_by_isbn(isbn).await
    }

    pub async fn search_books(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        self.repository.books.search(query).await
    }

    pub async fn update_book(&self, isbn: &str, update: UpdateBook) -> AppResult<Book> {
        let book = self.repository.books.update(isbn, &update).await?;
        tracing::info!(isbn = %book.isbn, total = book.total_copies, available = book.available_copies, "Book updated");
        Ok(book)
    }

    pub async fn delete_book(&self, isbn: &str) -> AppResult<()> {
        self.repository.books.delete(isbn).await?;
        tracing::info!(isbn = %isbn, "Book deleted");
        Ok(())
    }
}
