//! Book catalog endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
    repository::books::AddOutcome,
    AppState,
};

use super::{ApiPath, ApiQuery, AuthenticatedUser, MessageResponse, ValidatedJson};

#[derive(Serialize, ToSchema)]
pub struct BookResponse {
    pub message: String,
    pub book: Book,
}

#[derive(Serialize, ToSchema)]
pub struct BookDetailResponse {
    pub book: Book,
}

#[derive(Serialize, ToSchema)]
pub struct BookListResponse {
    pub books: Vec<Book>,
}

/// Add a book to a library, or add copies of an ISBN it already holds
#[utoipa::path(
    post,
    path = "/api/book",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book added", body = BookResponse),
        (status = 200, description = "Copies added to an existing book", body = BookResponse),
        (status = 400, description = "Invalid input or unknown library", body = crate::error::ErrorResponse),
        (status = 403, description = "Caller does not administer the library", body = crate::error::ErrorResponse),
        (status = 409, description = "ISBN held by another library", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_book(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    ValidatedJson(book): ValidatedJson<CreateBook>,
) -> AppResult<(StatusCode, Json<BookResponse>)> {
    let response = match state.services.catalog.add_book(caller, book).await? {
        AddOutcome::Created(book) => (
            StatusCode::CREATED,
            BookResponse {
                message: "Book added successfully".to_string(),
                book,
            },
        ),
        AddOutcome::CopiesAdded(book) => (
            StatusCode::OK,
            BookResponse {
                message: "Book already exists, copies added".to_string(),
                book,
            },
        ),
    };
    Ok((response.0, Json(response.1)))
}

/// Get a book by ISBN
#[utoipa::path(
    get,
    path = "/api/books/{isbn}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("isbn" = String, Path, description = "Book ISBN")),
    responses(
        (status = 200, description = "Book details", body = BookDetailResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    ApiPath(isbn): ApiPath<String>,
) -> AppResult<Json<BookDetailResponse>> {
    let book = state.services.catalog.get_book(&isbn).await?;
    Ok(Json(BookDetailResponse { book }))
}

/// Search books by title, author and publisher
#[utoipa::path(
    get,
    path = "/api/books/search",
    tag = "books",
    security(("bearer_auth" = [])),
    params(BookQuery),
    responses(
        (status = 200, description = "Matching books", body = BookListResponse)
    )
)]
pub async fn search_books(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<BookQuery>,
) -> AppResult<Json<BookListResponse>> {
    let books = state.services.catalog.search_books(&query).await?;
    Ok(Json(BookListResponse { books }))
}

/// Update a book
#[utoipa::path(
    put,
    path = "/api/book/{isbn}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("isbn" = String, Path, description = "Book ISBN")),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = BookResponse),
        (status = 400, description = "New total below copies on loan", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    ApiPath(isbn): ApiPath<String>,
    ValidatedJson(update): ValidatedJson<UpdateBook>,
) -> AppResult<Json<BookResponse>> {
    let book = state.services.catalog.update_book(&isbn, update).await?;
    Ok(Json(BookResponse {
        message: "Book updated successfully".to_string(),
        book,
    }))
}

/// Remove a book from the catalog
#[utoipa::path(
    delete,
    path = "/api/book/{isbn}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("isbn" = String, Path, description = "Book ISBN")),
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    ApiPath(isbn): ApiPath<String>,
) -> AppResult<Json<MessageResponse>> {
    state.services.catalog.delete_book(&isbn).await?;
    Ok(Json(MessageResponse::new("Book deleted successfully")))
}
