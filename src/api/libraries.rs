//! Library endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::library::{CreateLibrary, Library, UpdateLibrary},
    AppState,
};

use super::{ApiPath, MessageResponse, ValidatedJson};

#[derive(Serialize, ToSchema)]
pub struct LibraryResponse {
    pub message: String,
    pub library: Library,
}

#[derive(Serialize, ToSchema)]
pub struct LibraryListResponse {
    pub libraries: Vec<Library>,
}

#[derive(Serialize, ToSchema)]
pub struct LibraryDetailResponse {
    pub library: Library,
}

/// List all libraries
#[utoipa::path(
    get,
    path = "/libraries",
    tag = "libraries",
    responses(
        (status = 200, description = "All libraries", body = LibraryListResponse)
    )
)]
pub async fn list_libraries(State(state): State<AppState>) -> AppResult<Json<LibraryListResponse>> {
    let libraries = state.services.catalog.list_libraries().await?;
    Ok(Json(LibraryListResponse { libraries }))
}

/// Get a library by ID
#[utoipa::path(
    get,
    path = "/libraries/{id}",
    tag = "libraries",
    params(("id" = i32, Path, description = "Library ID")),
    responses(
        (status = 200, description = "Library details", body = LibraryDetailResponse),
        (status = 404, description = "Library not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_library(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<LibraryDetailResponse>> {
    let library = state.services.catalog.get_library(id).await?;
    Ok(Json(LibraryDetailResponse { library }))
}

/// Create a library
#[utoipa::path(
    post,
    path = "/api/library",
    tag = "libraries",
    security(("bearer_auth" = [])),
    request_body = CreateLibrary,
    responses(
        (status = 201, description = "Library created", body = LibraryResponse),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 403, description = "Owner role required", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_library(
    State(state): State<AppState>,
    ValidatedJson(library): ValidatedJson<CreateLibrary>,
) -> AppResult<(StatusCode, Json<LibraryResponse>)> {
    let library = state.services.catalog.create_library(library).await?;
    Ok((
        StatusCode::CREATED,
        Json(LibraryResponse {
            message: "Library created successfully".to_string(),
            library,
        }),
    ))
}

/// Update a library
#[utoipa::path(
    put,
    path = "/api/library/{id}",
    tag = "libraries",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Library ID")),
    request_body = UpdateLibrary,
    responses(
        (status = 200, description = "Library updated", body = LibraryResponse),
        (status = 404, description = "Library not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_library(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ValidatedJson(library): ValidatedJson<UpdateLibrary>,
) -> AppResult<Json<LibraryResponse>> {
    let library = state.services.catalog.update_library(id, library).await?;
    Ok(Json(LibraryResponse {
        message: "Library updated successfully".to_string(),
        library,
    }))
}

/// Delete a library with its books and memberships
#[utoipa::path(
    delete,
    path = "/api/library/{id}",
    tag = "libraries",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Library ID")),
    responses(
        (status = 200, description = "Library deleted", body = MessageResponse),
        (status = 404, description = "Library not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_library(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<MessageResponse>> {
    state.services.catalog.delete_library(id).await?;
    Ok(Json(MessageResponse::new("Library deleted successfully")))
}
