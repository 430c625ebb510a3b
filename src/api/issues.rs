//! Issue request and registry endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        issue::{DirectIssueRequest, IssueRegistry, RegistryQuery},
        request::{CreateIssueRequest, RequestEvent, RequestQuery},
    },
    AppState,
};

use super::{ApiPath, ApiQuery, AuthenticatedUser, MessageResponse, ValidatedJson};

#[derive(Serialize, ToSchema)]
pub struct RequestResponse {
    pub message: String,
    pub request: RequestEvent,
}

#[derive(Serialize, ToSchema)]
pub struct RequestDetailResponse {
    pub request: RequestEvent,
}

#[derive(Serialize, ToSchema)]
pub struct RequestListResponse {
    pub requests: Vec<RequestEvent>,
}

#[derive(Serialize, ToSchema)]
pub struct IssueResponse {
    pub message: String,
    pub issue: IssueRegistry,
}

#[derive(Serialize, ToSchema)]
pub struct IssueListResponse {
    pub issues: Vec<IssueRegistry>,
}

/// Ask for a book to be issued
#[utoipa::path(
    post,
    path = "/api/issue",
    tag = "issues",
    security(("bearer_auth" = [])),
    request_body = CreateIssueRequest,
    responses(
        (status = 201, description = "Request submitted", body = RequestResponse),
        (status = 400, description = "Book not available", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Pending request already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn request_issue(
    State(state): State<AppState>,
    AuthenticatedUser(reader): AuthenticatedUser,
    ValidatedJson(body): ValidatedJson<CreateIssueRequest>,
) -> AppResult<(StatusCode, Json<RequestResponse>)> {
    let request = state.services.issues.request_issue(reader, &body.isbn).await?;
    Ok((
        StatusCode::CREATED,
        Json(RequestResponse {
            message: "Issue request submitted".to_string(),
            request,
        }),
    ))
}

/// List issue requests
#[utoipa::path(
    get,
    path = "/api/issues",
    tag = "issues",
    security(("bearer_auth" = [])),
    params(RequestQuery),
    responses(
        (status = 200, description = "Requests", body = RequestListResponse)
    )
)]
pub async fn list_requests(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RequestQuery>,
) -> AppResult<Json<RequestListResponse>> {
    let requests = state
        .services
        .issues
        .list_requests(query.pending.unwrap_or(false))
        .await?;
    Ok(Json(RequestListResponse { requests }))
}

/// Get one issue request
#[utoipa::path(
    get,
    path = "/api/issue/request/{id}",
    tag = "issues",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request", body = RequestDetailResponse),
        (status = 404, description = "Request not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_request(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<RequestDetailResponse>> {
    let request = state.services.issues.get_request(id).await?;
    Ok(Json(RequestDetailResponse { request }))
}

/// Approve a pending request
#[utoipa::path(
    put,
    path = "/api/issue/approve/{id}",
    tag = "issues",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request approved", body = RequestResponse),
        (status = 400, description = "No copies left", body = crate::error::ErrorResponse),
        (status = 404, description = "Request or book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Request already approved", body = crate::error::ErrorResponse)
    )
)]
pub async fn approve_request(
    State(state): State<AppState>,
    AuthenticatedUser(approver): AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<RequestResponse>> {
    let request = state.services.issues.approve(id, approver).await?;
    Ok(Json(RequestResponse {
        message: "Issue request approved".to_string(),
        request,
    }))
}

/// Reject and remove a pending request
#[utoipa::path(
    put,
    path = "/api/issue/disapprove/{id}",
    tag = "issues",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request disapproved", body = MessageResponse),
        (status = 404, description = "Request not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Request already approved", body = crate::error::ErrorResponse)
    )
)]
pub async fn disapprove_request(
    State(state): State<AppState>,
    AuthenticatedUser(approver): AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<MessageResponse>> {
    state.services.issues.disapprove(id, approver).await?;
    Ok(Json(MessageResponse::new("Issue request disapproved")))
}

/// Issue a book directly to a reader
#[utoipa::path(
    post,
    path = "/api/issue/book/{isbn}",
    tag = "issues",
    security(("bearer_auth" = [])),
    params(("isbn" = String, Path, description = "Book ISBN")),
    request_body = DirectIssueRequest,
    responses(
        (status = 201, description = "Book issued", body = IssueResponse),
        (status = 400, description = "No copies left", body = crate::error::ErrorResponse),
        (status = 404, description = "Book or reader not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn issue_book(
    State(state): State<AppState>,
    AuthenticatedUser(approver): AuthenticatedUser,
    ApiPath(isbn): ApiPath<String>,
    ValidatedJson(body): ValidatedJson<DirectIssueRequest>,
) -> AppResult<(StatusCode, Json<IssueResponse>)> {
    let issue = state
        .services
        .issues
        .issue_direct(&isbn, body.user_id, approver)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(IssueResponse {
            message: "Book issued successfully".to_string(),
            issue,
        }),
    ))
}

/// List the issue registry
#[utoipa::path(
    get,
    path = "/api/issue/registry",
    tag = "issues",
    security(("bearer_auth" = [])),
    params(RegistryQuery),
    responses(
        (status = 200, description = "Registry rows", body = IssueListResponse)
    )
)]
pub async fn list_registry(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RegistryQuery>,
) -> AppResult<Json<IssueListResponse>> {
    let issues = state
        .services
        .issues
        .list_registry(query.active.unwrap_or(false))
        .await?;
    Ok(Json(IssueListResponse { issues }))
}

/// Record the return of an issued book
#[utoipa::path(
    put,
    path = "/api/issue/return/{id}",
    tag = "issues",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Registry ID")),
    responses(
        (status = 200, description = "Book returned", body = IssueResponse),
        (status = 404, description = "Issue record not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Book already returned", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_book(
    State(state): State<AppState>,
    AuthenticatedUser(approver): AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<IssueResponse>> {
    let issue = state.services.issues.return_issue(id, approver).await?;
    Ok(Json(IssueResponse {
        message: "Book returned successfully".to_string(),
        issue,
    }))
}
