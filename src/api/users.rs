//! Account management endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        membership::{CreateMembership, Membership},
        user::{CreateAccount, CreateOwner, User, UserWithLibraries},
    },
    AppState,
};

use super::ValidatedJson;

#[derive(Serialize, ToSchema)]
pub struct OwnerResponse {
    pub message: String,
    pub owner: User,
}

#[derive(Serialize, ToSchema)]
pub struct AdminResponse {
    pub message: String,
    pub admin: UserWithLibraries,
}

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub message: String,
    pub user: UserWithLibraries,
}

#[derive(Serialize, ToSchema)]
pub struct MembershipResponse {
    pub message: String,
    pub membership: Membership,
}

/// Register a new owner
#[utoipa::path(
    post,
    path = "/api/owner",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = CreateOwner,
    responses(
        (status = 201, description = "Owner created", body = OwnerResponse),
        (status = 400, description = "Invalid input or role", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_owner(
    State(state): State<AppState>,
    ValidatedJson(owner): ValidatedJson<CreateOwner>,
) -> AppResult<(StatusCode, Json<OwnerResponse>)> {
    let owner = state.services.accounts.create_owner(owner).await?;
    Ok((
        StatusCode::CREATED,
        Json(OwnerResponse {
            message: "New owner registered successfully".to_string(),
            owner,
        }),
    ))
}

/// Register a new admin for one or more libraries
#[utoipa::path(
    post,
    path = "/api/admin",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = CreateAccount,
    responses(
        (status = 201, description = "Admin created", body = AdminResponse),
        (status = 400, description = "Invalid input or unknown library", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_admin(
    State(state): State<AppState>,
    ValidatedJson(account): ValidatedJson<CreateAccount>,
) -> AppResult<(StatusCode, Json<AdminResponse>)> {
    let admin = state.services.accounts.create_admin(account).await?;
    Ok((
        StatusCode::CREATED,
        Json(AdminResponse {
            message: "Admin registered successfully".to_string(),
            admin,
        }),
    ))
}

/// Register a new reader for one or more libraries
#[utoipa::path(
    post,
    path = "/api/user",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = CreateAccount,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid input or unknown library", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(account): ValidatedJson<CreateAccount>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = state.services.accounts.create_user(account).await?;
    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            message: "User registered successfully".to_string(),
            user,
        }),
    ))
}

/// Link a user to a library
#[utoipa::path(
    post,
    path = "/api/membership",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = CreateMembership,
    responses(
        (status = 201, description = "Membership linked", body = MembershipResponse),
        (status = 404, description = "User or library not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_membership(
    State(state): State<AppState>,
    ValidatedJson(membership): ValidatedJson<CreateMembership>,
) -> AppResult<(StatusCode, Json<MembershipResponse>)> {
    let membership = state.services.accounts.add_membership(membership).await?;
    Ok((
        StatusCode::CREATED,
        Json(MembershipResponse {
            message: "Membership created successfully".to_string(),
            membership,
        }),
    ))
}
