//! User ↔ library membership

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Membership {
    pub user_id: i32,
    pub library_id: i32,
}

/// Link an existing user to an existing library
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateMembership {
    #[validate(range(min = 1, message = "Invalid user id"))]
    pub user_id: i32,
    #[validate(range(min = 1, message = "Invalid library id"))]
    pub library_id: i32,
}
