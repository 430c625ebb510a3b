//! Issue/return request events

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    Issue,
    Return,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::Issue => "issue",
            RequestType::Return => "return",
        }
    }
}

impl std::str::FromStr for RequestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "issue" => Ok(RequestType::Issue),
            "return" => Ok(RequestType::Return),
            _ => Err(format!("Invalid request type: {}", s)),
        }
    }
}

text_column!(RequestType);

/// Where a request stands. Disapproved requests are deleted, so they have no state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Pending,
    Approved,
}

/// A reader's request, pending until an admin approves it
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RequestEvent {
    pub id: i32,
    pub isbn: String,
    pub reader_id: i32,
    /// Unix seconds
    pub request_date: i64,
    pub approval_date: Option<i64>,
    pub approver_id: Option<i32>,
    pub request_type: RequestType,
}

impl RequestEvent {
    pub fn state(&self) -> RequestState {
        if self.approval_date.is_some() {
            RequestState::Approved
        } else {
            RequestState::Pending
        }
    }

    pub fn ensure_pending(&self) -> AppResult<()> {
        match self.state() {
            RequestState::Pending => Ok(()),
            RequestState::Approved => {
                Err(AppError::Conflict("Request is already approved".to_string()))
            }
        }
    }
}

/// Submit an issue request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateIssueRequest {
    #[validate(length(min = 1, message = "ISBN is required"))]
    pub isbn: String,
}

/// Filters for the request listing
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct RequestQuery {
    /// Only requests still waiting for approval
    pub pending: Option<bool>,
}
