//! Issue registry: the authoritative loan ledger

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Default loan period
pub const LOAN_PERIOD_DAYS: i64 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum IssueStatus {
    Issued,
    Returned,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Issued => "issued",
            IssueStatus::Returned => "returned",
        }
    }
}

impl std::str::FromStr for IssueStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "issued" => Ok(IssueStatus::Issued),
            "returned" => Ok(IssueStatus::Returned),
            _ => Err(format!("Invalid issue status: {}", s)),
        }
    }
}

text_column!(IssueStatus);

/// Loan record. Dates are Unix seconds; `0` in the return fields means "not yet".
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct IssueRegistry {
    pub id: i32,
    pub isbn: String,
    pub reader_id: i32,
    pub issue_approver_id: i32,
    pub issue_status: IssueStatus,
    pub issue_date: i64,
    pub expected_return_date: i64,
    pub return_date: i64,
    pub return_approver_id: i32,
}

impl IssueRegistry {
    pub fn is_returned(&self) -> bool {
        self.return_date != 0 || self.issue_status == IssueStatus::Returned
    }

    pub fn ensure_not_returned(&self) -> AppResult<()> {
        if self.is_returned() {
            return Err(AppError::Conflict("Book has already been returned".to_string()));
        }
        Ok(())
    }
}

/// Registry row about to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIssue {
    pub isbn: String,
    pub reader_id: i32,
    pub issue_approver_id: i32,
    pub issue_date: i64,
    pub expected_return_date: i64,
}

impl NewIssue {
    pub fn new(isbn: &str, reader_id: i32, issue_approver_id: i32, now: DateTime<Utc>) -> Self {
        Self {
            isbn: isbn.to_string(),
            reader_id,
            issue_approver_id,
            issue_date: now.timestamp(),
            expected_return_date: (now + Duration::days(LOAN_PERIOD_DAYS)).timestamp(),
        }
    }
}

/// Direct issue request body
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DirectIssueRequest {
    /// Reader receiving the book
    #[validate(range(min = 1, message = "Invalid user id"))]
    pub user_id: i32,
}

/// Filters for the registry listing
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct RegistryQuery {
    /// Only loans not yet returned
    pub active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_issue_due_in_two_weeks() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        let issue = NewIssue::new("Y", 42, 1, now);

        assert_eq!(issue.reader_id, 42);
        assert_eq!(issue.issue_date, now.timestamp());
        assert_eq!(issue.expected_return_date - issue.issue_date, 14 * 24 * 3600);
    }

    #[test]
    fn test_return_state() {
        let mut row = IssueRegistry {
            id: 1,
            isbn: "Y".to_string(),
            reader_id: 42,
            issue_approver_id: 1,
            issue_status: IssueStatus::Issued,
            issue_date: 1_700_000_000,
            expected_return_date: 1_700_000_000 + 14 * 24 * 3600,
            return_date: 0,
            return_approver_id: 0,
        };
        assert!(!row.is_returned());
        assert!(row.ensure_not_returned().is_ok());

        row.return_date = 1_700_100_000;
        row.return_approver_id = 1;
        row.issue_status = IssueStatus::Returned;
        assert!(matches!(row.ensure_not_returned(), Err(AppError::Conflict(_))));
    }
}
