//! Book model and copy accounting

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Book model from database
///
/// `available_copies` always stays within `0..=total_copies`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub isbn: String,
    pub title: String,
    pub authors: Option<String>,
    pub publisher: Option<String>,
    pub version: Option<String>,
    pub total_copies: i32,
    pub available_copies: i32,
    pub library_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Copies currently out on loan
    pub fn on_loan(&self) -> i32 {
        self.total_copies - self.available_copies
    }

    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }

    /// Counters after changing the number of owned copies.
    ///
    /// Copies on loan stay on loan, so the available count moves by the same
    /// delta as the total. Returns `(total, available)`.
    pub fn resized(&self, total_copies: i32) -> AppResult<(i32, i32)> {
        let on_loan = self.on_loan();
        if total_copies < on_loan {
            return Err(AppError::Validation(format!(
                "total_copies cannot be lower than the {} copies currently issued",
                on_loan
            )));
        }
        Ok((total_copies, total_copies - on_loan))
    }
}

/// Add book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "ISBN is required"))]
    pub isbn: String,
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    pub authors: Option<String>,
    pub publisher: Option<String>,
    pub version: Option<String>,
    #[validate(range(min = 1, message = "total_copies must be at least 1"))]
    pub total_copies: i32,
    pub library_id: i32,
}

/// Update book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: Option<String>,
    pub authors: Option<String>,
    pub publisher: Option<String>,
    pub version: Option<String>,
    #[validate(range(min = 0, message = "total_copies must not be negative"))]
    pub total_copies: Option<i32>,
}

/// Book search parameters (case-insensitive substrings, AND-combined)
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(total: i32, available: i32) -> Book {
        Book {
            id: 1,
            isbn: "978-0-13-110362-7".to_string(),
            title: "The C Programming Language".to_string(),
            authors: Some("Kernighan, Ritchie".to_string()),
            publisher: None,
            version: Some("2".to_string()),
            total_copies: total,
            available_copies: available,
            library_id: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_availability() {
        assert!(book(3, 1).is_available());
        assert!(!book(3, 0).is_available());
        assert_eq!(book(3, 1).on_loan(), 2);
    }

    #[test]
    fn test_resize_keeps_loans() {
        assert_eq!(book(3, 1).resized(5).unwrap(), (5, 3));
        assert_eq!(book(3, 1).resized(2).unwrap(), (2, 0));
        assert_eq!(book(3, 3).resized(0).unwrap(), (0, 0));
    }

    #[test]
    fn test_resize_below_loans_is_rejected() {
        match book(3, 0).resized(2) {
            Err(AppError::Validation(msg)) => assert!(msg.contains("3 copies")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_create_book_validation() {
        let input = CreateBook {
            isbn: String::new(),
            title: "Title".to_string(),
            authors: None,
            publisher: None,
            version: None,
            total_copies: 0,
            library_id: 1,
        };
        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("isbn"));
        assert!(fields.contains_key("total_copies"));
    }
}
