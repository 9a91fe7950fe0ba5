//! Book (catalog entry) model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Book model from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub category: String,
    /// Copies on the shelf. Never negative.
    pub available_copies: i32,
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 100, message = "Title is required (max 100 characters)"))]
    pub title: String,
    #[validate(length(min = 1, max = 50, message = "Author is required (max 50 characters)"))]
    pub author: String,
    #[validate(length(min = 1, max = 50, message = "Category is required (max 50 characters)"))]
    pub category: String,
    #[validate(range(min = 0, message = "Available copies cannot be negative"))]
    pub available_copies: i32,
}

/// Update book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 100, message = "Title must be 1 to 100 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Author must be 1 to 50 characters"))]
    pub author: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Category must be 1 to 50 characters"))]
    pub category: Option<String>,
    #[validate(range(min = 0, message = "Available copies cannot be negative"))]
    pub available_copies: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_book_validation() {
        let book = CreateBook {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            category: "Science Fiction".to_string(),
            available_copies: 3,
        };
        assert!(book.validate().is_ok());

        let negative = CreateBook {
            available_copies: -1,
            ..book.clone()
        };
        assert!(negative.validate().is_err());

        let untitled = CreateBook {
            title: String::new(),
            ..book
        };
        assert!(untitled.validate().is_err());
    }

    #[test]
    fn test_update_book_partial() {
        let update = UpdateBook {
            title: None,
            author: None,
            category: Some("Poetry".to_string()),
            available_copies: None,
        };
        assert!(update.validate().is_ok());

        let update = UpdateBook {
            available_copies: Some(-2),
            ..update
        };
        assert!(update.validate().is_err());
    }
}
