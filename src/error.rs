//! Error types for Libris server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Stable numeric error codes carried in every error body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchData = 4,
    NoCopiesAvailable = 5,
    AlreadyBorrowed = 6,
    AlreadyReturned = 7,
    AlreadyInWishlist = 8,
    Duplicate = 9,
    BadValue = 10,
    StorageUnavailable = 11,
}

/// Outcome of a rejected lending operation.
///
/// Every variant except `StorageUnavailable` is an expected, user-facing
/// result. None of them are retried.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No copies available for borrowing")]
    NoCopiesAvailable,

    #[error("Book is already borrowed by this user")]
    AlreadyBorrowed,

    #[error("Transaction has already been returned")]
    AlreadyReturned,

    #[error("Book is already in the wishlist")]
    AlreadyInWishlist,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::StorageUnavailable(e.to_string())
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::Validation(e.to_string())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl AppError {
    fn parts(&self) -> (StatusCode, ErrorCode, String) {
        match self {
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::Authorization(msg) => {
                (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchData, msg.clone()),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, ErrorCode::Duplicate, msg.clone()),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
            AppError::BusinessRule(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::Failure, msg.clone())
            }
            AppError::Ledger(e) => ledger_parts(e),
        }
    }
}

fn ledger_parts(e: &LedgerError) -> (StatusCode, ErrorCode, String) {
    match e {
        LedgerError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchData, msg.clone()),
        LedgerError::NoCopiesAvailable => {
            (StatusCode::CONFLICT, ErrorCode::NoCopiesAvailable, e.to_string())
        }
        LedgerError::AlreadyBorrowed => {
            (StatusCode::CONFLICT, ErrorCode::AlreadyBorrowed, e.to_string())
        }
        LedgerError::AlreadyReturned => {
            (StatusCode::CONFLICT, ErrorCode::AlreadyReturned, e.to_string())
        }
        LedgerError::AlreadyInWishlist => {
            (StatusCode::CONFLICT, ErrorCode::AlreadyInWishlist, e.to_string())
        }
        LedgerError::Forbidden(msg) => {
            (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized, msg.clone())
        }
        LedgerError::StorageUnavailable(msg) => {
            tracing::error!("Storage unavailable: {}", msg);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorCode::StorageUnavailable,
                "Storage unavailable, please try again later".to_string(),
            )
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
