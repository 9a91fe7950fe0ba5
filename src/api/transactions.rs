//! Borrow / return endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        transaction::{Transaction, TransactionDetails},
        user::{has_role, Role},
    },
};

use super::AuthenticatedUser;

/// Borrow response
#[derive(Serialize, ToSchema)]
pub struct BorrowResponse {
    /// The opened transaction
    pub transaction: Transaction,
    /// Status message
    pub message: String,
}

/// Return response
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    /// Return status
    pub status: String,
    /// The closed transaction
    pub transaction: Transaction,
}

/// Borrow a copy of a book
#[utoipa::path(
    post,
    path = "/books/{id}/borrow",
    tag = "transactions",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 201, description = "Book borrowed", body = BorrowResponse),
        (status = 404, description = "Book not found"),
        (status = 409, description = "No copies available or already borrowed")
    )
)]
pub async fn borrow(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(book_id): Path<i32>,
) -> AppResult<(StatusCode, Json<BorrowResponse>)> {
    let transaction = state.services.ledger.borrow(claims.user_id, book_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(BorrowResponse {
            transaction,
            message: "Book borrowed successfully".to_string(),
        }),
    ))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/transactions/{id}/return",
    tag = "transactions",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Transaction ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = ReturnResponse),
        (status = 403, description = "Not the borrower"),
        (status = 404, description = "Transaction not found"),
        (status = 409, description = "Already returned")
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(transaction_id): Path<i32>,
) -> AppResult<Json<ReturnResponse>> {
    let privileged = has_role(claims.role, &[Role::Admin]);

    let transaction = state
        .services
        .ledger
        .return_book(transaction_id, claims.user_id, privileged)
        .await?;

    Ok(Json(ReturnResponse {
        status: "returned".to_string(),
        transaction,
    }))
}

/// Transactions of the calling user
#[utoipa::path(
    get,
    path = "/transactions/mine",
    tag = "transactions",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own transactions", body = Vec<TransactionDetails>)
    )
)]
pub async fn my_transactions(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<TransactionDetails>>> {
    let transactions = state
        .services
        .circulation
        .user_transactions(claims.user_id)
        .await?;
    Ok(Json(transactions))
}

/// All transactions (admin only)
#[utoipa::path(
    get,
    path = "/transactions",
    tag = "transactions",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All transactions", body = Vec<TransactionDetails>),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn list_transactions(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<TransactionDetails>>> {
    claims.require_admin()?;

    let transactions = state.services.circulation.all_transactions().await?;
    Ok(Json(transactions))
}
