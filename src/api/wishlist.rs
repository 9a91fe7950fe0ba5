//! Wishlist endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::wishlist::{WishlistEntry, WishlistItem},
};

use super::{transactions::BorrowResponse, AuthenticatedUser};

#[derive(Serialize, ToSchema)]
pub struct CountResponse {
    pub count: i64,
}

/// Wishlist of the calling user
#[utoipa::path(
    get,
    path = "/wishlist",
    tag = "wishlist",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Wishlist, newest first", body = Vec<WishlistItem>)
    )
)]
pub async fn my_wishlist(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<WishlistItem>>> {
    let items = state.services.circulation.user_wishlist(claims.user_id).await?;
    Ok(Json(items))
}

/// Number of entries in the calling user's wishlist
#[utoipa::path(
    get,
    path = "/wishlist/count",
    tag = "wishlist",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Wishlist size", body = CountResponse)
    )
)]
pub async fn wishlist_count(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<CountResponse>> {
    let count = state.services.circulation.wishlist_count(claims.user_id).await?;
    Ok(Json(CountResponse { count }))
}

/// Add a book to the calling user's wishlist
#[utoipa::path(
    post,
    path = "/books/{id}/wishlist",
    tag = "wishlist",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 201, description = "Added to wishlist", body = WishlistEntry),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Already in wishlist")
    )
)]
pub async fn add_to_wishlist(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(book_id): Path<i32>,
) -> AppResult<(StatusCode, Json<WishlistEntry>)> {
    let entry = state
        .services
        .ledger
        .add_to_wishlist(claims.user_id, book_id)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Remove an entry from the calling user's wishlist
#[utoipa::path(
    delete,
    path = "/wishlist/{id}",
    tag = "wishlist",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Wishlist entry ID")
    ),
    responses(
        (status = 204, description = "Removed from wishlist"),
        (status = 404, description = "Entry not found")
    )
)]
pub async fn remove_from_wishlist(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(entry_id): Path<i32>,
) -> AppResult<StatusCode> {
    state
        .services
        .ledger
        .remove_from_wishlist(entry_id, claims.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Borrow the book of a wishlist entry and drop the entry
#[utoipa::path(
    post,
    path = "/wishlist/{id}/borrow",
    tag = "wishlist",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Wishlist entry ID")
    ),
    responses(
        (status = 201, description = "Book borrowed from wishlist", body = BorrowResponse),
        (status = 404, description = "Entry or book not found"),
        (status = 409, description = "No copies available or already borrowed")
    )
)]
pub async fn move_to_borrow(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(entry_id): Path<i32>,
) -> AppResult<(StatusCode, Json<BorrowResponse>)> {
    let transaction = state
        .services
        .ledger
        .move_wishlist_to_borrow(entry_id, claims.user_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(BorrowResponse {
            transaction,
            message: "Book borrowed from wishlist successfully".to_string(),
        }),
    ))
}
