//! Wishlist model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::book::Book;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct WishlistEntry {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub added_date: DateTime<Utc>,
}

/// Wishlist entry with its book, for listings
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WishlistItem {
    pub id: i32,
    pub added_date: DateTime<Utc>,
    pub book: Book,
}
