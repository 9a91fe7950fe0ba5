//! Wishlists repository (read side)

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};

use crate::{
    error::AppResult,
    models::{book::Book, wishlist::WishlistItem},
};

#[derive(Clone)]
pub struct WishlistsRepository {
    pool: Pool<Postgres>,
}

impl WishlistsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Wishlist of one user with book details, most recently added first
    pub async fn list_for_user(&self, user_id: i32) -> AppResult<Vec<WishlistItem>> {
        let rows = sqlx::query(
            r#"
            SELECT w.id, w.added_date,
                   b.id AS book_id, b.title, b.author, b.category, b.available_copies
            FROM wishlists w
            JOIN books b ON b.id = w.book_id
            WHERE w.user_id = $1
            ORDER BY w.added_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(|row| WishlistItem {
                id: row.get("id"),
                added_date: row.get::<DateTime<Utc>, _>("added_date"),
                book: Book {
                    id: row.get("book_id"),
                    title: row.get("title"),
                    author: row.get("author"),
                    category: row.get("category"),
                    available_copies: row.get("available_copies"),
                },
            })
            .collect();

        Ok(items)
    }

    pub async fn count_for_user(&self, user_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM wishlists WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
