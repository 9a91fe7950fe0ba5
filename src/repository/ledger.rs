//! Unit-of-work storage for the lending ledger
//!
//! Every ledger operation runs inside one [`LedgerTx`]. Nothing it writes is
//! visible to other units of work until [`LedgerTx::commit`]; dropping the
//! unit without committing discards all of its writes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{LedgerError, LedgerResult},
    models::{Book, Transaction, WishlistEntry},
};

/// Source of ledger units of work
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn begin(&self) -> LedgerResult<Box<dyn LedgerTx>>;
}

/// One atomic unit of work over books, transactions and wishlist entries
#[async_trait]
pub trait LedgerTx: Send {
    /// Fetch a book, holding its row until the unit of work ends
    async fn find_book(&mut self, id: i32) -> LedgerResult<Option<Book>>;

    /// Decrement `available_copies` if it is positive. Returns `false` when
    /// no copy was left to take.
    async fn take_copy(&mut self, book_id: i32) -> LedgerResult<bool>;

    async fn restore_copy(&mut self, book_id: i32) -> LedgerResult<()>;

    /// Fetch a transaction, holding its row until the unit of work ends
    async fn find_transaction(&mut self, id: i32) -> LedgerResult<Option<Transaction>>;

    async fn find_open_transaction(
        &mut self,
        user_id: i32,
        book_id: i32,
    ) -> LedgerResult<Option<Transaction>>;

    async fn insert_transaction(
        &mut self,
        user_id: i32,
        book_id: i32,
        borrowed_date: DateTime<Utc>,
    ) -> LedgerResult<Transaction>;

    /// Set `return_date` on an open transaction. Returns `None` if the
    /// transaction was already closed.
    async fn close_transaction(
        &mut self,
        id: i32,
        return_date: DateTime<Utc>,
    ) -> LedgerResult<Option<Transaction>>;

    async fn find_wishlist_entry(&mut self, id: i32) -> LedgerResult<Option<WishlistEntry>>;

    async fn find_wishlist_entry_for(
        &mut self,
        user_id: i32,
        book_id: i32,
    ) -> LedgerResult<Option<WishlistEntry>>;

    async fn insert_wishlist_entry(
        &mut self,
        user_id: i32,
        book_id: i32,
        added_date: DateTime<Utc>,
    ) -> LedgerResult<WishlistEntry>;

    async fn delete_wishlist_entry(&mut self, id: i32) -> LedgerResult<()>;

    async fn commit(self: Box<Self>) -> LedgerResult<()>;
}

/// PostgreSQL ledger store
#[derive(Clone)]
pub struct PgLedgerStore {
    pool: Pool<Postgres>,
}

impl PgLedgerStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn begin(&self) -> LedgerResult<Box<dyn LedgerTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgLedgerTx { tx }))
    }
}

struct PgLedgerTx {
    tx: sqlx::Transaction<'static, Postgres>,
}

/// Map constraint violations raised by the schema backstops to their ledger
/// outcome.
fn map_constraint(e: sqlx::Error, on_unique: LedgerError) -> LedgerError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return on_unique;
        }
        if db.is_foreign_key_violation() {
            tracing::debug!(constraint = ?db.constraint(), "Referenced row missing");
            return LedgerError::NotFound("User or book not found".to_string());
        }
    }
    LedgerError::from(e)
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn find_book(&mut self, id: i32) -> LedgerResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            SELECT id, title, author, category, available_copies
            FROM books
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(book)
    }

    async fn take_copy(&mut self, book_id: i32) -> LedgerResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET available_copies = available_copies - 1
            WHERE id = $1 AND available_copies > 0
            "#,
        )
        .bind(book_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn restore_copy(&mut self, book_id: i32) -> LedgerResult<()> {
        let result = sqlx::query(
            "UPDATE books SET available_copies = available_copies + 1 WHERE id = $1",
        )
        .bind(book_id)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::NotFound(format!("Book with id {} not found", book_id)));
        }
        Ok(())
    }

    async fn find_transaction(&mut self, id: i32) -> LedgerResult<Option<Transaction>> {
        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, user_id, book_id, borrowed_date, return_date
            FROM transactions
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(transaction)
    }

    async fn find_open_transaction(
        &mut self,
        user_id: i32,
        book_id: i32,
    ) -> LedgerResult<Option<Transaction>> {
        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, user_id, book_id, borrowed_date, return_date
            FROM transactions
            WHERE user_id = $1 AND book_id = $2 AND return_date IS NULL
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(transaction)
    }

    async fn insert_transaction(
        &mut self,
        user_id: i32,
        book_id: i32,
        borrowed_date: DateTime<Utc>,
    ) -> LedgerResult<Transaction> {
        sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions (user_id, book_id, borrowed_date)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, book_id, borrowed_date, return_date
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(borrowed_date)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_constraint(e, LedgerError::AlreadyBorrowed))
    }

    async fn close_transaction(
        &mut self,
        id: i32,
        return_date: DateTime<Utc>,
    ) -> LedgerResult<Option<Transaction>> {
        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            UPDATE transactions
            SET return_date = $2
            WHERE id = $1 AND return_date IS NULL
            RETURNING id, user_id, book_id, borrowed_date, return_date
            "#,
        )
        .bind(id)
        .bind(return_date)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(transaction)
    }

    async fn find_wishlist_entry(&mut self, id: i32) -> LedgerResult<Option<WishlistEntry>> {
        let entry = sqlx::query_as::<_, WishlistEntry>(
            "SELECT id, user_id, book_id, added_date FROM wishlists WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(entry)
    }

    async fn find_wishlist_entry_for(
        &mut self,
        user_id: i32,
        book_id: i32,
    ) -> LedgerResult<Option<WishlistEntry>> {
        let entry = sqlx::query_as::<_, WishlistEntry>(
            r#"
            SELECT id, user_id, book_id, added_date
            FROM wishlists
            WHERE user_id = $1 AND book_id = $2
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(entry)
    }

    async fn insert_wishlist_entry(
        &mut self,
        user_id: i32,
        book_id: i32,
        added_date: DateTime<Utc>,
    ) -> LedgerResult<WishlistEntry> {
        sqlx::query_as::<_, WishlistEntry>(
            r#"
            INSERT INTO wishlists (user_id, book_id, added_date)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, book_id, added_date
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(added_date)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_constraint(e, LedgerError::AlreadyInWishlist))
    }

    async fn delete_wishlist_entry(&mut self, id: i32) -> LedgerResult<()> {
        let result = sqlx::query("DELETE FROM wishlists WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::NotFound(format!("Wishlist entry {} not found", id)));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> LedgerResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
