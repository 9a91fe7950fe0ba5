//! Repository layer for database operations

pub mod books;
pub mod ledger;
pub mod memory;
pub mod transactions;
pub mod users;
pub mod wishlists;

use sqlx::{Pool, Postgres};

use crate::error::AppError;

pub use ledger::{LedgerStore, LedgerTx, PgLedgerStore};
pub use memory::{MemoryLedgerStore, StoreOp};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub users: users::UsersRepository,
    pub transactions: transactions::TransactionsRepository,
    pub wishlists: wishlists::WishlistsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            transactions: transactions::TransactionsRepository::new(pool.clone()),
            wishlists: wishlists::WishlistsRepository::new(pool.clone()),
            pool,
        }
    }

    /// Ledger store backed by the same pool
    pub fn ledger_store(&self) -> PgLedgerStore {
        PgLedgerStore::new(self.pool.clone())
    }
}

/// A delete blocked by an `ON DELETE RESTRICT` reference is a conflict, not
/// a storage failure.
fn restricted_delete(e: sqlx::Error, message: &str) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            tracing::debug!(constraint = ?db.constraint(), "Delete blocked by reference");
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(e),
    }
}
