//! Lending ledger
//!
//! Owns every state transition that touches `available_copies`, borrow
//! transactions or wishlist entries. Each public operation runs as a single
//! unit of work: preconditions are checked against the locked rows and all
//! writes are committed together, or none are.

use std::sync::Arc;

use chrono::Utc;

use crate::{
    error::{LedgerError, LedgerResult},
    models::{Transaction, WishlistEntry},
    repository::{LedgerStore, LedgerTx},
};

#[derive(Clone)]
pub struct LendingLedger {
    store: Arc<dyn LedgerStore>,
}

impl LendingLedger {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Borrow one copy of a book
    #[tracing::instrument(skip(self))]
    pub async fn borrow(&self, user_id: i32, book_id: i32) -> LedgerResult<Transaction> {
        let mut tx = self.store.begin().await?;
        let transaction = checkout(tx.as_mut(), user_id, book_id).await?;
        tx.commit().await?;

        tracing::info!(transaction_id = transaction.id, "Book borrowed");
        Ok(transaction)
    }

    /// Close a transaction and put its copy back on the shelf.
    ///
    /// Only the borrower or a privileged caller may return a transaction.
    #[tracing::instrument(skip(self))]
    pub async fn return_book(
        &self,
        transaction_id: i32,
        requesting_user_id: i32,
        requesting_is_privileged: bool,
    ) -> LedgerResult<Transaction> {
        let mut tx = self.store.begin().await?;

        let transaction = tx.find_transaction(transaction_id).await?.ok_or_else(|| {
            LedgerError::NotFound(format!("Transaction with id {} not found", transaction_id))
        })?;

        if !requesting_is_privileged && transaction.user_id != requesting_user_id {
            return Err(LedgerError::Forbidden(
                "Only the borrower or an administrator can return this book".to_string(),
            ));
        }

        if !transaction.is_open() {
            return Err(LedgerError::AlreadyReturned);
        }

        let closed = tx
            .close_transaction(transaction_id, Utc::now())
            .await?
            .ok_or(LedgerError::AlreadyReturned)?;
        tx.restore_copy(closed.book_id).await?;
        tx.commit().await?;

        tracing::info!(book_id = closed.book_id, "Book returned");
        Ok(closed)
    }

    /// Turn a wishlist entry into a borrow: take a copy, open a transaction
    /// and drop the entry, atomically.
    #[tracing::instrument(skip(self))]
    pub async fn move_wishlist_to_borrow(
        &self,
        wishlist_entry_id: i32,
        requesting_user_id: i32,
    ) -> LedgerResult<Transaction> {
        let mut tx = self.store.begin().await?;

        let entry = owned_entry(tx.as_mut(), wishlist_entry_id, requesting_user_id).await?;
        let transaction = checkout(tx.as_mut(), requesting_user_id, entry.book_id).await?;
        tx.delete_wishlist_entry(entry.id).await?;
        tx.commit().await?;

        tracing::info!(
            transaction_id = transaction.id,
            book_id = entry.book_id,
            "Wishlist entry borrowed"
        );
        Ok(transaction)
    }

    #[tracing::instrument(skip(self))]
    pub async fn add_to_wishlist(&self, user_id: i32, book_id: i32) -> LedgerResult<WishlistEntry> {
        let mut tx = self.store.begin().await?;

        if tx.find_book(book_id).await?.is_none() {
            return Err(book_not_found(book_id));
        }
        if tx.find_wishlist_entry_for(user_id, book_id).await?.is_some() {
            return Err(LedgerError::AlreadyInWishlist);
        }

        let entry = tx.insert_wishlist_entry(user_id, book_id, Utc::now()).await?;
        tx.commit().await?;

        Ok(entry)
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove_from_wishlist(
        &self,
        wishlist_entry_id: i32,
        user_id: i32,
    ) -> LedgerResult<()> {
        let mut tx = self.store.begin().await?;

        let entry = owned_entry(tx.as_mut(), wishlist_entry_id, user_id).await?;
        tx.delete_wishlist_entry(entry.id).await?;
        tx.commit().await?;

        Ok(())
    }
}

fn book_not_found(book_id: i32) -> LedgerError {
    LedgerError::NotFound(format!("Book with id {} not found", book_id))
}

/// Check borrow preconditions, take a copy and open a transaction
async fn checkout(tx: &mut dyn LedgerTx, user_id: i32, book_id: i32) -> LedgerResult<Transaction> {
    let book = tx
        .find_book(book_id)
        .await?
        .ok_or_else(|| book_not_found(book_id))?;

    if book.available_copies <= 0 {
        return Err(LedgerError::NoCopiesAvailable);
    }

    if tx.find_open_transaction(user_id, book_id).await?.is_some() {
        return Err(LedgerError::AlreadyBorrowed);
    }

    // Guarded decrement; also catches a stale read on stores without row locks.
    if !tx.take_copy(book_id).await? {
        return Err(LedgerError::NoCopiesAvailable);
    }

    tx.insert_transaction(user_id, book_id, Utc::now()).await
}

/// Another user's entry is reported as missing
async fn owned_entry(
    tx: &mut dyn LedgerTx,
    wishlist_entry_id: i32,
    user_id: i32,
) -> LedgerResult<WishlistEntry> {
    tx.find_wishlist_entry(wishlist_entry_id)
        .await?
        .filter(|entry| entry.user_id == user_id)
        .ok_or_else(|| {
            LedgerError::NotFound(format!("Wishlist entry {} not found", wishlist_entry_id))
        })
}
