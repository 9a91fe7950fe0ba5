//! In-process ledger store
//!
//! Units of work are serialized behind an owned async mutex and edit a private
//! copy of the state, which replaces the shared state only on commit. A
//! storage failure can be injected at any step with [`MemoryLedgerStore::fail_at`].

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OwnedMutexGuard;

use super::ledger::{LedgerStore, LedgerTx};
use crate::{
    error::{LedgerError, LedgerResult},
    models::{Book, Transaction, WishlistEntry},
};

/// Store steps at which a failure can be injected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Begin,
    TakeCopy,
    RestoreCopy,
    InsertTransaction,
    CloseTransaction,
    InsertWishlistEntry,
    DeleteWishlistEntry,
    Commit,
}

#[derive(Debug, Clone, Default)]
struct LedgerState {
    books: BTreeMap<i32, Book>,
    transactions: BTreeMap<i32, Transaction>,
    wishlists: BTreeMap<i32, WishlistEntry>,
    last_book_id: i32,
    last_transaction_id: i32,
    last_wishlist_id: i32,
}

#[derive(Clone, Default)]
pub struct MemoryLedgerStore {
    state: Arc<tokio::sync::Mutex<LedgerState>>,
    fail_at: Arc<Mutex<Option<StoreOp>>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next unit of work that reaches `op` fail with
    /// `StorageUnavailable`. The failure fires once.
    pub fn fail_at(&self, op: StoreOp) {
        if let Ok(mut slot) = self.fail_at.lock() {
            *slot = Some(op);
        }
    }

    pub async fn add_book(&self, title: &str, author: &str, category: &str, copies: i32) -> Book {
        let mut state = self.state.lock().await;
        state.last_book_id += 1;
        let book = Book {
            id: state.last_book_id,
            title: title.to_string(),
            author: author.to_string(),
            category: category.to_string(),
            available_copies: copies,
        };
        state.books.insert(book.id, book.clone());
        book
    }

    pub async fn book(&self, id: i32) -> Option<Book> {
        self.state.lock().await.books.get(&id).cloned()
    }

    pub async fn transactions(&self) -> Vec<Transaction> {
        self.state.lock().await.transactions.values().cloned().collect()
    }

    pub async fn wishlist_entries(&self) -> Vec<WishlistEntry> {
        self.state.lock().await.wishlists.values().cloned().collect()
    }
}

fn check_fault(fail_at: &Mutex<Option<StoreOp>>, op: StoreOp) -> LedgerResult<()> {
    let mut slot = fail_at
        .lock()
        .map_err(|_| LedgerError::StorageUnavailable("fault slot poisoned".to_string()))?;
    if *slot == Some(op) {
        *slot = None;
        return Err(LedgerError::StorageUnavailable(format!("injected failure at {:?}", op)));
    }
    Ok(())
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn begin(&self) -> LedgerResult<Box<dyn LedgerTx>> {
        check_fault(&self.fail_at, StoreOp::Begin)?;
        let guard = self.state.clone().lock_owned().await;
        let working = (*guard).clone();
        Ok(Box::new(MemoryLedgerTx {
            guard,
            working,
            fail_at: self.fail_at.clone(),
        }))
    }
}

struct MemoryLedgerTx {
    guard: OwnedMutexGuard<LedgerState>,
    working: LedgerState,
    fail_at: Arc<Mutex<Option<StoreOp>>>,
}

impl MemoryLedgerTx {
    fn check(&self, op: StoreOp) -> LedgerResult<()> {
        check_fault(&self.fail_at, op)
    }
}

#[async_trait]
impl LedgerTx for MemoryLedgerTx {
    async fn find_book(&mut self, id: i32) -> LedgerResult<Option<Book>> {
        Ok(self.working.books.get(&id).cloned())
    }

    async fn take_copy(&mut self, book_id: i32) -> LedgerResult<bool> {
        self.check(StoreOp::TakeCopy)?;
        match self.working.books.get_mut(&book_id) {
            Some(book) if book.available_copies > 0 => {
                book.available_copies -= 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn restore_copy(&mut self, book_id: i32) -> LedgerResult<()> {
        self.check(StoreOp::RestoreCopy)?;
        let book = self
            .working
            .books
            .get_mut(&book_id)
            .ok_or_else(|| LedgerError::NotFound(format!("Book with id {} not found", book_id)))?;
        book.available_copies += 1;
        Ok(())
    }

    async fn find_transaction(&mut self, id: i32) -> LedgerResult<Option<Transaction>> {
        Ok(self.working.transactions.get(&id).cloned())
    }

    async fn find_open_transaction(
        &mut self,
        user_id: i32,
        book_id: i32,
    ) -> LedgerResult<Option<Transaction>> {
        Ok(self
            .working
            .transactions
            .values()
            .find(|t| t.user_id == user_id && t.book_id == book_id && t.is_open())
            .cloned())
    }

    async fn insert_transaction(
        &mut self,
        user_id: i32,
        book_id: i32,
        borrowed_date: DateTime<Utc>,
    ) -> LedgerResult<Transaction> {
        self.check(StoreOp::InsertTransaction)?;
        if !self.working.books.contains_key(&book_id) {
            return Err(LedgerError::NotFound(format!("Book with id {} not found", book_id)));
        }
        self.working.last_transaction_id += 1;
        let transaction = Transaction {
            id: self.working.last_transaction_id,
            user_id,
            book_id,
            borrowed_date,
            return_date: None,
        };
        self.working.transactions.insert(transaction.id, transaction.clone());
        Ok(transaction)
    }

    async fn close_transaction(
        &mut self,
        id: i32,
        return_date: DateTime<Utc>,
    ) -> LedgerResult<Option<Transaction>> {
        self.check(StoreOp::CloseTransaction)?;
        match self.working.transactions.get_mut(&id) {
            Some(t) if t.is_open() => {
                t.return_date = Some(return_date);
                Ok(Some(t.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn find_wishlist_entry(&mut self, id: i32) -> LedgerResult<Option<WishlistEntry>> {
        Ok(self.working.wishlists.get(&id).cloned())
    }

    async fn find_wishlist_entry_for(
        &mut self,
        user_id: i32,
        book_id: i32,
    ) -> LedgerResult<Option<WishlistEntry>> {
        Ok(self
            .working
            .wishlists
            .values()
            .find(|w| w.user_id == user_id && w.book_id == book_id)
            .cloned())
    }

    async fn insert_wishlist_entry(
        &mut self,
        user_id: i32,
        book_id: i32,
        added_date: DateTime<Utc>,
    ) -> LedgerResult<WishlistEntry> {
        self.check(StoreOp::InsertWishlistEntry)?;
        self.working.last_wishlist_id += 1;
        let entry = WishlistEntry {
            id: self.working.last_wishlist_id,
            user_id,
            book_id,
            added_date,
        };
        self.working.wishlists.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn delete_wishlist_entry(&mut self, id: i32) -> LedgerResult<()> {
        self.check(StoreOp::DeleteWishlistEntry)?;
        self.working
            .wishlists
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| LedgerError::NotFound(format!("Wishlist entry {} not found", id)))
    }

    async fn commit(self: Box<Self>) -> LedgerResult<()> {
        self.check(StoreOp::Commit)?;
        let MemoryLedgerTx {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }
}
