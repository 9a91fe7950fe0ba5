//! Read-only views over transactions and wishlists

use crate::{
    error::AppResult,
    models::{TransactionDetails, WishlistItem},
    repository::Repository,
};

#[derive(Clone)]
pub struct CirculationService {
    repository: Repository,
}

impl CirculationService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn user_transactions(&self, user_id: i32) -> AppResult<Vec<TransactionDetails>> {
        self.repository.transactions.list_for_user(user_id).await
    }

    pub async fn all_transactions(&self) -> AppResult<Vec<TransactionDetails>> {
        self.repository.transactions.list_all().await
    }

    pub async fn user_wishlist(&self, user_id: i32) -> AppResult<Vec<WishlistItem>> {
        self.repository.wishlists.list_for_user(user_id).await
    }

    pub async fn wishlist_count(&self, user_id: i32) -> AppResult<i64> {
        self.repository.wishlists.count_for_user(user_id).await
    }
}
