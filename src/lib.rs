//! Libris Library Catalog Server
//!
//! A REST JSON API for a library catalog: borrowing and returning copies,
//! wishlists, inventory management and user roles. All copy-count changes go
//! through the [`services::LendingLedger`].

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult, LedgerError, LedgerResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
