//! Data models for Libris

pub mod book;
pub mod transaction;
pub mod user;
pub mod wishlist;

// Re-export commonly used types
pub use book::Book;
pub use transaction::{Transaction, TransactionDetails};
pub use user::{has_role, Role, User, UserClaims};
pub use wishlist::{WishlistEntry, WishlistItem};
