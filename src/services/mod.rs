//! Business logic services

pub mod catalog;
pub mod circulation;
pub mod ledger;
pub mod users;

use std::sync::Arc;

use crate::repository::{LedgerStore, Repository};

pub use ledger::LendingLedger;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub circulation: circulation::CirculationService,
    pub ledger: LendingLedger,
    pub users: users::UsersService,
    pub repository: Repository,
}

impl Services {
    /// Create all services with the given repository. The ledger runs on
    /// the repository's PostgreSQL pool.
    pub fn new(repository: Repository) -> Self {
        let store = Arc::new(repository.ledger_store());
        Self::with_ledger_store(repository, store)
    }

    /// Create all services with a custom ledger store
    pub fn with_ledger_store(repository: Repository, store: Arc<dyn LedgerStore>) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            circulation: circulation::CirculationService::new(repository.clone()),
            ledger: LendingLedger::new(store),
            users: users::UsersService::new(repository.clone()),
            repository,
        }
    }
}
