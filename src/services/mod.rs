//! Business logic services

pub mod catalog;
pub mod circulation;
pub mod ids;
pub mod members;

use std::sync::Arc;

use crate::{error::AppResult, repository::Repository};
use ids::IdSequence;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub members: members::MembersService,
    pub circulation: circulation::CirculationService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository, seeding each id
    /// sequence from the highest id already stored
    pub async fn new(repository: Repository) -> AppResult<Self> {
        let book_ids = IdSequence::starting_after(repository.books.max_id().await?.unwrap_or(0));
        let member_ids = IdSequence::starting_after(repository.members.max_id().await?.unwrap_or(0));
        let borrow_ids = IdSequence::starting_after(repository.borrows.max_id().await?.unwrap_or(0));

        tracing::debug!(
            books = book_ids.last(),
            members = member_ids.last(),
            borrows = borrow_ids.last(),
            "Id sequences seeded"
        );

        Ok(Self {
            catalog: catalog::CatalogService::new(repository.clone(), Arc::new(book_ids)),
            members: members::MembersService::new(repository.clone(), Arc::new(member_ids)),
            circulation: circulation::CirculationService::new(repository.clone(), Arc::new(borrow_ids)),
            repository,
        })
    }

    /// Check that the storage layer is reachable
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}
