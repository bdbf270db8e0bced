//! Embedded record stores.
//!
//! # Responsibility
//! - Implement [`crate::store::IncidentStore`] and [`crate::store::RunbookStore`]
//!   as read-modify-write cycles over a [`crate::repo::state_repo::StateRepository`].
//!
//! # Invariants
//! - No in-memory cache survives across calls; every call starts from `load()`.
//! - Every mutation writes back the full document.
//! - Ids, `created_at` and note timestamps come from the store, never the caller.

pub mod incident_service;
pub mod runbook_service;

use crate::clock::Clock;
use crate::repo::state_repo::StateRepository;
use incident_service::IncidentService;
use runbook_service::RunbookService;
use std::sync::Arc;
use uuid::Uuid;

/// Both embedded stores sharing one repository.
pub struct EmbeddedStores<R: StateRepository> {
    pub incidents: IncidentService<Arc<R>>,
    pub runbooks: RunbookService<Arc<R>>,
}

impl<R: StateRepository> EmbeddedStores<R> {
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self {
            incidents: IncidentService::new(Arc::clone(&repo), Arc::clone(&clock)),
            runbooks: RunbookService::new(repo, clock),
        }
    }
}

/// Generates a v4 id not already present in the collection.
pub(crate) fn fresh_id(is_taken: impl Fn(Uuid) -> bool) -> Uuid {
    loop {
        let candidate = Uuid::new_v4();
        if !is_taken(candidate) {
            return candidate;
        }
    }
}
