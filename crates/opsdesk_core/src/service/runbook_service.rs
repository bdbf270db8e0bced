//! Embedded runbook record store.
//!
//! # Invariants
//! - `list()` is sorted by `updated_at DESC`.
//! - Tags are persisted exactly as supplied.

use crate::clock::{later_than, Clock};
use crate::model::runbook::{NewRunbook, Runbook, RunbookId, RunbookPatch};
use crate::repo::state_repo::StateRepository;
use crate::service::fresh_id;
use crate::store::{RecordKind, RunbookStore, StoreError, StoreResult};
use log::info;
use std::sync::Arc;

/// Runbook store over a state repository.
pub struct RunbookService<R: StateRepository> {
    repo: R,
    clock: Arc<dyn Clock>,
}

impl<R: StateRepository> RunbookService<R> {
    pub fn new(repo: R, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }
}

impl<R: StateRepository> RunbookStore for RunbookService<R> {
    fn list(&self) -> StoreResult<Vec<Runbook>> {
        let mut runbooks = self.repo.load()?.runbooks;
        runbooks.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(runbooks)
    }

    fn get(&self, id: RunbookId) -> StoreResult<Runbook> {
        self.repo
            .load()?
            .runbooks
            .into_iter()
            .find(|runbook| runbook.id == id)
            .ok_or_else(|| StoreError::not_found(RecordKind::Runbook, id))
    }

    fn create(&self, input: NewRunbook) -> StoreResult<Runbook> {
        let mut state = self.repo.load()?;
        let now = self.clock.now();
        let id = fresh_id(|candidate| state.runbooks.iter().any(|runbook| runbook.id == candidate));
        let runbook = Runbook {
            id,
            title: input.title,
            tags: input.tags,
            content: input.content,
            created_at: now,
            updated_at: now,
        };

        state.runbooks.insert(0, runbook.clone());
        self.repo.save(&state)?;
        info!("event=runbook_create module=service status=ok id={}", runbook.id);
        Ok(runbook)
    }

    fn update(&self, id: RunbookId, patch: RunbookPatch) -> StoreResult<Runbook> {
        let mut state = self.repo.load()?;
        let runbook = state
            .runbooks
            .iter_mut()
            .find(|runbook| runbook.id == id)
            .ok_or_else(|| StoreError::not_found(RecordKind::Runbook, id))?;

        patch.apply_to(runbook);
        runbook.updated_at = later_than(self.clock.now(), runbook.updated_at);
        let updated = runbook.clone();

        self.repo.save(&state)?;
        info!("event=runbook_update module=service status=ok id={id}");
        Ok(updated)
    }

    fn delete(&self, id: RunbookId) -> StoreResult<()> {
        let mut state = self.repo.load()?;
        let before = state.runbooks.len();
        state.runbooks.retain(|runbook| runbook.id != id);
        if state.runbooks.len() == before {
            return Ok(());
        }

        self.repo.save(&state)?;
        info!("event=runbook_delete module=service status=ok id={id}");
        Ok(())
    }
}
