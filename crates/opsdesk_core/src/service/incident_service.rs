//! Embedded incident record store.
//!
//! # Invariants
//! - `list()` is sorted by `created_at DESC`; ties keep storage order, and
//!   new incidents are stored at the head.
//! - Every mutation sets `updated_at` strictly past its previous value.
//! - Notes are prepended with a timestamp not earlier than any prior note.

use crate::clock::{later_than, Clock, Timestamp};
use crate::model::incident::{
    Incident, IncidentId, IncidentNote, IncidentPatch, NewIncident, NewNote,
};
use crate::repo::state_repo::StateRepository;
use crate::service::fresh_id;
use crate::store::{IncidentStore, RecordKind, StoreError, StoreResult};
use log::info;
use std::sync::Arc;

/// Incident store over a state repository.
pub struct IncidentService<R: StateRepository> {
    repo: R,
    clock: Arc<dyn Clock>,
}

impl<R: StateRepository> IncidentService<R> {
    /// Creates a service using the provided repository and clock.
    pub fn new(repo: R, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// Applies `change` to one incident, stamps it and writes the document back.
    fn mutate<F>(&self, id: IncidentId, change: F) -> StoreResult<Incident>
    where
        F: FnOnce(&mut Incident, Timestamp),
    {
        let mut state = self.repo.load()?;
        let incident = state
            .incidents
            .iter_mut()
            .find(|incident| incident.id == id)
            .ok_or_else(|| StoreError::not_found(RecordKind::Incident, id))?;

        let stamp = later_than(self.clock.now(), incident.updated_at);
        change(incident, stamp);
        incident.updated_at = stamp;
        let updated = incident.clone();

        self.repo.save(&state)?;
        Ok(updated)
    }
}

impl<R: StateRepository> IncidentStore for IncidentService<R> {
    fn list(&self) -> StoreResult<Vec<Incident>> {
        let mut incidents = self.repo.load()?.incidents;
        incidents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(incidents)
    }

    fn get(&self, id: IncidentId) -> StoreResult<Incident> {
        self.repo
            .load()?
            .incidents
            .into_iter()
            .find(|incident| incident.id == id)
            .ok_or_else(|| StoreError::not_found(RecordKind::Incident, id))
    }

    fn create(&self, input: NewIncident) -> StoreResult<Incident> {
        let mut state = self.repo.load()?;
        let now = self.clock.now();
        let id = fresh_id(|candidate| {
            state
                .incidents
                .iter()
                .any(|incident| incident.id == candidate)
        });
        let incident = Incident {
            id,
            title: input.title,
            severity: input.severity,
            status: input.status,
            service: input.service,
            created_at: now,
            updated_at: now,
            notes: Vec::new(),
        };

        state.incidents.insert(0, incident.clone());
        self.repo.save(&state)?;
        info!(
            "event=incident_create module=service status=ok id={} severity={}",
            incident.id, incident.severity
        );
        Ok(incident)
    }

    fn update(&self, id: IncidentId, patch: IncidentPatch) -> StoreResult<Incident> {
        let updated = self.mutate(id, |incident, _| patch.apply_to(incident))?;
        info!(
            "event=incident_update module=service status=ok id={} incident_status={}",
            updated.id, updated.status
        );
        Ok(updated)
    }

    fn add_note(&self, id: IncidentId, note: NewNote) -> StoreResult<Incident> {
        let updated = self.mutate(id, |incident, stamp| {
            incident.notes.insert(
                0,
                IncidentNote {
                    timestamp: stamp,
                    author: note.author,
                    text: note.text,
                },
            );
        })?;
        info!(
            "event=incident_note module=service status=ok id={} notes={}",
            updated.id,
            updated.notes.len()
        );
        Ok(updated)
    }

    fn delete(&self, id: IncidentId) -> StoreResult<()> {
        let mut state = self.repo.load()?;
        let before = state.incidents.len();
        state.incidents.retain(|incident| incident.id != id);
        if state.incidents.len() == before {
            return Ok(());
        }

        self.repo.save(&state)?;
        info!("event=incident_delete module=service status=ok id={id}");
        Ok(())
    }
}
