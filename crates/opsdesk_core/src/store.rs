//! Record store contracts shared by the embedded and remote bindings.
//!
//! # Responsibility
//! - Define `IncidentStore` / `RunbookStore`, implemented by the embedded
//!   services in [`crate::service`] and by the HTTP client crate.
//! - Define the failure taxonomy surfaced to callers.
//!
//! # Invariants
//! - `NotFound` is an ordinary outcome the caller must check, never a panic.
//! - Deleting a missing id succeeds.
//! - Every operation yields exactly one result.

use crate::model::incident::{
    Incident, IncidentId, IncidentPatch, IncidentStatus, NewIncident, NewNote,
};
use crate::model::runbook::{NewRunbook, Runbook, RunbookId, RunbookPatch};
use crate::repo::state_repo::RepoError;
use crate::search::filter::{filter_incidents, filter_runbooks, IncidentFilter, RunbookFilter};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

/// Record type named in errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Incident,
    Runbook,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Incident => "incident",
            Self::Runbook => "runbook",
        }
    }
}

impl Display for RecordKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure outcome of a record store operation.
#[derive(Debug)]
pub enum StoreError {
    /// Referenced id is absent from the collection.
    NotFound { kind: RecordKind, id: Uuid },
    /// Embedded binding could not reach the durable medium.
    Repo(RepoError),
    /// Remote binding could not complete the exchange (network, timeout, 5xx).
    Transport(String),
    /// Remote binding answered with an unexpected client error.
    Rejected { status: u16, message: String },
}

impl StoreError {
    pub fn not_found(kind: RecordKind, id: Uuid) -> Self {
        Self::NotFound { kind, id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Transport(message) => write!(f, "transport failure: {message}"),
            Self::Rejected { status, message } => {
                write!(f, "request rejected with status {status}: {message}")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Result of a confirmed delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The confirmation callback declined; nothing changed.
    Declined,
    /// The id was absent; nothing changed.
    Missing,
}

/// Incident record store.
pub trait IncidentStore {
    /// All incidents, most recently created first.
    fn list(&self) -> StoreResult<Vec<Incident>>;

    fn get(&self, id: IncidentId) -> StoreResult<Incident>;

    /// Creates an incident with a fresh id, `created_at == updated_at` and no notes.
    fn create(&self, input: NewIncident) -> StoreResult<Incident>;

    /// Merges the supplied fields and bumps `updated_at`.
    fn update(&self, id: IncidentId, patch: IncidentPatch) -> StoreResult<Incident>;

    /// Prepends a store-stamped note and bumps `updated_at`.
    fn add_note(&self, id: IncidentId, note: NewNote) -> StoreResult<Incident>;

    /// Removes the incident. Absent ids are a no-op.
    fn delete(&self, id: IncidentId) -> StoreResult<()>;

    fn close(&self, id: IncidentId) -> StoreResult<Incident> {
        self.update(id, IncidentPatch::status(IncidentStatus::Closed))
    }

    fn reopen(&self, id: IncidentId) -> StoreResult<Incident> {
        self.update(id, IncidentPatch::status(IncidentStatus::Open))
    }

    /// Flips Open/Closed through the `update` path.
    fn toggle_status(&self, id: IncidentId) -> StoreResult<Incident> {
        let current = self.get(id)?;
        self.update(id, IncidentPatch::status(current.status.toggled()))
    }

    /// Deletes only when `confirm` approves the current record.
    fn delete_with_confirmation(
        &self,
        id: IncidentId,
        confirm: &mut dyn FnMut(&Incident) -> bool,
    ) -> StoreResult<DeleteOutcome> {
        let incident = match self.get(id) {
            Ok(incident) => incident,
            Err(err) if err.is_not_found() => return Ok(DeleteOutcome::Missing),
            Err(err) => return Err(err),
        };
        if !confirm(&incident) {
            return Ok(DeleteOutcome::Declined);
        }
        self.delete(id)?;
        Ok(DeleteOutcome::Deleted)
    }

    /// Fresh `list()` snapshot narrowed by `filter`.
    fn search(&self, filter: &IncidentFilter) -> StoreResult<Vec<Incident>> {
        Ok(filter_incidents(&self.list()?, filter))
    }
}

/// Runbook record store.
pub trait RunbookStore {
    /// All runbooks, most recently updated first.
    fn list(&self) -> StoreResult<Vec<Runbook>>;

    fn get(&self, id: RunbookId) -> StoreResult<Runbook>;

    /// Creates a runbook. Tags are stored exactly as given.
    fn create(&self, input: NewRunbook) -> StoreResult<Runbook>;

    fn update(&self, id: RunbookId, patch: RunbookPatch) -> StoreResult<Runbook>;

    /// Removes the runbook. Absent ids are a no-op.
    fn delete(&self, id: RunbookId) -> StoreResult<()>;

    fn delete_with_confirmation(
        &self,
        id: RunbookId,
        confirm: &mut dyn FnMut(&Runbook) -> bool,
    ) -> StoreResult<DeleteOutcome> {
        let runbook = match self.get(id) {
            Ok(runbook) => runbook,
            Err(err) if err.is_not_found() => return Ok(DeleteOutcome::Missing),
            Err(err) => return Err(err),
        };
        if !confirm(&runbook) {
            return Ok(DeleteOutcome::Declined);
        }
        self.delete(id)?;
        Ok(DeleteOutcome::Deleted)
    }

    fn search(&self, filter: &RunbookFilter) -> StoreResult<Vec<Runbook>> {
        Ok(filter_runbooks(&self.list()?, filter))
    }
}
