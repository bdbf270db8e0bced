//! Record stores backed by a remote OpsDesk server.

use crate::config::ClientConfig;
use crate::transport::{HttpTransport, Target};
use opsdesk_core::{
    Incident, IncidentId, IncidentPatch, IncidentStore, NewIncident, NewNote, NewRunbook,
    RecordKind, Runbook, RunbookId, RunbookPatch, RunbookStore, StoreResult,
};
use reqwest::Method;
use serde_json::{json, Value};

const NO_BODY: Option<&Value> = None;

/// Incident store speaking to `/api/v1/incidents`.
#[derive(Debug, Clone)]
pub struct RemoteIncidentStore {
    transport: HttpTransport,
}

impl RemoteIncidentStore {
    pub fn new(config: &ClientConfig) -> StoreResult<Self> {
        Ok(Self {
            transport: HttpTransport::new(config)?,
        })
    }
}

fn incident(id: IncidentId) -> Target {
    Target::record(RecordKind::Incident, id)
}

impl IncidentStore for RemoteIncidentStore {
    fn list(&self) -> StoreResult<Vec<Incident>> {
        self.transport.fetch(
            Method::GET,
            "/incidents",
            Target::collection(RecordKind::Incident),
            NO_BODY,
        )
    }

    fn get(&self, id: IncidentId) -> StoreResult<Incident> {
        self.transport
            .fetch(Method::GET, &format!("/incidents/{id}"), incident(id), NO_BODY)
    }

    fn create(&self, input: NewIncident) -> StoreResult<Incident> {
        self.transport.fetch(
            Method::POST,
            "/incidents",
            Target::collection(RecordKind::Incident),
            Some(&input),
        )
    }

    fn update(&self, id: IncidentId, patch: IncidentPatch) -> StoreResult<Incident> {
        self.transport.fetch(
            Method::PUT,
            &format!("/incidents/{id}"),
            incident(id),
            Some(&patch),
        )
    }

    fn add_note(&self, id: IncidentId, note: NewNote) -> StoreResult<Incident> {
        self.transport.fetch(
            Method::POST,
            &format!("/incidents/{id}/notes"),
            incident(id),
            Some(&note),
        )
    }

    fn delete(&self, id: IncidentId) -> StoreResult<()> {
        match self
            .transport
            .execute(Method::DELETE, &format!("/incidents/{id}"), incident(id))
        {
            Err(err) if err.is_not_found() => Ok(()),
            other => other,
        }
    }

    fn close(&self, id: IncidentId) -> StoreResult<Incident> {
        self.transport.fetch(
            Method::POST,
            &format!("/incidents/{id}/close"),
            incident(id),
            Some(&json!({})),
        )
    }

    fn reopen(&self, id: IncidentId) -> StoreResult<Incident> {
        self.transport.fetch(
            Method::POST,
            &format!("/incidents/{id}/reopen"),
            incident(id),
            Some(&json!({})),
        )
    }
}

/// Runbook store speaking to `/api/v1/runbooks`.
#[derive(Debug, Clone)]
pub struct RemoteRunbookStore {
    transport: HttpTransport,
}

impl RemoteRunbookStore {
    pub fn new(config: &ClientConfig) -> StoreResult<Self> {
        Ok(Self {
            transport: HttpTransport::new(config)?,
        })
    }
}

fn runbook(id: RunbookId) -> Target {
    Target::record(RecordKind::Runbook, id)
}

impl RunbookStore for RemoteRunbookStore {
    fn list(&self) -> StoreResult<Vec<Runbook>> {
        self.transport.fetch(
            Method::GET,
            "/runbooks",
            Target::collection(RecordKind::Runbook),
            NO_BODY,
        )
    }

    fn get(&self, id: RunbookId) -> StoreResult<Runbook> {
        self.transport
            .fetch(Method::GET, &format!("/runbooks/{id}"), runbook(id), NO_BODY)
    }

    fn create(&self, input: NewRunbook) -> StoreResult<Runbook> {
        self.transport.fetch(
            Method::POST,
            "/runbooks",
            Target::collection(RecordKind::Runbook),
            Some(&input),
        )
    }

    fn update(&self, id: RunbookId, patch: RunbookPatch) -> StoreResult<Runbook> {
        self.transport.fetch(
            Method::PUT,
            &format!("/runbooks/{id}"),
            runbook(id),
            Some(&patch),
        )
    }

    fn delete(&self, id: RunbookId) -> StoreResult<()> {
        match self
            .transport
            .execute(Method::DELETE, &format!("/runbooks/{id}"), runbook(id))
        {
            Err(err) if err.is_not_found() => Ok(()),
            other => other,
        }
    }
}

/// Builds both remote stores from one config.
pub fn connect(config: &ClientConfig) -> StoreResult<(RemoteIncidentStore, RemoteRunbookStore)> {
    Ok((
        RemoteIncidentStore::new(config)?,
        RemoteRunbookStore::new(config)?,
    ))
}
