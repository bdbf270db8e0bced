//! Core domain logic for OpsDesk.
//! This crate is the single source of truth for incident and runbook records.

pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock, Timestamp};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::incident::{
    Incident, IncidentId, IncidentNote, IncidentPatch, IncidentStatus, NewIncident, NewNote,
    Severity,
};
pub use model::runbook::{
    normalize_tags, parse_tag_input, NewRunbook, Runbook, RunbookId, RunbookPatch,
};
pub use model::state::{AppState, SCHEMA_VERSION};
pub use model::validation::ValidationError;
pub use repo::seed::seed_state;
pub use repo::state_repo::{
    KvStateRepository, MemorySlot, MemoryStateRepository, RepoError, RepoResult, SqliteSlot,
    SqliteStateRepository, StateRepository, StateSlot, STATE_KEY,
};
pub use search::filter::{
    filter_incidents, filter_runbooks, parse_choice, IncidentFilter, RunbookFilter,
};
pub use service::incident_service::IncidentService;
pub use service::runbook_service::RunbookService;
pub use service::EmbeddedStores;
pub use store::{
    DeleteOutcome, IncidentStore, RecordKind, RunbookStore, StoreError, StoreResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
