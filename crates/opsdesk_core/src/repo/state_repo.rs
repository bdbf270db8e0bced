//! State repository: the persistence adapter for the whole document.
//!
//! # Responsibility
//! - Read and write the single `AppState` document under a fixed key.
//! - Reset to the seed dataset when the stored document is missing,
//!   unreadable or carries a different `schemaVersion`.
//!
//! # Invariants
//! - This module is the only code that touches the durable medium.
//! - `load()` never reports a corrupt document; it logs, reseeds, persists
//!   the seed and returns it.
//! - `save()` replaces the whole document in one slot write, and refuses a
//!   document in which two records share an id.

use crate::clock::{Clock, Timestamp};
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::state::{AppState, SCHEMA_VERSION};
use crate::repo::seed::seed_state;
use log::{debug, info, warn};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Key the document lives under.
pub const STATE_KEY: &str = "opsdesk-state";

pub type RepoResult<T> = Result<T, RepoError>;

/// Builds the fallback document relative to the current time.
pub type SeedFn = fn(Timestamp) -> AppState;

/// Durable-medium failure. Corrupt documents are not errors.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Encode(serde_json::Error),
    /// Refused to write a document in which two records share this id.
    DuplicateId(Uuid),
    /// A previous writer panicked while holding the slot.
    LockPoisoned,
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode state document: {err}"),
            Self::DuplicateId(id) => write!(f, "state document repeats record id {id}"),
            Self::LockPoisoned => write!(f, "state slot lock poisoned"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::DuplicateId(_) | Self::LockPoisoned => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence adapter contract used by record stores.
pub trait StateRepository: Send + Sync {
    /// Returns the stored document, reseeding when it is absent or invalid.
    fn load(&self) -> RepoResult<AppState>;
    /// Overwrites the stored document.
    fn save(&self, state: &AppState) -> RepoResult<()>;
}

impl<R: StateRepository + ?Sized> StateRepository for Arc<R> {
    fn load(&self) -> RepoResult<AppState> {
        (**self).load()
    }

    fn save(&self, state: &AppState) -> RepoResult<()> {
        (**self).save(state)
    }
}

impl<R: StateRepository + ?Sized> StateRepository for &R {
    fn load(&self) -> RepoResult<AppState> {
        (**self).load()
    }

    fn save(&self, state: &AppState) -> RepoResult<()> {
        (**self).save(state)
    }
}

/// Raw keyed storage holding serialized documents.
pub trait StateSlot: Send + Sync {
    fn read(&self, key: &str) -> RepoResult<Option<String>>;
    fn write(&self, key: &str, value: &str) -> RepoResult<()>;
}

/// SQLite-backed slot storing documents in the `kv_store` table.
pub struct SqliteSlot {
    conn: Mutex<Connection>,
}

impl SqliteSlot {
    /// Wraps a migrated connection (see [`crate::db::open_db`]).
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn conn(&self) -> RepoResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| RepoError::LockPoisoned)
    }
}

impl StateSlot for SqliteSlot {
    fn read(&self, key: &str) -> RepoResult<Option<String>> {
        let conn = self.conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write(&self, key: &str, value: &str) -> RepoResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }
}

/// Process-local slot, for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemorySlot {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateSlot for MemorySlot {
    fn read(&self, key: &str) -> RepoResult<Option<String>> {
        let entries = self.entries.lock().map_err(|_| RepoError::LockPoisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> RepoResult<()> {
        let mut entries = self.entries.lock().map_err(|_| RepoError::LockPoisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Why a stored document was discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetReason {
    Missing,
    Corrupt(String),
    VersionMismatch { found: Option<u64> },
}

impl Display for ResetReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "missing"),
            Self::Corrupt(message) => write!(f, "corrupt ({message})"),
            Self::VersionMismatch { found: Some(found) } => {
                write!(f, "version_mismatch (found {found}, expected {SCHEMA_VERSION})")
            }
            Self::VersionMismatch { found: None } => {
                write!(f, "version_mismatch (no schemaVersion, expected {SCHEMA_VERSION})")
            }
        }
    }
}

/// Parses a raw document, reporting why it cannot be used.
pub fn decode_state(raw: Option<&str>) -> Result<AppState, ResetReason> {
    let Some(raw) = raw else {
        return Err(ResetReason::Missing);
    };

    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|err| ResetReason::Corrupt(err.to_string()))?;
    let found = value.get("schemaVersion").and_then(serde_json::Value::as_u64);
    if found != Some(u64::from(SCHEMA_VERSION)) {
        return Err(ResetReason::VersionMismatch { found });
    }

    serde_json::from_value(value).map_err(|err| ResetReason::Corrupt(err.to_string()))
}

fn ensure_unique_ids(state: &AppState) -> RepoResult<()> {
    let mut seen = HashSet::new();
    let ids = state
        .incidents
        .iter()
        .map(|incident| incident.id)
        .chain(state.runbooks.iter().map(|runbook| runbook.id));
    for id in ids {
        if !seen.insert(id) {
            return Err(RepoError::DuplicateId(id));
        }
    }
    Ok(())
}

/// [`StateRepository`] over any keyed [`StateSlot`].
pub struct KvStateRepository<S: StateSlot> {
    slot: S,
    key: String,
    clock: Arc<dyn Clock>,
    seed: SeedFn,
}

/// Embedded SQLite binding.
pub type SqliteStateRepository = KvStateRepository<SqliteSlot>;

/// In-memory binding.
pub type MemoryStateRepository = KvStateRepository<MemorySlot>;

impl<S: StateSlot> KvStateRepository<S> {
    /// Creates a repository storing under [`STATE_KEY`] with the default seed.
    pub fn new(slot: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            slot,
            key: STATE_KEY.to_string(),
            clock,
            seed: seed_state,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_seed(mut self, seed: SeedFn) -> Self {
        self.seed = seed;
        self
    }

    /// Underlying slot, for inspection and fault injection in tests.
    pub fn slot(&self) -> &S {
        &self.slot
    }

    fn write_state(&self, state: &AppState) -> RepoResult<()> {
        let payload = serde_json::to_string(state).map_err(RepoError::Encode)?;
        self.slot.write(&self.key, &payload)
    }
}

impl SqliteStateRepository {
    /// Opens (or creates) a SQLite file and wraps it in a repository.
    pub fn open(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> RepoResult<Self> {
        let conn = open_db(path)?;
        Ok(Self::new(SqliteSlot::new(conn), clock))
    }

    /// Opens a private in-memory SQLite database.
    pub fn open_in_memory(clock: Arc<dyn Clock>) -> RepoResult<Self> {
        let conn = open_db_in_memory()?;
        Ok(Self::new(SqliteSlot::new(conn), clock))
    }
}

impl MemoryStateRepository {
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self::new(MemorySlot::new(), clock)
    }
}

impl<S: StateSlot> StateRepository for KvStateRepository<S> {
    fn load(&self) -> RepoResult<AppState> {
        let raw = self.slot.read(&self.key)?;
        match decode_state(raw.as_deref()) {
            Ok(state) => {
                debug!(
                    "event=state_load module=repo status=ok incidents={} runbooks={}",
                    state.incidents.len(),
                    state.runbooks.len()
                );
                Ok(state)
            }
            Err(reason) => {
                if reason == ResetReason::Missing {
                    info!("event=state_reseed module=repo status=seeded reason={reason}");
                } else {
                    warn!("event=state_reseed module=repo status=reset reason={reason}");
                }
                let state = (self.seed)(self.clock.now());
                self.write_state(&state)?;
                Ok(state)
            }
        }
    }

    fn save(&self, state: &AppState) -> RepoResult<()> {
        if let Err(err) = ensure_unique_ids(state) {
            warn!("event=state_save module=repo status=rejected error={err}");
            return Err(err);
        }
        self.write_state(state)?;
        debug!(
            "event=state_save module=repo status=ok incidents={} runbooks={}",
            state.incidents.len(),
            state.runbooks.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_state, ensure_unique_ids, RepoError, ResetReason};
    use crate::model::state::AppState;

    #[test]
    fn decode_reports_missing_document() {
        assert_eq!(decode_state(None), Err(ResetReason::Missing));
    }

    #[test]
    fn decode_reports_malformed_json_as_corrupt() {
        assert!(matches!(
            decode_state(Some("not-json")),
            Err(ResetReason::Corrupt(_))
        ));
    }

    #[test]
    fn decode_checks_version_before_shape() {
        let stale = r#"{"schemaVersion":0,"items":[]}"#;
        assert_eq!(
            decode_state(Some(stale)),
            Err(ResetReason::VersionMismatch { found: Some(0) })
        );
        assert_eq!(
            decode_state(Some("{}")),
            Err(ResetReason::VersionMismatch { found: None })
        );
    }

    #[test]
    fn decode_rejects_wrong_shape_at_current_version() {
        let wrong = r#"{"schemaVersion":1,"incidents":"nope","runbooks":[]}"#;
        assert!(matches!(
            decode_state(Some(wrong)),
            Err(ResetReason::Corrupt(_))
        ));
    }

    #[test]
    fn decode_keeps_documents_with_repeated_ids() {
        let id = "11111111-2222-4333-8444-555555555555";
        let doc = format!(
            r#"{{"schemaVersion":1,"incidents":[],"runbooks":[
                {{"id":"{id}","title":"a","tags":[],"content":"x","createdAt":"2024-08-12T09:00:00.000Z","updatedAt":"2024-08-12T09:00:00.000Z"}},
                {{"id":"{id}","title":"b","tags":[],"content":"y","createdAt":"2024-08-12T09:00:00.000Z","updatedAt":"2024-08-12T09:00:00.000Z"}}
            ]}}"#
        );
        let state = decode_state(Some(&doc)).unwrap();
        assert_eq!(state.runbooks.len(), 2);
        assert_eq!(state.runbooks[1].title, "b");
    }

    #[test]
    fn unique_id_check_spans_both_collections() {
        let mut state = decode_state(Some(
            r#"{"schemaVersion":1,"incidents":[],"runbooks":[
                {"id":"11111111-2222-4333-8444-555555555555","title":"a","tags":[],"content":"x","createdAt":"2024-08-12T09:00:00.000Z","updatedAt":"2024-08-12T09:00:00.000Z"}
            ]}"#,
        ))
        .unwrap();
        assert!(ensure_unique_ids(&state).is_ok());
        assert!(ensure_unique_ids(&AppState::empty()).is_ok());

        let copy = state.runbooks[0].clone();
        state.runbooks.push(copy.clone());
        assert!(matches!(
            ensure_unique_ids(&state),
            Err(RepoError::DuplicateId(id)) if id == copy.id
        ));
    }

    #[test]
    fn decode_accepts_empty_current_document() {
        let state = decode_state(Some(r#"{"schemaVersion":1,"incidents":[],"runbooks":[]}"#))
            .unwrap();
        assert!(state.incidents.is_empty());
        assert!(state.runbooks.is_empty());
    }
}
