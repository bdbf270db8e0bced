//! Persisted document shape.
//!
//! The whole application state is stored as one JSON document under a fixed
//! key. Stores read it, mutate a copy and write the full document back.

use crate::model::incident::Incident;
use crate::model::runbook::Runbook;
use serde::{Deserialize, Serialize};

/// Schema version compiled into this build.
///
/// A stored document with any other version is discarded and reseeded.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete persisted state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub schema_version: u32,
    pub incidents: Vec<Incident>,
    pub runbooks: Vec<Runbook>,
}

impl AppState {
    /// Empty state at the current schema version.
    pub fn empty() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            incidents: Vec::new(),
            runbooks: Vec::new(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::empty()
    }
}
