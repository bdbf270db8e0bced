//! Incident domain model.
//!
//! # Responsibility
//! - Define the stored `Incident` / `IncidentNote` records.
//! - Define create/update/note inputs and their merge rules.
//!
//! # Invariants
//! - `notes` is ordered newest first and only ever grows at index 0.
//! - `IncidentPatch` can never touch `id`, `created_at` or `notes`.

use crate::clock::Timestamp;
use crate::model::validation::{require_optional_text, require_text, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier of an incident.
pub type IncidentId = Uuid;

/// Incident priority, `P1` being the most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    P1,
    P2,
    P3,
    P4,
}

impl Severity {
    pub const ALL: [Severity; 4] = [Self::P1, Self::P2, Self::P3, Self::P4];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::P1 => "P1",
            Self::P2 => "P2",
            Self::P3 => "P3",
            Self::P4 => "P4",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "P1" => Ok(Self::P1),
            "P2" => Ok(Self::P2),
            "P3" => Ok(Self::P3),
            "P4" => Ok(Self::P4),
            _ => Err(ValidationError::UnknownValue {
                field: "severity",
                value: value.to_string(),
            }),
        }
    }
}

/// Incident lifecycle state. There are no intermediate states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentStatus {
    #[default]
    Open,
    Closed,
}

impl IncidentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Closed => "Closed",
        }
    }

    /// Returns the opposite state.
    pub fn toggled(self) -> Self {
        match self {
            Self::Open => Self::Closed,
            Self::Closed => Self::Open,
        }
    }
}

impl Display for IncidentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncidentStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            _ => Err(ValidationError::UnknownValue {
                field: "status",
                value: value.to_string(),
            }),
        }
    }
}

/// Timestamped entry in an incident's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentNote {
    /// Assigned by the store when the note is appended.
    #[serde(with = "crate::model::timestamp")]
    pub timestamp: Timestamp,
    pub author: String,
    pub text: String,
}

/// Tracked operational problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: IncidentId,
    pub title: String,
    pub severity: Severity,
    pub status: IncidentStatus,
    pub service: String,
    #[serde(with = "crate::model::timestamp")]
    pub created_at: Timestamp,
    #[serde(with = "crate::model::timestamp")]
    pub updated_at: Timestamp,
    /// Newest first.
    pub notes: Vec<IncidentNote>,
}

/// Input for creating an incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIncident {
    pub title: String,
    pub service: String,
    pub severity: Severity,
    /// Defaults to `Open` when omitted on the wire.
    #[serde(default)]
    pub status: IncidentStatus,
}

impl NewIncident {
    pub fn new(
        title: impl Into<String>,
        service: impl Into<String>,
        severity: Severity,
        status: IncidentStatus,
    ) -> Self {
        Self {
            title: title.into(),
            service: service.into(),
            severity,
            status,
        }
    }

    /// Trims text fields the way form input is cleaned before submission.
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            service: self.service.trim().to_string(),
            ..self
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)?;
        require_text("service", &self.service)
    }
}

/// Partial update for an incident. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncidentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<IncidentStatus>,
}

impl IncidentPatch {
    /// Patch that only sets `status`.
    pub fn status(status: IncidentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.service.is_none()
            && self.severity.is_none()
            && self.status.is_none()
    }

    pub fn normalized(self) -> Self {
        Self {
            title: self.title.map(|value| value.trim().to_string()),
            service: self.service.map(|value| value.trim().to_string()),
            ..self
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_optional_text("title", self.title.as_deref())?;
        require_optional_text("service", self.service.as_deref())
    }

    /// Merges supplied fields into `incident`. Timestamps are the caller's job.
    pub fn apply_to(&self, incident: &mut Incident) {
        if let Some(title) = &self.title {
            incident.title = title.clone();
        }
        if let Some(service) = &self.service {
            incident.service = service.clone();
        }
        if let Some(severity) = self.severity {
            incident.severity = severity;
        }
        if let Some(status) = self.status {
            incident.status = status;
        }
    }
}

/// Input for appending a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNote {
    pub author: String,
    pub text: String,
}

impl NewNote {
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            text: text.into(),
        }
    }

    pub fn normalized(self) -> Self {
        Self {
            author: self.author.trim().to_string(),
            text: self.text.trim().to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("author", &self.author)?;
        require_text("text", &self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::{Incident, IncidentPatch, IncidentStatus, NewIncident, Severity};
    use crate::model::validation::ValidationError;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn sample_incident() -> Incident {
        let at = Utc.with_ymd_and_hms(2024, 8, 12, 9, 0, 0).unwrap();
        Incident {
            id: Uuid::new_v4(),
            title: "API timeout".to_string(),
            severity: Severity::P2,
            status: IncidentStatus::Open,
            service: "Gateway".to_string(),
            created_at: at,
            updated_at: at,
            notes: Vec::new(),
        }
    }

    #[test]
    fn severity_and_status_parse_case_insensitively() {
        assert_eq!("p3".parse::<Severity>().unwrap(), Severity::P3);
        assert_eq!("CLOSED".parse::<IncidentStatus>().unwrap(), IncidentStatus::Closed);
        assert!(matches!(
            "P9".parse::<Severity>(),
            Err(ValidationError::UnknownValue { field: "severity", .. })
        ));
    }

    #[test]
    fn toggled_flips_between_open_and_closed() {
        assert_eq!(IncidentStatus::Open.toggled(), IncidentStatus::Closed);
        assert_eq!(IncidentStatus::Closed.toggled(), IncidentStatus::Open);
    }

    #[test]
    fn empty_patch_changes_nothing() {
        let mut incident = sample_incident();
        let before = incident.clone();
        let patch = IncidentPatch::default();
        assert!(patch.is_empty());
        patch.apply_to(&mut incident);
        assert_eq!(incident, before);
    }

    #[test]
    fn patch_merges_only_supplied_fields() {
        let mut incident = sample_incident();
        let patch = IncidentPatch {
            severity: Some(Severity::P1),
            status: Some(IncidentStatus::Closed),
            ..IncidentPatch::default()
        };
        patch.apply_to(&mut incident);
        assert_eq!(incident.title, "API timeout");
        assert_eq!(incident.service, "Gateway");
        assert_eq!(incident.severity, Severity::P1);
        assert_eq!(incident.status, IncidentStatus::Closed);
    }

    #[test]
    fn new_incident_rejects_blank_service_after_normalization() {
        let input = NewIncident::new(" DB slow ", "   ", Severity::P1, IncidentStatus::Open)
            .normalized();
        assert_eq!(input.title, "DB slow");
        assert_eq!(input.validate(), Err(ValidationError::BlankField("service")));
    }

    #[test]
    fn new_incident_status_defaults_to_open_on_the_wire() {
        let input: NewIncident = serde_json::from_str(
            r#"{"title":"Checkout errors","service":"Payments","severity":"P1"}"#,
        )
        .unwrap();
        assert_eq!(input.status, IncidentStatus::Open);
    }
}
