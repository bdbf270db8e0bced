//! List-view filtering for incidents and runbooks.
//!
//! # Responsibility
//! - Compose search-term, status, severity, service and tag predicates.
//!
//! # Invariants
//! - Pure: never touches persistence, never reorders its input.
//! - All active predicates are combined with AND.
//! - Term matching is a case-insensitive substring match on the trimmed term;
//!   a blank term matches everything.

use crate::model::incident::{Incident, IncidentStatus, Severity};
use crate::model::runbook::Runbook;
use crate::model::validation::ValidationError;
use std::str::FromStr;

/// Filter for incident list views. `None` fields mean "All".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncidentFilter {
    pub term: Option<String>,
    pub status: Option<IncidentStatus>,
    pub severity: Option<Severity>,
    /// Exact service name.
    pub service: Option<String>,
}

impl IncidentFilter {
    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.term = Some(term.into());
        self
    }

    pub fn with_status(mut self, status: IncidentStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn matches(&self, incident: &Incident) -> bool {
        let matches_term = match normalized_term(self.term.as_deref()) {
            Some(term) => {
                contains_term(&incident.title, &term) || contains_term(&incident.service, &term)
            }
            None => true,
        };
        let matches_status = self.status.map_or(true, |status| incident.status == status);
        let matches_severity = self
            .severity
            .map_or(true, |severity| incident.severity == severity);
        let matches_service = self
            .service
            .as_deref()
            .map_or(true, |service| incident.service == service);

        matches_term && matches_status && matches_severity && matches_service
    }
}

/// Filter for runbook list views.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunbookFilter {
    pub term: Option<String>,
    /// Exact tag membership.
    pub tag: Option<String>,
}

impl RunbookFilter {
    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.term = Some(term.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn matches(&self, runbook: &Runbook) -> bool {
        let matches_term = match normalized_term(self.term.as_deref()) {
            Some(term) => {
                contains_term(&runbook.title, &term)
                    || runbook.tags.iter().any(|tag| contains_term(tag, &term))
            }
            None => true,
        };
        let matches_tag = self
            .tag
            .as_deref()
            .map_or(true, |tag| runbook.tags.iter().any(|value| value == tag));

        matches_term && matches_tag
    }
}

/// Returns the incidents matching `filter`, in input order.
pub fn filter_incidents(incidents: &[Incident], filter: &IncidentFilter) -> Vec<Incident> {
    incidents
        .iter()
        .filter(|incident| filter.matches(incident))
        .cloned()
        .collect()
}

/// Returns the runbooks matching `filter`, in input order.
pub fn filter_runbooks(runbooks: &[Runbook], filter: &RunbookFilter) -> Vec<Runbook> {
    runbooks
        .iter()
        .filter(|runbook| filter.matches(runbook))
        .cloned()
        .collect()
}

/// Parses a filter choice where blank or `All` (any case) means no filter.
pub fn parse_choice<T>(raw: Option<&str>) -> Result<Option<T>, ValidationError>
where
    T: FromStr<Err = ValidationError>,
{
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) if value.eq_ignore_ascii_case("all") => Ok(None),
        Some(value) => value.parse().map(Some),
    }
}

fn normalized_term(term: Option<&str>) -> Option<String> {
    let trimmed = term?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

fn contains_term(value: &str, lowered_term: &str) -> bool {
    value.to_lowercase().contains(lowered_term)
}
