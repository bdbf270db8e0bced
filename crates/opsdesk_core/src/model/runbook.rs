//! Runbook domain model.
//!
//! # Responsibility
//! - Define the stored `Runbook` record and its create/update inputs.
//! - Provide tag-input normalization for boundary layers.
//!
//! # Invariants
//! - Stores persist `tags` exactly as given: order kept, duplicates kept.
//! - Tag cleanup (trim, drop empties) happens at the caller boundary.

use crate::clock::Timestamp;
use crate::model::validation::{require_optional_text, require_text, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a runbook.
pub type RunbookId = Uuid;

/// Tagged remediation document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Runbook {
    pub id: RunbookId,
    pub title: String,
    pub tags: Vec<String>,
    pub content: String,
    #[serde(with = "crate::model::timestamp")]
    pub created_at: Timestamp,
    #[serde(with = "crate::model::timestamp")]
    pub updated_at: Timestamp,
}

/// Input for creating a runbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRunbook {
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub content: String,
}

impl NewRunbook {
    pub fn new(title: impl Into<String>, tags: Vec<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            tags,
            content: content.into(),
        }
    }

    pub fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            tags: normalize_tags(self.tags),
            content: self.content.trim().to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)?;
        require_text("content", &self.content)?;
        validate_tags(&self.tags)
    }
}

/// Partial update for a runbook. `None` fields are left untouched;
/// `Some(vec![])` clears the tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunbookPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl RunbookPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.tags.is_none() && self.content.is_none()
    }

    pub fn normalized(self) -> Self {
        Self {
            title: self.title.map(|value| value.trim().to_string()),
            tags: self.tags.map(normalize_tags),
            content: self.content.map(|value| value.trim().to_string()),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_optional_text("title", self.title.as_deref())?;
        require_optional_text("content", self.content.as_deref())?;
        match &self.tags {
            Some(tags) => validate_tags(tags),
            None => Ok(()),
        }
    }

    /// Merges supplied fields into `runbook`. Timestamps are the caller's job.
    pub fn apply_to(&self, runbook: &mut Runbook) {
        if let Some(title) = &self.title {
            runbook.title = title.clone();
        }
        if let Some(tags) = &self.tags {
            runbook.tags = tags.clone();
        }
        if let Some(content) = &self.content {
            runbook.content = content.clone();
        }
    }
}

/// Splits comma-separated tag input, trims entries and drops empty ones.
///
/// `"database, failover,,  "` -> `["database", "failover"]`.
pub fn parse_tag_input(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Trims tags and drops empty entries, keeping order and duplicates.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.iter().any(|tag| tag.trim().is_empty()) {
        return Err(ValidationError::BlankTag);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{normalize_tags, parse_tag_input, NewRunbook, RunbookPatch};
    use crate::model::validation::ValidationError;

    #[test]
    fn parse_tag_input_trims_and_drops_empty_entries() {
        assert_eq!(
            parse_tag_input("database, failover,,  ,postgres "),
            vec!["database", "failover", "postgres"]
        );
        assert!(parse_tag_input("  ").is_empty());
    }

    #[test]
    fn normalize_tags_keeps_order_and_duplicates() {
        let tags = vec![" cache".to_string(), "redis".to_string(), "cache ".to_string()];
        assert_eq!(normalize_tags(tags), vec!["cache", "redis", "cache"]);
    }

    #[test]
    fn validate_rejects_blank_tags_before_normalization() {
        let input = NewRunbook::new("Cache", vec!["  ".to_string()], "steps");
        assert_eq!(input.validate(), Err(ValidationError::BlankTag));
        assert!(input.normalized().validate().is_ok());
    }

    #[test]
    fn patch_with_empty_tag_list_is_not_empty() {
        let patch = RunbookPatch {
            tags: Some(Vec::new()),
            ..RunbookPatch::default()
        };
        assert!(!patch.is_empty());
        assert!(RunbookPatch::default().is_empty());
    }
}
