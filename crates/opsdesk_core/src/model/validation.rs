//! Caller-side input validation.
//!
//! Stores never validate: boundary layers (HTTP handlers, CLI) call
//! `validate()` on input models and reject the request before any store
//! operation runs.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Input rejected before reaching a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is empty or whitespace-only.
    BlankField(&'static str),
    /// A runbook tag is empty or whitespace-only.
    BlankTag,
    /// Text does not name a known enum value.
    UnknownValue { field: &'static str, value: String },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "`{field}` must not be blank"),
            Self::BlankTag => write!(f, "tags must not contain blank entries"),
            Self::UnknownValue { field, value } => {
                write!(f, "unknown {field} value `{value}`")
            }
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    Ok(())
}

pub(crate) fn require_optional_text(
    field: &'static str,
    value: Option<&str>,
) -> Result<(), ValidationError> {
    match value {
        Some(text) => require_text(field, text),
        None => Ok(()),
    }
}
