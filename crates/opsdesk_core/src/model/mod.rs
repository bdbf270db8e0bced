//! Domain model for incidents, runbooks and the persisted document.
//!
//! # Responsibility
//! - Define the record shapes stored by the persistence layer.
//! - Define caller-side input shapes (`New*`, `*Patch`) and their validation.
//!
//! # Invariants
//! - `id`, `created_at` and note timestamps are assigned by stores only.
//! - `updated_at >= created_at` for every stored record.
//! - Deletion is a hard delete; there are no tombstones.

pub mod incident;
pub mod runbook;
pub mod state;
pub mod timestamp;
pub mod validation;
