//! Persistence layer: the only code with access to the durable medium.
//!
//! # Responsibility
//! - Load and save the whole `AppState` document.
//! - Reseed silently (with a warning log) when the stored document cannot be used.
//!
//! # Invariants
//! - Record stores only see copies returned by `load()` and hand back full
//!   documents to `save()`.

pub mod seed;
pub mod state_repo;
