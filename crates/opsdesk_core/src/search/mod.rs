//! Query/filter engine for list views.
//!
//! # Responsibility
//! - Narrow already-loaded record lists by search term and exact filters.
//! - Keep list-view matching rules in one place for every binding.

pub mod filter;
