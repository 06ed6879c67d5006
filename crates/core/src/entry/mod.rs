//! Per-app metadata record.
//!
//! An [`Entry`] is created on first sight of an id (bulk listing, catalog
//! feed or page scrape) with every field at its default, and is afterwards
//! only mutated through [`crate::merge::merge_into`] or the collection's
//! ingest operations.

mod types;

pub use types::*;
