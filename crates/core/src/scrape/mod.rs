//! Batch scraping of store pages into the collection.
//!
//! Fetch and extraction fan out over a bounded worker pool; only the merge
//! itself takes the collection's write lock. Cancellation is cooperative:
//! work that has not started is skipped and results that arrive after the
//! cancel are discarded instead of merged.

mod registry;
mod runner;
mod types;

pub use registry::BatchRegistry;
pub use runner::ScrapeRunner;
pub use types::{BatchHandle, BatchReport, BatchSnapshot, BatchStatus, IdOutcome, ScrapeSettings};
