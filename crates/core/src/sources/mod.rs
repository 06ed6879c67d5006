//! Inbound feeds: the bulk id listing, the offline catalog export and the
//! time-to-finish feed.
//!
//! Parsing is separate from fetching so feeds read from disk go through the
//! same code as feeds pulled over HTTP.

mod client;
mod types;

pub use client::SourceClient;
pub use types::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Failed to parse feed: {0}")]
    Parse(#[from] serde_json::Error),
}
