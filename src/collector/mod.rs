//! osu!collector collection dumps.
//!
//! osu!collector publishes curated collections with beatmap checksums
//! already attached, so dumps need no osu! API lookups or credentials.
//! Requests still go through a [`crate::gateway::PermitPool`].

mod client;
mod filter;

pub use client::{CollectorClient, DEFAULT_COLLECTOR_BASE, PAGE_SIZE, parse_collection_id};
pub use filter::{CollectorFilter, SortBy};

use thiserror::Error;

use crate::gateway::GatewayError;

/// Errors that can occur while dumping an osu!collector collection.
#[derive(Debug, Clone, Error)]
pub enum CollectorError {
    /// The collection ID or URL could not be understood
    #[error(
        "invalid osu!collector collection '{input}'\n  Suggestion: Pass a numeric ID or a URL ending in the ID, e.g. https://osucollector.com/collections/42"
    )]
    InvalidCollectionId {
        /// What the user supplied
        input: String,
    },

    /// The dump filter is unusable
    #[error("invalid filter: {reason}")]
    InvalidFilter {
        /// What is wrong with the filter
        reason: String,
    },

    /// The request to osu!collector failed
    #[error("osu!collector request failed: {0}")]
    Gateway(#[from] GatewayError),
}

impl CollectorError {
    /// Creates an `InvalidFilter` error.
    #[must_use]
    pub fn invalid_filter(reason: &str) -> Self {
        Self::InvalidFilter {
            reason: reason.to_string(),
        }
    }
}
