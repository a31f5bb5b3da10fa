//! Error types for set and checksum resolution.

use thiserror::Error;

use crate::gateway::GatewayError;

/// Errors that can occur while resolving references through the API.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// Listing the beatmaps of a set failed
    #[error(
        "failed to list beatmaps of set {set_id}: {source}\n  Suggestion: Check the set ID, or pass --ignore-invalid-set-ids to skip sets that cannot be resolved"
    )]
    SetLookup {
        /// The set that could not be listed
        set_id: u32,
        /// Underlying gateway failure
        #[source]
        source: GatewayError,
    },

    /// Looking up one batch of beatmap IDs failed
    #[error(
        "failed to look up {} beatmap(s) ({}): {source}\n  Suggestion: Check the beatmap IDs, or pass --ignore-invalid-map-ids to skip batches that cannot be resolved",
        .ids.len(),
        id_range(.ids)
    )]
    BatchLookup {
        /// IDs in the failed batch
        ids: Vec<u32>,
        /// Underlying gateway failure
        #[source]
        source: GatewayError,
    },
}

impl ResolveError {
    /// Creates a `SetLookup` error.
    #[must_use]
    pub fn set_lookup(set_id: u32, source: GatewayError) -> Self {
        Self::SetLookup { set_id, source }
    }

    /// Creates a `BatchLookup` error.
    #[must_use]
    pub fn batch_lookup(ids: &[u32], source: GatewayError) -> Self {
        Self::BatchLookup {
            ids: ids.to_vec(),
            source,
        }
    }

    /// Returns the gateway failure behind this error.
    #[must_use]
    pub fn gateway_error(&self) -> &GatewayError {
        match self {
            Self::SetLookup { source, .. } | Self::BatchLookup { source, .. } => source,
        }
    }
}

fn id_range(ids: &[u32]) -> String {
    match ids {
        [] => "no IDs".to_string(),
        [only] => format!("ID {only}"),
        [first, .., last] => format!("IDs {first}..{last}"),
    }
}
