//! Resolution of set and beatmap references into beatmap checksums.
//!
//! # Architecture
//!
//! - [`CatalogApi`] - async trait over the two catalog lookups the resolvers need
//! - [`OsuApi`] - [`CatalogApi`] backed by the osu! API through a [`crate::gateway::Gateway`]
//! - [`SetResolver`] - expands one set ID into its beatmap IDs
//! - [`ChecksumResolver`] - turns beatmap IDs into checksums, at most
//!   [`MAX_IDS_PER_REQUEST`] per call

mod checksums;
mod error;
mod osu_api;
mod sets;

pub use checksums::{ChecksumResolver, MAX_IDS_PER_REQUEST};
pub use error::ResolveError;
pub use osu_api::OsuApi;
pub use sets::SetResolver;

use async_trait::async_trait;

use crate::gateway::GatewayError;

/// Minimal identity of a beatmap listed as a member of a set.
///
/// `beatmap_id` is `None` when the service omitted it; callers skip those.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeatmapSummary {
    /// Beatmap ID, if present in the response
    pub beatmap_id: Option<u32>,
}

/// A beatmap with its content checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeatmapDetail {
    /// Beatmap ID
    pub beatmap_id: u32,
    /// 32-character hex content checksum
    pub checksum: String,
}

/// The catalog lookups needed to resolve references.
///
/// This trait uses `async_trait` so resolvers can hold `&dyn CatalogApi`.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Lists the beatmaps belonging to a set.
    async fn list_beatmaps_in_set(&self, set_id: u32) -> Result<Vec<BeatmapSummary>, GatewayError>;

    /// Returns beatmap details for up to [`MAX_IDS_PER_REQUEST`] IDs.
    ///
    /// IDs the service does not know are simply absent from the result.
    async fn get_beatmaps_by_ids(&self, ids: &[u32]) -> Result<Vec<BeatmapDetail>, GatewayError>;
}
