//! [`CatalogApi`] over the osu! API v2.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::{BeatmapDetail, BeatmapSummary, CatalogApi};
use crate::gateway::{Gateway, GatewayError};

/// `GET /beatmapsets/{id}` response, reduced to what resolution needs.
#[derive(Debug, Deserialize)]
struct BeatmapsetResponse {
    #[serde(default)]
    beatmaps: Option<Vec<RawBeatmap>>,
}

/// `GET /beatmaps?ids[]=..` response.
#[derive(Debug, Deserialize)]
struct BeatmapsResponse {
    #[serde(default)]
    beatmaps: Vec<RawBeatmap>,
}

#[derive(Debug, Deserialize)]
struct RawBeatmap {
    #[serde(default)]
    id: Option<u32>,
    #[serde(default)]
    checksum: Option<String>,
}

/// osu! API client implementing [`CatalogApi`].
#[derive(Debug)]
pub struct OsuApi {
    gateway: Gateway,
}

impl OsuApi {
    /// Wraps a gateway.
    #[must_use]
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Returns the underlying gateway.
    #[must_use]
    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }
}

#[async_trait]
impl CatalogApi for OsuApi {
    #[instrument(skip(self))]
    async fn list_beatmaps_in_set(&self, set_id: u32) -> Result<Vec<BeatmapSummary>, GatewayError> {
        let set_id_segment = set_id.to_string();
        let response: BeatmapsetResponse = self
            .gateway
            .get_json(&["beatmapsets", &set_id_segment], &[])
            .await?;

        let beatmaps = response.beatmaps.unwrap_or_default();
        debug!(set_id, count = beatmaps.len(), "set listed");
        Ok(beatmaps
            .into_iter()
            .map(|raw| BeatmapSummary { beatmap_id: raw.id })
            .collect())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn get_beatmaps_by_ids(&self, ids: &[u32]) -> Result<Vec<BeatmapDetail>, GatewayError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query: Vec<(&str, String)> = ids.iter().map(|id| ("ids[]", id.to_string())).collect();
        let response: BeatmapsResponse = self.gateway.get_json(&["beatmaps"], &query).await?;

        let mut details = Vec::with_capacity(response.beatmaps.len());
        for raw in response.beatmaps {
            match (raw.id, raw.checksum) {
                (Some(beatmap_id), Some(checksum)) => details.push(BeatmapDetail {
                    beatmap_id,
                    checksum,
                }),
                (Some(beatmap_id), None) => {
                    warn!(beatmap_id, "Beatmap in response has no checksum, skipping");
                }
                (None, _) => warn!("Beatmap in response has no id, skipping"),
            }
        }
        Ok(details)
    }
}
