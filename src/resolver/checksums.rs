//! Batched resolution of beatmap IDs into checksums.

use std::collections::HashSet;

use tracing::{debug, info, instrument, warn};

use super::{BeatmapDetail, CatalogApi, ResolveError};

/// Most beatmap IDs the service accepts in one lookup.
pub const MAX_IDS_PER_REQUEST: usize = 50;

/// Resolves beatmap IDs into [`BeatmapDetail`]s in batches.
pub struct ChecksumResolver<'a> {
    api: &'a dyn CatalogApi,
}

impl<'a> ChecksumResolver<'a> {
    /// Creates a resolver over the given catalog.
    #[must_use]
    pub fn new(api: &'a dyn CatalogApi) -> Self {
        Self { api }
    }

    /// Looks up every distinct ID in `ids`, [`MAX_IDS_PER_REQUEST`] per call.
    ///
    /// IDs are deduplicated in first-seen order before batching, and results
    /// are concatenated in batch order. IDs missing from a response are
    /// dropped with a warning. When a batch fails and `ignore_invalid` is
    /// set, that batch is skipped and the rest are still resolved.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::BatchLookup`] for the first failing batch when
    /// `ignore_invalid` is not set.
    #[instrument(skip(self, ids), fields(requested = ids.len()))]
    pub async fn resolve(
        &self,
        ids: &[u32],
        ignore_invalid: bool,
    ) -> Result<Vec<BeatmapDetail>, ResolveError> {
        let mut seen = HashSet::with_capacity(ids.len());
        let unique: Vec<u32> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();
        if unique.is_empty() {
            return Ok(Vec::new());
        }

        let batch_count = unique.len().div_ceil(MAX_IDS_PER_REQUEST);
        info!(
            ids = unique.len(),
            batches = batch_count,
            "Resolving beatmap checksums"
        );

        let mut details = Vec::with_capacity(unique.len());
        for (index, batch) in unique.chunks(MAX_IDS_PER_REQUEST).enumerate() {
            let batch_number = index + 1;
            let found = match self.api.get_beatmaps_by_ids(batch).await {
                Ok(found) => found,
                Err(source) if ignore_invalid => {
                    warn!(
                        batch = batch_number,
                        size = batch.len(),
                        error = %source,
                        "Ignoring beatmap batch that could not be resolved"
                    );
                    continue;
                }
                Err(source) => return Err(ResolveError::batch_lookup(batch, source)),
            };

            let returned: HashSet<u32> = found.iter().map(|d| d.beatmap_id).collect();
            for missing in batch.iter().filter(|id| !returned.contains(*id)) {
                warn!(beatmap_id = missing, "Beatmap not returned by the API, skipping");
            }
            debug!(
                batch = batch_number,
                requested = batch.len(),
                returned = found.len(),
                "batch resolved"
            );
            details.extend(found);
        }
        Ok(details)
    }
}
