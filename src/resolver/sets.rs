//! Expansion of set references into beatmap references.

use tracing::{debug, instrument, warn};

use super::{CatalogApi, ResolveError};

/// Expands set IDs into the beatmap IDs they contain.
pub struct SetResolver<'a> {
    api: &'a dyn CatalogApi,
}

impl<'a> SetResolver<'a> {
    /// Creates a resolver over the given catalog.
    #[must_use]
    pub fn new(api: &'a dyn CatalogApi) -> Self {
        Self { api }
    }

    /// Lists the beatmap IDs of `set_id`, in response order.
    ///
    /// Members without an ID are skipped with a warning. When the lookup
    /// fails and `ignore_invalid` is set, the failure is logged and an empty
    /// list is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::SetLookup`] when the lookup fails and
    /// `ignore_invalid` is not set.
    #[instrument(skip(self))]
    pub async fn resolve(&self, set_id: u32, ignore_invalid: bool) -> Result<Vec<u32>, ResolveError> {
        let summaries = match self.api.list_beatmaps_in_set(set_id).await {
            Ok(summaries) => summaries,
            Err(source) if ignore_invalid => {
                warn!(set_id, error = %source, "Ignoring set that could not be resolved");
                return Ok(Vec::new());
            }
            Err(source) => return Err(ResolveError::set_lookup(set_id, source)),
        };

        if summaries.is_empty() {
            warn!(set_id, "Set has no beatmaps");
            return Ok(Vec::new());
        }

        let mut beatmap_ids = Vec::with_capacity(summaries.len());
        for summary in summaries {
            match summary.beatmap_id {
                Some(id) => beatmap_ids.push(id),
                None => warn!(set_id, "Set member has no beatmap id, skipping"),
            }
        }
        debug!(set_id, count = beatmap_ids.len(), "set expanded");
        Ok(beatmap_ids)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::gateway::GatewayError;
    use crate::resolver::{BeatmapDetail, BeatmapSummary};

    struct FakeCatalog;

    #[async_trait]
    impl CatalogApi for FakeCatalog {
        async fn list_beatmaps_in_set(
            &self,
            set_id: u32,
        ) -> Result<Vec<BeatmapSummary>, GatewayError> {
            match set_id {
                123 => Ok(vec![
                    BeatmapSummary { beatmap_id: Some(1) },
                    BeatmapSummary { beatmap_id: None },
                    BeatmapSummary { beatmap_id: Some(2) },
                ]),
                7 => Ok(Vec::new()),
                _ => Err(GatewayError::status("https://x.test/beatmapsets", 404)),
            }
        }

        async fn get_beatmaps_by_ids(
            &self,
            _ids: &[u32],
        ) -> Result<Vec<BeatmapDetail>, GatewayError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_set_resolver_skips_members_without_id() {
        let api = FakeCatalog;
        let ids = SetResolver::new(&api).resolve(123, false).await.unwrap();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_set_resolver_empty_set() {
        let api = FakeCatalog;
        let ids = SetResolver::new(&api).resolve(7, false).await.unwrap();
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn test_set_resolver_failure_propagates() {
        let api = FakeCatalog;
        let err = SetResolver::new(&api).resolve(999, false).await.unwrap_err();
        assert!(matches!(err, ResolveError::SetLookup { set_id: 999, .. }));
    }

    #[tokio::test]
    async fn test_set_resolver_failure_ignored() {
        let api = FakeCatalog;
        let ids = SetResolver::new(&api).resolve(999, true).await.unwrap();
        assert!(ids.is_empty());
    }
}
