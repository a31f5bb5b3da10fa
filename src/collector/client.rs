//! HTTP client for the osu!collector collection API.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::{CollectorError, CollectorFilter};
use crate::gateway::{GatewayConfig, GatewayError, RateLimitedClient};

/// Default osu!collector base URL.
pub const DEFAULT_COLLECTOR_BASE: &str = "https://osucollector.com";

/// Beatmaps requested per page of a filtered dump.
pub const PAGE_SIZE: u32 = 100;

/// Some deployments wrap the payload in a one-element array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_first(self) -> Option<T> {
        match self {
            Self::Many(items) => items.into_iter().next(),
            Self::One(item) => Some(item),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CollectionResponse {
    #[serde(default)]
    beatmapsets: Vec<CollectorSet>,
}

#[derive(Debug, Deserialize)]
struct CollectorSet {
    #[serde(default)]
    beatmaps: Vec<CollectorBeatmap>,
}

#[derive(Debug, Deserialize)]
struct CollectorBeatmap {
    #[serde(default)]
    id: Option<u32>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    checksum: Option<String>,
}

impl CollectorBeatmap {
    fn beatmap_id(&self) -> Option<u32> {
        self.id.or_else(|| {
            self.url
                .as_deref()
                .and_then(|url| url.trim_end_matches('/').rsplit('/').next())
                .and_then(|last| last.parse().ok())
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageResponse {
    #[serde(default)]
    beatmaps: Vec<CollectorBeatmap>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_page_cursor: Option<serde_json::Value>,
}

/// Extracts a collection ID from a bare number or a URL ending in one.
///
/// # Errors
///
/// Returns [`CollectorError::InvalidCollectionId`] if no ID can be found.
pub fn parse_collection_id(input: &str) -> Result<u32, CollectorError> {
    let without_suffix = input
        .trim()
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');
    without_suffix
        .rsplit('/')
        .next()
        .and_then(|last| last.parse::<u32>().ok())
        .filter(|id| *id > 0)
        .ok_or_else(|| CollectorError::InvalidCollectionId {
            input: input.to_string(),
        })
}

/// Client for osu!collector dumps.
#[derive(Debug, Clone)]
pub struct CollectorClient {
    http: RateLimitedClient,
    base: Url,
}

impl CollectorClient {
    /// Creates a client with its own permit pool, using the pool size,
    /// window and timeouts of `config`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::Gateway`] if `base` is not an http(s) URL
    /// or the HTTP client cannot be built.
    pub fn new(config: &GatewayConfig, base: &str) -> Result<Self, CollectorError> {
        Self::with_client(config.build_client()?, base)
    }

    /// Creates a client over an existing rate-limited HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::Gateway`] if `base` is not an http(s) URL.
    pub fn with_client(http: RateLimitedClient, base: &str) -> Result<Self, CollectorError> {
        let base = Url::parse(base)
            .ok()
            .filter(|url| matches!(url.scheme(), "http" | "https") && !url.cannot_be_a_base())
            .ok_or_else(|| {
                GatewayError::invalid_config(&format!("invalid osu!collector base URL '{base}'"))
            })?;
        Ok(Self { http, base })
    }

    fn collection_url(&self, collection_id: u32, tail: Option<&str>) -> Result<Url, CollectorError> {
        let mut url = self.base.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                GatewayError::invalid_config("osu!collector base URL cannot take a path")
            })?;
            path.pop_if_empty()
                .extend(["api", "collections", &collection_id.to_string()]);
            if let Some(tail) = tail {
                path.push(tail);
            }
        }
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, url: &Url) -> Result<T, CollectorError> {
        let payload: OneOrMany<T> = self.http.get_json(url, None).await?;
        payload
            .into_first()
            .ok_or_else(|| GatewayError::decode(url.as_str(), "empty response array").into())
    }

    /// Returns the checksums of every beatmap in the collection, in response order.
    ///
    /// Beatmaps without a checksum are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::Gateway`] if the request fails.
    #[instrument(skip(self))]
    pub async fn dump(&self, collection_id: u32) -> Result<Vec<String>, CollectorError> {
        info!(collection_id, "Collecting beatmaps from osu!collector");
        let url = self.collection_url(collection_id, None)?;
        let response: CollectionResponse = self.get(&url).await?;

        let beatmaps = response.beatmapsets.into_iter().flat_map(|set| set.beatmaps);
        let checksums = collect_checksums(beatmaps);
        info!(collection_id, count = checksums.len(), "Collected successfully");
        Ok(checksums)
    }

    /// Returns the checksums of the beatmaps matching `filter`, following
    /// the paging cursor until osu!collector reports no more pages.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::Gateway`] if any page request fails or a
    /// page claims more results without a cursor.
    #[instrument(skip(self, filter), fields(sort_by = %filter.sort_by()))]
    pub async fn dump_filtered(
        &self,
        collection_id: u32,
        filter: &CollectorFilter,
    ) -> Result<Vec<String>, CollectorError> {
        info!(
            collection_id,
            filter = filter.sort_by().label(),
            min = filter.min(),
            max = filter.max(),
            "Collecting filtered beatmaps from osu!collector"
        );
        let base_url = self.collection_url(collection_id, Some("beatmapsv2"))?;

        let mut checksums = Vec::new();
        let mut cursor = "0".to_string();
        let mut page = 0_usize;
        loop {
            page += 1;
            let mut url = base_url.clone();
            url.query_pairs_mut()
                .append_pair("cursor", &cursor)
                .append_pair("perPage", &PAGE_SIZE.to_string())
                .append_pair("sortBy", filter.sort_by().as_str())
                .append_pair("filterMin", &filter.min().to_string())
                .append_pair("filterMax", &filter.max().to_string());

            let response: PageResponse = self.get(&url).await?;
            let page_checksums = collect_checksums(response.beatmaps);
            debug!(page, count = page_checksums.len(), "page collected");
            checksums.extend(page_checksums);

            if !response.has_more {
                break;
            }
            let next = match response.next_page_cursor {
                Some(serde_json::Value::String(next)) => next,
                Some(serde_json::Value::Number(next)) => next.to_string(),
                _ => {
                    return Err(GatewayError::decode(
                        url.as_str(),
                        "page reports more results but has no nextPageCursor",
                    )
                    .into());
                }
            };
            if next == cursor {
                warn!(cursor = %next, "osu!collector returned the same cursor twice, stopping");
                break;
            }
            debug!(cursor = %next, "next cursor");
            cursor = next;
        }

        info!(collection_id, pages = page, count = checksums.len(), "Collected successfully");
        Ok(checksums)
    }
}

fn collect_checksums(beatmaps: impl IntoIterator<Item = CollectorBeatmap>) -> Vec<String> {
    let mut checksums = Vec::new();
    for beatmap in beatmaps {
        let beatmap_id = beatmap.beatmap_id();
        match beatmap.checksum {
            Some(checksum) => {
                debug!(?beatmap_id, %checksum, "dumped beatmap");
                checksums.push(checksum);
            }
            None => warn!(?beatmap_id, "osu!collector beatmap has no checksum, skipping"),
        }
    }
    checksums
}
