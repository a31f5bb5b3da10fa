//! Rate-limited, authenticated access to the osu! API.
//!
//! # Architecture
//!
//! - [`PermitPool`] - N permits, each returned `window` after its call completes
//! - [`RateLimitedClient`] - HTTP client admitting every request through a pool
//! - [`CredentialCache`] - lazily refreshed bearer token with single-flight refresh
//! - [`ClientCredentials`] - OAuth client-credentials exchange
//! - [`Gateway`] - combines the above for authenticated JSON GETs
//!
//! # Example
//!
//! ```no_run
//! use collection_factory::gateway::{Gateway, GatewayConfig};
//!
//! # async fn example() -> Result<(), collection_factory::gateway::GatewayError> {
//! let gateway = Gateway::new(&GatewayConfig::default(), "1234", "secret")?;
//! let set: serde_json::Value = gateway.get_json(&["beatmapsets", "123"], &[]).await?;
//! println!("{set}");
//! # Ok(())
//! # }
//! ```

mod credentials;
mod error;
mod http;
mod permits;

pub use credentials::{ClientCredentials, Credential, CredentialCache, CredentialSource};
pub use error::GatewayError;
pub use http::{RateLimitedClient, build_http_client};
pub use permits::{CallPermit, PermitPool, parse_retry_after};

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

/// Default osu! API v2 base URL.
pub const DEFAULT_API_BASE: &str = "https://osu.ppy.sh/api/v2";

/// Default osu! OAuth token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://osu.ppy.sh/oauth/token";

/// Default number of calls admitted per window.
pub const DEFAULT_PERMITS: usize = 60;

/// Default delay before a used permit is returned.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Default TCP connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default whole-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of waits on HTTP 429 before giving up.
pub const DEFAULT_MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Tunables for a [`Gateway`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// API base URL; path segments are appended to it.
    pub api_base: String,
    /// OAuth token endpoint.
    pub token_url: String,
    /// Calls admitted per rolling window.
    pub permits: usize,
    /// Delay before a used permit is returned.
    pub window: Duration,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Whole-request timeout.
    pub request_timeout: Duration,
    /// Waits on HTTP 429 before failing with [`GatewayError::RateLimited`].
    pub max_rate_limit_retries: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            permits: DEFAULT_PERMITS,
            window: DEFAULT_WINDOW,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_rate_limit_retries: DEFAULT_MAX_RATE_LIMIT_RETRIES,
        }
    }
}

impl GatewayConfig {
    /// Checks the configuration and parses its URLs.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidConfig`] for unparseable or non-HTTP
    /// URLs, zero permits, or zero timeouts.
    pub fn validate(&self) -> Result<(Url, Url), GatewayError> {
        let api_base = parse_http_url("api_base", &self.api_base)?;
        let token_url = parse_http_url("token_url", &self.token_url)?;
        if self.permits == 0 {
            return Err(GatewayError::invalid_config("permits must be at least 1"));
        }
        if self.connect_timeout.is_zero() || self.request_timeout.is_zero() {
            return Err(GatewayError::invalid_config("timeouts must be greater than zero"));
        }
        Ok((api_base, token_url))
    }

    /// Builds the shared admission-controlled HTTP client for this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidConfig`] if the pool or client cannot be built.
    pub fn build_client(&self) -> Result<RateLimitedClient, GatewayError> {
        let permits = PermitPool::new(self.permits, self.window)?;
        let client = build_http_client(self.connect_timeout, self.request_timeout)?;
        Ok(RateLimitedClient::new(
            client,
            permits,
            self.max_rate_limit_retries,
        ))
    }
}

fn parse_http_url(field: &str, value: &str) -> Result<Url, GatewayError> {
    let url = Url::parse(value)
        .map_err(|e| GatewayError::invalid_config(&format!("{field} '{value}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(GatewayError::invalid_config(&format!(
            "{field} must be an http(s) URL, got '{value}'"
        )));
    }
    if url.cannot_be_a_base() {
        return Err(GatewayError::invalid_config(&format!(
            "{field} cannot be used as a base URL: '{value}'"
        )));
    }
    Ok(url)
}

/// Authenticated, rate-limited client for the osu! API.
///
/// Owns the permit pool and the credential cache; neither is shared outside
/// the gateway. The credential exchange draws from the same pool as API calls.
#[derive(Debug)]
pub struct Gateway {
    http: RateLimitedClient,
    credentials: CredentialCache,
    api_base: Url,
}

impl Gateway {
    /// Creates a gateway that authenticates with OAuth client credentials.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidConfig`] for a bad configuration and
    /// [`GatewayError::Authentication`] for empty credentials. No network
    /// call is made until the first request.
    pub fn new(
        config: &GatewayConfig,
        client_id: &str,
        client_secret: &str,
    ) -> Result<Self, GatewayError> {
        let (api_base, token_url) = config.validate()?;
        let http = config.build_client()?;
        let source = ClientCredentials::new(http.clone(), token_url, client_id, client_secret)?;
        Ok(Self {
            http,
            credentials: CredentialCache::new(Box::new(source)),
            api_base,
        })
    }

    /// Creates a gateway with a caller-supplied credential source.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidConfig`] for a bad configuration.
    pub fn with_credential_source(
        config: &GatewayConfig,
        source: Box<dyn CredentialSource>,
    ) -> Result<Self, GatewayError> {
        let (api_base, _) = config.validate()?;
        let http = config.build_client()?;
        Ok(Self {
            http,
            credentials: CredentialCache::new(source),
            api_base,
        })
    }

    /// Returns the permit pool every call is admitted through.
    #[must_use]
    pub fn permits(&self) -> &PermitPool {
        self.http.permits()
    }

    /// Returns the credential cache.
    #[must_use]
    pub fn credentials(&self) -> &CredentialCache {
        &self.credentials
    }

    /// Builds `{api_base}/{segments...}?{query}`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidConfig`] if the base URL cannot take path segments.
    pub fn endpoint(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Url, GatewayError> {
        let mut url = self.api_base.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                GatewayError::invalid_config("api_base cannot be used as a base URL")
            })?;
            path.pop_if_empty();
            path.extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    /// Issues an authenticated GET against the API and decodes the JSON body.
    ///
    /// The credential is refreshed first if missing or expired; only then is
    /// a permit taken for the call itself.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] for authentication, transport, status or
    /// decoding failures.
    #[instrument(skip(self, query), fields(path = %segments.join("/")))]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, GatewayError> {
        let url = self.endpoint(segments, query)?;
        let token = self.credentials.token().await?;
        debug!(url = %url, "calling API");
        self.http.get_json(&url, Some(&token)).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct StaticSource;

    #[async_trait::async_trait]
    impl CredentialSource for StaticSource {
        async fn acquire(&self) -> Result<Credential, GatewayError> {
            Ok(Credential::new("static", Duration::from_secs(3600)))
        }
    }

    #[test]
    fn test_gateway_config_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.permits, 60);
        assert_eq!(config.window, Duration::from_secs(60));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.max_rate_limit_retries, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_gateway_config_rejects_bad_values() {
        let config = GatewayConfig {
            permits: 0,
            ..GatewayConfig::default()
        };
        assert!(matches!(config.validate(), Err(GatewayError::InvalidConfig { .. })));

        let config = GatewayConfig {
            api_base: "ftp://osu.ppy.sh".to_string(),
            ..GatewayConfig::default()
        };
        assert!(matches!(config.validate(), Err(GatewayError::InvalidConfig { .. })));

        let config = GatewayConfig {
            request_timeout: Duration::ZERO,
            ..GatewayConfig::default()
        };
        assert!(matches!(config.validate(), Err(GatewayError::InvalidConfig { .. })));
    }

    #[test]
    fn test_gateway_new_rejects_empty_credentials() {
        let err = Gateway::new(&GatewayConfig::default(), "", "secret").unwrap_err();
        assert!(matches!(err, GatewayError::Authentication { .. }));
    }

    #[test]
    fn test_gateway_endpoint_joins_segments_and_query() {
        let gateway =
            Gateway::with_credential_source(&GatewayConfig::default(), Box::new(StaticSource))
                .unwrap();
        let url = gateway
            .endpoint(
                &["beatmaps"],
                &[("ids[]", "1".to_string()), ("ids[]", "2".to_string())],
            )
            .unwrap();
        assert_eq!(url.path(), "/api/v2/beatmaps");
        let ids: Vec<String> = url
            .query_pairs()
            .filter(|(k, _)| k == "ids[]")
            .map(|(_, v)| v.into_owned())
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_gateway_endpoint_handles_trailing_slash_base() {
        let config = GatewayConfig {
            api_base: "http://127.0.0.1:9/api/v2/".to_string(),
            ..GatewayConfig::default()
        };
        let gateway = Gateway::with_credential_source(&config, Box::new(StaticSource)).unwrap();
        let url = gateway.endpoint(&["beatmapsets", "123"], &[]).unwrap();
        assert_eq!(url.path(), "/api/v2/beatmapsets/123");
        assert!(url.query().is_none());
    }

    #[test]
    fn test_gateway_exposes_pool() {
        let config = GatewayConfig {
            permits: 5,
            ..GatewayConfig::default()
        };
        let gateway = Gateway::with_credential_source(&config, Box::new(StaticSource)).unwrap();
        assert_eq!(gateway.permits().capacity(), 5);
        assert_eq!(gateway.credentials().refresh_count(), 0);
    }
}
