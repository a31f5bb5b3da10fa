//! Bearer credential acquisition and caching.
//!
//! [`CredentialCache`] holds at most one [`Credential`]. A caller that finds
//! it missing or expired refreshes it while holding the cache lock, so
//! concurrent callers wait for that single refresh and then reuse its result.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, instrument};
use url::Url;

use super::GatewayError;
use super::http::RateLimitedClient;

/// A short-lived bearer token.
#[derive(Clone)]
pub struct Credential {
    token: String,
    expires_at: Instant,
}

impl Credential {
    /// Creates a credential valid for `expires_in` from now.
    #[must_use]
    pub fn new(token: impl Into<String>, expires_in: Duration) -> Self {
        Self {
            token: token.into(),
            expires_at: Instant::now() + expires_in,
        }
    }

    /// Returns the bearer token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the instant after which the token must not be used.
    #[must_use]
    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// Returns true once `expires_at` has been reached.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Something that can produce a fresh [`Credential`].
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Acquires a new credential from the issuer.
    async fn acquire(&self) -> Result<Credential, GatewayError>;
}

/// OAuth token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    token_type: Option<String>,
    expires_in: Option<u64>,
}

/// OAuth client-credentials grant against a token endpoint.
pub struct ClientCredentials {
    http: RateLimitedClient,
    token_url: Url,
    client_id: String,
    client_secret: String,
}

impl ClientCredentials {
    /// Creates a client-credentials source.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Authentication`] when the ID or secret is empty.
    pub fn new(
        http: RateLimitedClient,
        token_url: Url,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self, GatewayError> {
        let client_id = client_id.into();
        let client_secret = client_secret.into();
        if client_id.trim().is_empty() || client_secret.trim().is_empty() {
            return Err(GatewayError::authentication(
                "client ID and client secret are both required",
            ));
        }
        Ok(Self {
            http,
            token_url,
            client_id,
            client_secret,
        })
    }
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("token_url", &self.token_url.as_str())
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CredentialSource for ClientCredentials {
    #[instrument(skip(self), fields(token_url = %self.token_url))]
    async fn acquire(&self) -> Result<Credential, GatewayError> {
        let fields = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "client_credentials"),
            ("scope", "public"),
        ];

        let response: TokenResponse = self
            .http
            .post_form(&self.token_url, &fields)
            .await
            .map_err(|e| match e {
                GatewayError::Status { status, .. } if matches!(status, 400 | 401 | 404) => {
                    GatewayError::authentication(&format!(
                        "token endpoint rejected the client (HTTP {status})"
                    ))
                }
                GatewayError::Decode { reason, .. } => GatewayError::authentication(&format!(
                    "token endpoint returned malformed data: {reason}"
                )),
                other => other,
            })?;

        let (Some(token), Some(token_type), Some(expires_in)) =
            (response.access_token, response.token_type, response.expires_in)
        else {
            return Err(GatewayError::authentication(
                "token response is missing access_token, token_type or expires_in",
            ));
        };
        if token.is_empty() {
            return Err(GatewayError::authentication("token response has an empty token"));
        }

        debug!(%token_type, expires_in, "credential acquired");
        Ok(Credential::new(token, Duration::from_secs(expires_in)))
    }
}

/// Lazily refreshed single-credential cache.
pub struct CredentialCache {
    source: Box<dyn CredentialSource>,
    current: Mutex<Option<Credential>>,
    refreshes: AtomicUsize,
}

impl CredentialCache {
    /// Creates an empty cache; the first [`CredentialCache::token`] call refreshes.
    #[must_use]
    pub fn new(source: Box<dyn CredentialSource>) -> Self {
        Self {
            source,
            current: Mutex::new(None),
            refreshes: AtomicUsize::new(0),
        }
    }

    /// Returns a valid bearer token, refreshing it first if missing or expired.
    ///
    /// # Errors
    ///
    /// Propagates the [`CredentialSource`] failure; the cache stays empty.
    pub async fn token(&self) -> Result<String, GatewayError> {
        let mut current = self.current.lock().await;
        if let Some(credential) = current.as_ref()
            && !credential.is_expired()
        {
            return Ok(credential.token().to_string());
        }

        info!(
            had_credential = current.is_some(),
            "API credential missing or expired, refreshing"
        );
        let fresh = self.source.acquire().await?;
        let token = fresh.token().to_string();
        *current = Some(fresh);
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(token)
    }

    /// Returns how many refreshes have completed.
    #[must_use]
    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for CredentialCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCache")
            .field("refreshes", &self.refresh_count())
            .finish_non_exhaustive()
    }
}
