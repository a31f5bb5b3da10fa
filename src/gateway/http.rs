//! Shared HTTP client construction and admission-controlled request execution.
//!
//! Every request to a remote service goes through [`RateLimitedClient`],
//! which takes a permit from the service's [`PermitPool`], waits out HTTP 429
//! responses, and decodes JSON bodies.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, ClientBuilder, Proxy, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::user_agent;

use super::GatewayError;
use super::permits::{PermitPool, parse_retry_after};

/// Builds an HTTP client with explicit connect and whole-request timeouts.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidConfig`] when client construction fails.
pub fn build_http_client(
    connect_timeout: Duration,
    request_timeout: Duration,
) -> Result<Client, GatewayError> {
    match try_build_client(connect_timeout, request_timeout, false) {
        Ok(client) => Ok(client),
        Err(BuildClientFailure::Panic) => {
            // Some sandboxed environments panic when querying system proxy
            // settings; env proxies still apply through the fallback.
            warn!("HTTP client hit system proxy panic; using env-proxy fallback builder");
            match try_build_client(connect_timeout, request_timeout, true) {
                Ok(client) => Ok(client),
                Err(BuildClientFailure::Panic) => Err(GatewayError::invalid_config(
                    "HTTP client construction panicked while initializing networking",
                )),
                Err(BuildClientFailure::Build(error)) => Err(GatewayError::invalid_config(
                    &format!("HTTP client construction failed: {error}"),
                )),
            }
        }
        Err(BuildClientFailure::Build(error)) => Err(GatewayError::invalid_config(&format!(
            "HTTP client construction failed: {error}"
        ))),
    }
}

enum BuildClientFailure {
    Panic,
    Build(reqwest::Error),
}

fn try_build_client(
    connect_timeout: Duration,
    request_timeout: Duration,
    disable_system_proxy_lookup: bool,
) -> Result<Client, BuildClientFailure> {
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .user_agent(user_agent::default_user_agent())
            .gzip(true);
        if disable_system_proxy_lookup {
            builder = apply_env_proxy_fallback(builder.no_proxy());
        }
        builder.build().map_err(BuildClientFailure::Build)
    }))
    .map_err(|_| BuildClientFailure::Panic)?
}

fn apply_env_proxy_fallback(mut builder: ClientBuilder) -> ClientBuilder {
    if let Some(proxy) = find_first_proxy_var(&["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"])
        && let Ok(resolved) = Proxy::https(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    if let Some(proxy) = find_first_proxy_var(&["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"])
        && let Ok(resolved) = Proxy::http(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    builder
}

fn find_first_proxy_var(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}

/// HTTP client whose every request is admitted by a [`PermitPool`].
///
/// Cheap to clone; clones share the connection pool and the permit pool.
#[derive(Debug, Clone)]
pub struct RateLimitedClient {
    client: Client,
    permits: PermitPool,
    max_rate_limit_retries: u32,
}

impl RateLimitedClient {
    /// Wraps a client with admission control.
    #[must_use]
    pub fn new(client: Client, permits: PermitPool, max_rate_limit_retries: u32) -> Self {
        Self {
            client,
            permits,
            max_rate_limit_retries,
        }
    }

    /// Returns the permit pool requests are admitted through.
    #[must_use]
    pub fn permits(&self) -> &PermitPool {
        &self.permits
    }

    /// Issues a GET and decodes the JSON response.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] on transport failure, non-success status,
    /// undecodable body, or 429 persisting past the retry budget.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        bearer: Option<&str>,
    ) -> Result<T, GatewayError> {
        self.execute(url, |client| {
            let request = client.get(url.clone());
            match bearer {
                Some(token) => request.bearer_auth(token),
                None => request,
            }
        })
        .await
    }

    /// Issues a form-encoded POST and decodes the JSON response.
    ///
    /// # Errors
    ///
    /// See [`RateLimitedClient::get_json`].
    pub async fn post_form<T: DeserializeOwned>(
        &self,
        url: &Url,
        fields: &[(&str, &str)],
    ) -> Result<T, GatewayError> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        self.execute(url, |client| {
            client
                .post(url.clone())
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(body.clone())
        })
        .await
    }

    async fn execute<T, F>(&self, url: &Url, build: F) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let permit = self.permits.acquire().await?;

            debug!(url = %url, attempt, "sending request");
            let response = build(&self.client)
                .send()
                .await
                .map_err(|e| GatewayError::request(url.as_str(), &e.to_string()))?;

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                drop(permit);
                if attempt > self.max_rate_limit_retries {
                    return Err(GatewayError::RateLimited {
                        url: url.to_string(),
                        attempts: attempt,
                    });
                }
                let delay = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|value| value.to_str().ok())
                    .and_then(parse_retry_after)
                    .unwrap_or_else(|| self.permits.window());
                warn!(
                    url = %url,
                    attempt,
                    delay_secs = delay.as_secs(),
                    "rate limited by remote service, waiting before retry"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            if !status.is_success() {
                debug!(url = %url, status = status.as_u16(), "remote service returned error status");
                return Err(GatewayError::status(url.as_str(), status.as_u16()));
            }

            let body = response
                .json::<T>()
                .await
                .map_err(|e| GatewayError::decode(url.as_str(), &e.to_string()))?;
            drop(permit);
            return Ok(body);
        }
    }
}
