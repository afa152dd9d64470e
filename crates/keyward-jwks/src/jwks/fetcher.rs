//! Key set fetchers
//!
//! Caches never talk to the network themselves; they go through a
//! [`JwkSetFetcher`] so the transport can be swapped out (or mocked in tests).

use async_trait::async_trait;
use keyward_jwk::JwkSet;
use serde_json::Value;
use tracing::{debug, error, info};
use url::Url;

use crate::Result;
use crate::config::HttpFetcherConfig;
use crate::error::JwksError;

/// Source of key set documents
///
/// Implementations report every failure, network or parse, as
/// [`JwksError::KeySourceUnavailable`].
#[async_trait]
pub trait JwkSetFetcher: Send + Sync {
    /// Fetch and parse the key set published at `url`
    async fn fetch(&self, url: &Url) -> Result<JwkSet>;
}

/// [`JwkSetFetcher`] over HTTP(S) GET
///
/// Redirects are not followed and responses larger than
/// [`HttpFetcherConfig::max_response_size`] are rejected.
#[derive(Debug, Clone)]
pub struct HttpJwkSetFetcher {
    client: reqwest::Client,
    config: HttpFetcherConfig,
}

impl HttpJwkSetFetcher {
    /// Create a fetcher with default timeouts and limits
    ///
    /// # Errors
    ///
    /// Returns [`JwksError::InvalidConfiguration`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_config(HttpFetcherConfig::default())
    }

    /// Create a fetcher with custom configuration
    ///
    /// # Errors
    ///
    /// Returns [`JwksError::InvalidConfiguration`] if the HTTP client cannot be built.
    pub fn with_config(config: HttpFetcherConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| {
                JwksError::invalid_configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self { client, config })
    }

    /// Fetcher configuration
    pub fn config(&self) -> &HttpFetcherConfig {
        &self.config
    }

    /// GET `url` and parse the body as JSON
    ///
    /// # Errors
    ///
    /// Returns [`JwksError::KeySourceUnavailable`] on transport failure, a
    /// non-success status, an oversized body or invalid JSON.
    pub async fn get_json(&self, url: &Url) -> Result<Value> {
        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            error!(url = %url, error = %e, "HTTP request failed");
            JwksError::unavailable(url.as_str(), format!("request failed: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(url = %url, status = %status, "Endpoint returned error status");
            return Err(JwksError::unavailable(
                url.as_str(),
                format!(
                    "HTTP {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown")
                ),
            ));
        }

        let limit = self.config.max_response_size;
        if let Some(content_length) = response.content_length()
            && content_length > limit as u64
        {
            return Err(Self::too_large(url, limit));
        }

        let body = response.bytes().await.map_err(|e| {
            JwksError::unavailable(url.as_str(), format!("failed to read response: {e}"))
        })?;
        if body.len() > limit {
            return Err(Self::too_large(url, limit));
        }

        debug!(url = %url, bytes = body.len(), "Received response body");
        serde_json::from_slice(&body)
            .map_err(|e| JwksError::unavailable(url.as_str(), format!("invalid JSON: {e}")))
    }

    fn too_large(url: &Url, limit: usize) -> JwksError {
        error!(url = %url, limit, "Response size limit exceeded");
        JwksError::unavailable(
            url.as_str(),
            format!("response exceeds the {limit} byte limit"),
        )
    }
}

#[async_trait]
impl JwkSetFetcher for HttpJwkSetFetcher {
    async fn fetch(&self, url: &Url) -> Result<JwkSet> {
        info!(url = %url, "Fetching JWK set");

        let document = self.get_json(url).await?;
        let jwks = JwkSet::parse(&document).map_err(|e| {
            error!(url = %url, error = %e, "Failed to parse JWK set");
            JwksError::unavailable(url.as_str(), e.to_string())
        })?;

        info!(url = %url, key_count = jwks.len(), "Successfully fetched JWK set");
        Ok(jwks)
    }
}
