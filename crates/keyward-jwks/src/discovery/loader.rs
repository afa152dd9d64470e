//! Turns a well-known OpenID configuration into a ready [`OpenIdKeyResolver`]

use std::sync::Arc;

use tracing::{error, info};
use url::Url;

use super::types::WellKnownConfiguration;
use crate::Result;
use crate::config::{CachePolicy, HttpFetcherConfig};
use crate::error::JwksError;
use crate::jwks::{HttpJwkSetFetcher, JwksCacheRegistry};
use crate::jwt::OpenIdKeyResolver;

/// Loads well-known configurations and registers their key sets
///
/// Each issuer gets one cache in the shared registry, keyed by the issuer
/// string. Loading the same issuer again reconfigures that cache.
#[derive(Debug)]
pub struct WellKnownConfigurationLoader {
    http: HttpJwkSetFetcher,
    registry: Arc<JwksCacheRegistry>,
    policy: CachePolicy,
}

impl WellKnownConfigurationLoader {
    /// Create a loader with default HTTP settings and cache intervals
    ///
    /// # Errors
    ///
    /// Returns [`JwksError::InvalidConfiguration`] if the HTTP client cannot be built.
    pub fn new(registry: Arc<JwksCacheRegistry>) -> Result<Self> {
        Self::with_config(registry, HttpFetcherConfig::default(), CachePolicy::default())
    }

    /// Create a loader with custom HTTP settings and cache intervals
    ///
    /// # Errors
    ///
    /// Returns [`JwksError::InvalidConfiguration`] if the HTTP client cannot be built.
    pub fn with_config(
        registry: Arc<JwksCacheRegistry>,
        http: HttpFetcherConfig,
        policy: CachePolicy,
    ) -> Result<Self> {
        Ok(Self {
            http: HttpJwkSetFetcher::with_config(http)?,
            registry,
            policy,
        })
    }

    /// Registry caches are created in
    pub fn registry(&self) -> &Arc<JwksCacheRegistry> {
        &self.registry
    }

    /// Fetch the configuration at `config_url` and configure its key set
    ///
    /// # Errors
    ///
    /// - [`JwksError::KeySourceUnavailable`] if the document or the key set cannot be fetched
    /// - [`JwksError::InvalidConfiguration`] if the document lacks a usable
    ///   `issuer` or `jwks_uri`
    pub async fn load(&self, config_url: &Url) -> Result<OpenIdKeyResolver> {
        info!(url = %config_url, "Loading well-known configuration");

        let document = self.http.get_json(config_url).await?;
        let config: WellKnownConfiguration = serde_json::from_value(document).map_err(|e| {
            error!(url = %config_url, error = %e, "Malformed well-known configuration");
            JwksError::invalid_configuration(format!("malformed well-known configuration: {e}"))
        })?;

        self.configure_from_document(&config).await
    }

    /// Configure the key set of an already fetched configuration
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load), minus the configuration fetch.
    pub async fn configure_from_document(
        &self,
        config: &WellKnownConfiguration,
    ) -> Result<OpenIdKeyResolver> {
        let validated = config.validate()?;

        let cache = self
            .registry
            .configure_with_policy(&validated.issuer, self.policy, validated.jwks_uri.clone())
            .await?;

        info!(
            issuer = %validated.issuer,
            jwks_uri = %validated.jwks_uri,
            "Configured OpenID key resolver"
        );
        Ok(OpenIdKeyResolver::new(validated.issuer, cache))
    }
}
