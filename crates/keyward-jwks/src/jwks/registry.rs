//! One [`JwksCache`] per key source
//!
//! The registry is an ordinary value: construct it once, wrap it in an `Arc`
//! and hand it to whatever needs key lookups.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

use super::cache::JwksCache;
use super::fetcher::{HttpJwkSetFetcher, JwkSetFetcher};
use crate::Result;
use crate::config::{CachePolicy, HttpFetcherConfig};

/// Caches keyed by case-insensitive source id
pub struct JwksCacheRegistry {
    fetcher: Arc<dyn JwkSetFetcher>,
    caches: Mutex<HashMap<String, Arc<JwksCache>>>,
}

impl std::fmt::Debug for JwksCacheRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwksCacheRegistry").finish_non_exhaustive()
    }
}

impl JwksCacheRegistry {
    /// Create an empty registry whose caches fetch through `fetcher`
    pub fn new(fetcher: Arc<dyn JwkSetFetcher>) -> Self {
        Self {
            fetcher,
            caches: Mutex::new(HashMap::new()),
        }
    }

    /// Create an empty registry backed by an [`HttpJwkSetFetcher`]
    ///
    /// # Errors
    ///
    /// Returns [`JwksError::InvalidConfiguration`](crate::JwksError::InvalidConfiguration)
    /// if the HTTP client cannot be built.
    pub fn with_http_fetcher(config: HttpFetcherConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(HttpJwkSetFetcher::with_config(config)?)))
    }

    /// Return the cache for `source_id`, creating or reconfiguring it
    ///
    /// An existing cache is updated in place and only refetches when the URL
    /// changed. A new cache performs its initial fetch before it is registered,
    /// so a failed fetch leaves the registry unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`JwksError::KeySourceUnavailable`](crate::JwksError::KeySourceUnavailable)
    /// if the initial or URL-triggered fetch fails.
    pub async fn configure(
        &self,
        source_id: &str,
        refresh_interval: Duration,
        miss_backoff_interval: Duration,
        source_url: Url,
    ) -> Result<Arc<JwksCache>> {
        let key = source_id.to_lowercase();
        let mut caches = self.caches.lock().await;

        if let Some(cache) = caches.get(&key) {
            debug!(source_id = %key, "Reconfiguring existing JWK set cache");
            cache
                .reconfigure(refresh_interval, miss_backoff_interval, source_url)
                .await?;
            return Ok(Arc::clone(cache));
        }

        let cache = JwksCache::create(
            &key,
            refresh_interval,
            miss_backoff_interval,
            source_url,
            Arc::clone(&self.fetcher),
        )
        .await?;
        caches.insert(key.clone(), Arc::clone(&cache));
        info!(source_id = %key, cache_count = caches.len(), "Registered JWK set cache");

        Ok(cache)
    }

    /// [`configure`](Self::configure) with the intervals of a [`CachePolicy`]
    ///
    /// # Errors
    ///
    /// Same as [`configure`](Self::configure).
    pub async fn configure_with_policy(
        &self,
        source_id: &str,
        policy: CachePolicy,
        source_url: Url,
    ) -> Result<Arc<JwksCache>> {
        self.configure(
            source_id,
            policy.refresh_interval,
            policy.miss_backoff_interval,
            source_url,
        )
        .await
    }

    /// [`configure`](Self::configure) with the default intervals (1 hour, 1 minute)
    ///
    /// # Errors
    ///
    /// Same as [`configure`](Self::configure).
    pub async fn configure_with_defaults(
        &self,
        source_id: &str,
        source_url: Url,
    ) -> Result<Arc<JwksCache>> {
        self.configure_with_policy(source_id, CachePolicy::default(), source_url)
            .await
    }

    /// Cache registered for `source_id`, ignoring case
    pub async fn get(&self, source_id: &str) -> Option<Arc<JwksCache>> {
        self.caches
            .lock()
            .await
            .get(&source_id.to_lowercase())
            .cloned()
    }

    /// Unregister `source_id`; no-op when absent
    ///
    /// Holders of the removed `Arc<JwksCache>` can keep using it.
    pub async fn remove(&self, source_id: &str) {
        let key = source_id.to_lowercase();
        if self.caches.lock().await.remove(&key).is_some() {
            info!(source_id = %key, "Removed JWK set cache");
        }
    }

    /// Number of registered caches
    pub async fn len(&self) -> usize {
        self.caches.lock().await.len()
    }

    /// Whether no cache is registered
    pub async fn is_empty(&self) -> bool {
        self.caches.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JwksError;
    use async_trait::async_trait;
    use keyward_jwk::JwkSet;

    struct EmptySetFetcher;

    #[async_trait]
    impl JwkSetFetcher for EmptySetFetcher {
        async fn fetch(&self, url: &Url) -> Result<JwkSet> {
            if url.path() == "/down" {
                return Err(JwksError::unavailable(url.as_str(), "HTTP 503"));
            }
            Ok(JwkSet::default())
        }
    }

    fn registry() -> JwksCacheRegistry {
        JwksCacheRegistry::new(Arc::new(EmptySetFetcher))
    }

    #[tokio::test]
    async fn test_remove_is_case_insensitive() {
        let registry = registry();
        registry
            .configure_with_defaults("Idp", Url::parse("https://idp.example.com/jwks").unwrap())
            .await
            .unwrap();

        registry.remove("IDP").await;

        assert!(registry.get("idp").await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_remove_absent_is_noop() {
        let registry = registry();
        registry.remove("missing").await;
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn test_failed_create_registers_nothing() {
        let registry = registry();
        let result = registry
            .configure_with_defaults("idp", Url::parse("https://idp.example.com/down").unwrap())
            .await;

        assert!(matches!(result, Err(JwksError::KeySourceUnavailable { .. })));
        assert!(registry.get("idp").await.is_none());
    }

    #[tokio::test]
    async fn test_defaults_applied() {
        let registry = registry();
        let cache = registry
            .configure_with_defaults("idp", Url::parse("https://idp.example.com/jwks").unwrap())
            .await
            .unwrap();

        assert_eq!(cache.refresh_interval().await, Duration::from_secs(3600));
        assert_eq!(cache.miss_backoff_interval().await, Duration::from_secs(60));
    }
}
