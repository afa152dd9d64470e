//! Refresh and miss-backoff policy for one key set source
//!
//! A [`JwksCache`] has no timer of its own. Staleness is judged from the age of
//! the last successful refresh whenever a lookup happens:
//!
//! - a lookup that hits the current document never fetches
//! - a miss fetches only once `miss_backoff_interval` has passed since the last
//!   refresh, so probing with unknown key ids cannot drive fetch traffic
//! - encryption-key lookups additionally refetch first once the document is
//!   older than `refresh_interval`, so content is never encrypted to a retired key
//!
//! All state sits behind one async mutex that is held across the fetch, so at
//! most one fetch per source is in flight.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use keyward_jwk::{JwaAlgorithm, Jwk, JwkSet, KeyUse};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info};
use url::Url;

use super::fetcher::JwkSetFetcher;
use crate::Result;
use crate::config::CachePolicy;
use crate::error::JwksError;

#[derive(Debug)]
struct CacheState {
    document: Arc<JwkSet>,
    source_url: Url,
    refresh_interval: Duration,
    miss_backoff_interval: Duration,
    last_refresh: Instant,
}

impl CacheState {
    fn age(&self) -> Duration {
        self.last_refresh.elapsed()
    }

    fn miss_backoff_elapsed(&self) -> bool {
        self.age() >= self.miss_backoff_interval
    }
}

/// Cached key set for one source, refreshed lazily on demand
pub struct JwksCache {
    source_id: String,
    fetcher: Arc<dyn JwkSetFetcher>,
    state: Mutex<CacheState>,
}

impl fmt::Debug for JwksCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwksCache")
            .field("source_id", &self.source_id)
            .field("state", &"<guarded>")
            .finish_non_exhaustive()
    }
}

impl JwksCache {
    /// Create a cache, fetching its first document immediately
    ///
    /// The source id is stored lowercased.
    ///
    /// # Errors
    ///
    /// Returns [`JwksError::KeySourceUnavailable`] if the initial fetch fails;
    /// no cache exists without a successfully loaded document.
    pub async fn create(
        source_id: &str,
        refresh_interval: Duration,
        miss_backoff_interval: Duration,
        source_url: Url,
        fetcher: Arc<dyn JwkSetFetcher>,
    ) -> Result<Arc<Self>> {
        let source_id = source_id.to_lowercase();
        info!(source_id = %source_id, url = %source_url, "Creating JWK set cache");

        let document = fetch_from(fetcher.as_ref(), &source_id, &source_url).await?;

        Ok(Arc::new(Self {
            source_id,
            fetcher,
            state: Mutex::new(CacheState {
                document: Arc::new(document),
                source_url,
                refresh_interval,
                miss_backoff_interval,
                last_refresh: Instant::now(),
            }),
        }))
    }

    /// Create a cache from a [`CachePolicy`]
    ///
    /// # Errors
    ///
    /// Same as [`JwksCache::create`].
    pub async fn with_policy(
        source_id: &str,
        policy: CachePolicy,
        source_url: Url,
        fetcher: Arc<dyn JwkSetFetcher>,
    ) -> Result<Arc<Self>> {
        Self::create(
            source_id,
            policy.refresh_interval,
            policy.miss_backoff_interval,
            source_url,
            fetcher,
        )
        .await
    }

    /// Find the key with id `kid`
    ///
    /// A miss refreshes and retries once, unless the last refresh is younger
    /// than the miss backoff interval.
    ///
    /// # Errors
    ///
    /// Returns [`JwksError::KeySourceUnavailable`] if a triggered refresh fails.
    pub async fn find_by_key_id(&self, kid: &str) -> Result<Option<Jwk>> {
        let mut state = self.state.lock().await;

        if let Some(jwk) = state.document.find_by_key_id(kid) {
            debug!(source_id = %self.source_id, kid, "JWK cache hit");
            return Ok(Some(jwk.clone()));
        }

        if !state.miss_backoff_elapsed() {
            debug!(
                source_id = %self.source_id,
                kid,
                age_ms = state.age().as_millis() as u64,
                "JWK cache miss within backoff, not refreshing"
            );
            return Ok(None);
        }

        debug!(source_id = %self.source_id, kid, "JWK cache miss, refreshing");
        self.refresh_locked(&mut state).await?;
        Ok(state.document.find_by_key_id(kid).cloned())
    }

    /// Find a key bound to `algorithm` for `key_use`
    ///
    /// Encryption lookups refresh first once the document is older than the
    /// refresh interval. A miss then refreshes and retries once, subject to
    /// the miss backoff.
    ///
    /// # Errors
    ///
    /// Returns [`JwksError::KeySourceUnavailable`] if a triggered refresh fails.
    pub async fn find_by_algorithm_and_use(
        &self,
        algorithm: JwaAlgorithm,
        key_use: Option<KeyUse>,
    ) -> Result<Option<Jwk>> {
        let mut state = self.state.lock().await;

        if key_use == Some(KeyUse::Encryption) && state.age() >= state.refresh_interval {
            debug!(
                source_id = %self.source_id,
                algorithm = %algorithm,
                "Encryption keys are stale, refreshing before lookup"
            );
            self.refresh_locked(&mut state).await?;
        }

        if let Some(jwk) = state.document.find_by_algorithm_and_use(algorithm, key_use) {
            debug!(source_id = %self.source_id, algorithm = %algorithm, "JWK cache hit");
            return Ok(Some(jwk.clone()));
        }

        if !state.miss_backoff_elapsed() {
            debug!(
                source_id = %self.source_id,
                algorithm = %algorithm,
                "JWK cache miss within backoff, not refreshing"
            );
            return Ok(None);
        }

        self.refresh_locked(&mut state).await?;
        Ok(state
            .document
            .find_by_algorithm_and_use(algorithm, key_use)
            .cloned())
    }

    /// Refetch the document now
    ///
    /// On failure the current document and refresh time are kept.
    ///
    /// # Errors
    ///
    /// Returns [`JwksError::KeySourceUnavailable`] if the fetch fails.
    pub async fn refresh(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.refresh_locked(&mut state).await
    }

    /// Change the routine refresh interval; never fetches
    pub async fn set_refresh_interval(&self, interval: Duration) {
        self.state.lock().await.refresh_interval = interval;
    }

    /// Change the miss backoff interval; never fetches
    pub async fn set_miss_backoff_interval(&self, interval: Duration) {
        self.state.lock().await.miss_backoff_interval = interval;
    }

    /// Point the cache at a new URL, refreshing if it differs from the current one
    ///
    /// The URL is switched before the refresh and stays switched if the
    /// refresh fails; the previous document is kept in that case.
    ///
    /// # Errors
    ///
    /// Returns [`JwksError::KeySourceUnavailable`] if the triggered refresh fails.
    pub async fn set_source_url(&self, url: Url) -> Result<()> {
        let mut state = self.state.lock().await;
        self.switch_source_url(&mut state, url).await
    }

    /// Update both intervals and the URL under a single lock acquisition
    ///
    /// Only a changed URL triggers a refresh.
    ///
    /// # Errors
    ///
    /// Same as [`JwksCache::set_source_url`].
    pub async fn reconfigure(
        &self,
        refresh_interval: Duration,
        miss_backoff_interval: Duration,
        url: Url,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        state.refresh_interval = refresh_interval;
        state.miss_backoff_interval = miss_backoff_interval;
        self.switch_source_url(&mut state, url).await
    }

    /// Lowercased source id
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// URL the next refresh will fetch
    pub async fn source_url(&self) -> Url {
        self.state.lock().await.source_url.clone()
    }

    /// Routine refresh interval
    pub async fn refresh_interval(&self) -> Duration {
        self.state.lock().await.refresh_interval
    }

    /// Miss backoff interval
    pub async fn miss_backoff_interval(&self) -> Duration {
        self.state.lock().await.miss_backoff_interval
    }

    /// Snapshot of the current document
    pub async fn document(&self) -> Arc<JwkSet> {
        Arc::clone(&self.state.lock().await.document)
    }

    /// When the current document was fetched
    pub async fn last_refresh(&self) -> Instant {
        self.state.lock().await.last_refresh
    }

    async fn switch_source_url(&self, state: &mut CacheState, url: Url) -> Result<()> {
        if state.source_url == url {
            return Ok(());
        }

        info!(
            source_id = %self.source_id,
            old_url = %state.source_url,
            new_url = %url,
            "JWK set source URL changed"
        );
        state.source_url = url;
        self.refresh_locked(state).await
    }

    async fn refresh_locked(&self, state: &mut CacheState) -> Result<()> {
        let document = fetch_from(self.fetcher.as_ref(), &self.source_id, &state.source_url).await?;
        state.document = Arc::new(document);
        state.last_refresh = Instant::now();
        Ok(())
    }
}

async fn fetch_from(fetcher: &dyn JwkSetFetcher, source_id: &str, url: &Url) -> Result<JwkSet> {
    info!(source_id, url = %url, "Refreshing JWK set");

    match fetcher.fetch(url).await {
        Ok(document) => {
            info!(source_id, url = %url, key_count = document.len(), "JWK set refreshed");
            Ok(document)
        }
        Err(e) => {
            error!(source_id, url = %url, error = %e, "JWK set refresh failed");
            Err(match e {
                JwksError::KeySourceUnavailable { .. } => e,
                other => JwksError::unavailable(url.as_str(), other.to_string()),
            })
        }
    }
}
