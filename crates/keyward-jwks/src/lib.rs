//! # Keyward JWKS - Cached key sets and OpenID signature verification
//!
//! Fetches JWK sets from identity providers, caches them per source, and
//! verifies ID token signatures with the cached keys.
//!
//! ## Refresh Policy
//!
//! Caches have no background tasks. Staleness is evaluated when a lookup runs:
//!
//! - **Hits are free** - a key found in the cached set is returned without fetching
//! - **Miss backoff** - a miss refetches only if the last refresh is at least
//!   `miss_backoff_interval` old (default 1 minute), which bounds fetch traffic
//!   from requests probing with unknown key ids
//! - **Fresh encryption keys** - lookups for encryption keys refetch first once
//!   the set is `refresh_interval` old (default 1 hour)
//! - **Fail closed** - a failed fetch is returned to the caller; the previous
//!   set stays cached
//!
//! ## Architecture
//!
//! - [`jwks`] - `JwkSetFetcher`, `HttpJwkSetFetcher`, `JwksCache`, `JwksCacheRegistry`
//! - [`discovery`] - well-known OpenID configuration loading
//! - [`jwt`] - `OpenIdKeyResolver` and ID token claims
//! - [`config`] - cache policy and HTTP fetcher configuration
//! - [`error`] - error types
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use keyward_jwks::{HttpFetcherConfig, JwksCacheRegistry};
//! use url::Url;
//!
//! # async fn example() -> keyward_jwks::Result<()> {
//! let registry = Arc::new(JwksCacheRegistry::with_http_fetcher(HttpFetcherConfig::default())?);
//!
//! let jwks_uri = Url::parse("https://idp.example.com/jwks").expect("valid URL");
//! let cache = registry.configure_with_defaults("idp", jwks_uri).await?;
//!
//! if let Some(jwk) = cache.find_by_key_id("2024-06-signing").await? {
//!     let public_key = jwk.to_public_key()?;
//!     println!("RSA key: {}", public_key.is_rsa());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod jwks;
pub mod jwt;

#[doc(inline)]
pub use config::{
    CachePolicy, DEFAULT_MISS_BACKOFF_INTERVAL, DEFAULT_REFRESH_INTERVAL, HttpFetcherConfig,
};
#[doc(inline)]
pub use discovery::{ValidatedConfiguration, WellKnownConfiguration, WellKnownConfigurationLoader};
#[doc(inline)]
pub use error::JwksError;
#[doc(inline)]
pub use jwks::{HttpJwkSetFetcher, JwkSetFetcher, JwksCache, JwksCacheRegistry};
#[doc(inline)]
pub use jwt::{Audience, IdTokenClaims, OpenIdKeyResolver};

pub use keyward_jwk as jwk;

/// JWKS result type
pub type Result<T> = std::result::Result<T, JwksError>;
