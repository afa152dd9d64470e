//! # Well-known OpenID configuration
//!
//! Reads the `issuer` and `jwks_uri` members of an OpenID provider
//! configuration, registers a [`JwksCache`](crate::JwksCache) for the issuer
//! and hands back an [`OpenIdKeyResolver`](crate::OpenIdKeyResolver).
//!
//! Only those two members are interpreted. The rest of the document is kept
//! but not validated.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use keyward_jwks::{JwksCacheRegistry, WellKnownConfigurationLoader, HttpFetcherConfig};
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(JwksCacheRegistry::with_http_fetcher(HttpFetcherConfig::default())?);
//! let loader = WellKnownConfigurationLoader::new(registry)?;
//!
//! let url = Url::parse("https://accounts.example.com/.well-known/openid-configuration")?;
//! let resolver = loader.load(&url).await?;
//!
//! let claims = resolver.verify_signature("eyJhbGciOiJFUzI1NiIs...").await?;
//! println!("Token for: {:?}", claims.sub);
//! # Ok(())
//! # }
//! ```

mod loader;
mod types;

pub use loader::WellKnownConfigurationLoader;
pub use types::{ValidatedConfiguration, WellKnownConfiguration};
