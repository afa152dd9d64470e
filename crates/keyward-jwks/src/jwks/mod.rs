//! Key set fetching, caching and the per-source registry

mod cache;
mod fetcher;
mod registry;

pub use cache::JwksCache;
pub use fetcher::{HttpJwkSetFetcher, JwkSetFetcher};
pub use registry::JwksCacheRegistry;
