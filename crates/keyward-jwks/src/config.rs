//! Configuration types for key set caching and HTTP fetching

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default routine lifetime of a cached key set (1 hour)
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(3600);

/// Default minimum gap between miss-triggered refreshes (1 minute)
pub const DEFAULT_MISS_BACKOFF_INTERVAL: Duration = Duration::from_secs(60);

/// Refresh policy of one key set cache
///
/// The two intervals are independent knobs: `refresh_interval` is the routine
/// lifetime after which encryption-key lookups refetch proactively, while
/// `miss_backoff_interval` bounds how often a lookup miss may trigger a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePolicy {
    /// Age after which encryption-key lookups refresh before searching
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: Duration,
    /// Minimum age before a lookup miss may refresh
    #[serde(default = "default_miss_backoff_interval")]
    pub miss_backoff_interval: Duration,
}

fn default_refresh_interval() -> Duration {
    DEFAULT_REFRESH_INTERVAL
}

fn default_miss_backoff_interval() -> Duration {
    DEFAULT_MISS_BACKOFF_INTERVAL
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            refresh_interval: default_refresh_interval(),
            miss_backoff_interval: default_miss_backoff_interval(),
        }
    }
}

/// Configuration for [`HttpJwkSetFetcher`](crate::HttpJwkSetFetcher)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpFetcherConfig {
    /// Whole-request timeout (default: 10 seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: Duration,
    /// Connection timeout (default: 5 seconds)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: Duration,
    /// Maximum response body size in bytes (default: 256 KB)
    #[serde(default = "default_max_response_size")]
    pub max_response_size: usize,
    /// User agent for HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_max_response_size() -> usize {
    256 * 1024
}

fn default_user_agent() -> String {
    format!("keyward/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            max_response_size: default_max_response_size(),
            user_agent: default_user_agent(),
        }
    }
}
