//! Error types for key set fetching, caching and token verification

use keyward_jwk::JwkError;
use thiserror::Error;

/// Errors raised by fetchers, caches, the registry and the OpenID resolver
///
/// Callers verifying tokens must treat every variant as "key unavailable" and
/// reject the token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JwksError {
    /// The key set (or well-known configuration) could not be fetched or parsed
    #[error("Key source unavailable at {url}: {reason}")]
    KeySourceUnavailable {
        /// URL that was being fetched
        url: String,
        /// What went wrong
        reason: String,
    },

    /// A well-known configuration document is missing or has invalid members
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration {
        /// What went wrong
        reason: String,
    },

    /// A token's signature or claims could not be verified
    #[error("Invalid signature: {reason}")]
    InvalidSignature {
        /// What went wrong
        reason: String,
    },

    /// A key record could not be converted
    #[error(transparent)]
    Jwk(#[from] JwkError),
}

impl JwksError {
    pub(crate) fn unavailable(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::KeySourceUnavailable {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_signature(reason: impl Into<String>) -> Self {
        Self::InvalidSignature {
            reason: reason.into(),
        }
    }
}
