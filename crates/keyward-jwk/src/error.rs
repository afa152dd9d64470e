//! Error types for JWK parsing, encoding and key conversion

use thiserror::Error;

/// Errors raised while decoding, validating or converting JSON Web Keys
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JwkError {
    /// An integer could not be encoded to, or decoded from, its base64url form
    #[error("Encoding error: {reason}")]
    Encoding {
        /// What went wrong
        reason: String,
    },

    /// A single key record does not have the expected shape
    #[error("Malformed JWK: {reason}")]
    MalformedKey {
        /// What went wrong
        reason: String,
    },

    /// A key set document does not have the expected shape
    #[error("Malformed JWK set: {reason}")]
    MalformedDocument {
        /// What went wrong
        reason: String,
    },

    /// The named elliptic curve is not one of the supported curves
    #[error("Unsupported elliptic curve: {curve}")]
    UnsupportedCurve {
        /// Curve name as it appeared on the wire
        curve: String,
    },

    /// A private key was requested from a record that only carries public material
    #[error("Key material absent: {reason}")]
    KeyMaterialAbsent {
        /// What went wrong
        reason: String,
    },
}

impl JwkError {
    pub(crate) fn encoding(reason: impl Into<String>) -> Self {
        Self::Encoding {
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed_key(reason: impl Into<String>) -> Self {
        Self::MalformedKey {
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed_document(reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            reason: reason.into(),
        }
    }
}
