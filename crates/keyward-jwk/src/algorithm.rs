//! JWA algorithm identifiers a JWK may declare in its `alg` member

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::JwkError;

/// Algorithms from RFC 7518 that a key can be bound to
///
/// Parsing is case-insensitive, matching how publishers are compared against
/// in key selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JwaAlgorithm {
    /// HMAC with SHA-256
    HS256,
    /// HMAC with SHA-384
    HS384,
    /// HMAC with SHA-512
    HS512,
    /// RSASSA-PKCS1-v1_5 with SHA-256
    RS256,
    /// RSASSA-PKCS1-v1_5 with SHA-384
    RS384,
    /// RSASSA-PKCS1-v1_5 with SHA-512
    RS512,
    /// RSASSA-PSS with SHA-256
    PS256,
    /// RSASSA-PSS with SHA-384
    PS384,
    /// RSASSA-PSS with SHA-512
    PS512,
    /// ECDSA with P-256 and SHA-256
    ES256,
    /// ECDSA with P-384 and SHA-384
    ES384,
    /// ECDSA with P-521 and SHA-512
    ES512,
    /// Edwards-curve signatures
    EdDSA,
    /// RSAES-PKCS1-v1_5 key encryption
    #[serde(rename = "RSA1_5")]
    Rsa1_5,
    /// RSAES OAEP with default parameters
    #[serde(rename = "RSA-OAEP")]
    RsaOaep,
    /// RSAES OAEP with SHA-256 and MGF1 with SHA-256
    #[serde(rename = "RSA-OAEP-256")]
    RsaOaep256,
    /// ECDH-ES direct key agreement
    #[serde(rename = "ECDH-ES")]
    EcdhEs,
    /// ECDH-ES with A128KW key wrapping
    #[serde(rename = "ECDH-ES+A128KW")]
    EcdhEsA128Kw,
    /// ECDH-ES with A192KW key wrapping
    #[serde(rename = "ECDH-ES+A192KW")]
    EcdhEsA192Kw,
    /// ECDH-ES with A256KW key wrapping
    #[serde(rename = "ECDH-ES+A256KW")]
    EcdhEsA256Kw,
}

impl JwaAlgorithm {
    const ALL: [Self; 20] = [
        Self::HS256,
        Self::HS384,
        Self::HS512,
        Self::RS256,
        Self::RS384,
        Self::RS512,
        Self::PS256,
        Self::PS384,
        Self::PS512,
        Self::ES256,
        Self::ES384,
        Self::ES512,
        Self::EdDSA,
        Self::Rsa1_5,
        Self::RsaOaep,
        Self::RsaOaep256,
        Self::EcdhEs,
        Self::EcdhEsA128Kw,
        Self::EcdhEsA192Kw,
        Self::EcdhEsA256Kw,
    ];

    /// Algorithm name as registered in RFC 7518
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
            Self::RS512 => "RS512",
            Self::PS256 => "PS256",
            Self::PS384 => "PS384",
            Self::PS512 => "PS512",
            Self::ES256 => "ES256",
            Self::ES384 => "ES384",
            Self::ES512 => "ES512",
            Self::EdDSA => "EdDSA",
            Self::Rsa1_5 => "RSA1_5",
            Self::RsaOaep => "RSA-OAEP",
            Self::RsaOaep256 => "RSA-OAEP-256",
            Self::EcdhEs => "ECDH-ES",
            Self::EcdhEsA128Kw => "ECDH-ES+A128KW",
            Self::EcdhEsA192Kw => "ECDH-ES+A192KW",
            Self::EcdhEsA256Kw => "ECDH-ES+A256KW",
        }
    }

    /// Whether the algorithm produces signatures rather than wrapping content keys
    #[must_use]
    pub fn is_signing(self) -> bool {
        !matches!(
            self,
            Self::Rsa1_5
                | Self::RsaOaep
                | Self::RsaOaep256
                | Self::EcdhEs
                | Self::EcdhEsA128Kw
                | Self::EcdhEsA192Kw
                | Self::EcdhEsA256Kw
        )
    }
}

impl FromStr for JwaAlgorithm {
    type Err = JwkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|alg| alg.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| JwkError::malformed_key(format!("unrecognised algorithm '{s}'")))
    }
}

impl fmt::Display for JwaAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
