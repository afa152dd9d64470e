//! Named elliptic curves accepted in EC JWKs

use std::fmt;
use std::str::FromStr;

use crate::algorithm::JwaAlgorithm;
use crate::error::JwkError;

/// Elliptic curves an EC JWK may name in its `crv` member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupportedCurve {
    /// NIST P-256 (secp256r1)
    P256,
    /// NIST P-384 (secp384r1)
    P384,
    /// NIST P-521 (secp521r1)
    P521,
}

impl SupportedCurve {
    /// Resolve a curve from its JWK name
    ///
    /// # Errors
    ///
    /// Returns [`JwkError::UnsupportedCurve`] for anything other than
    /// `P-256`, `P-384` or `P-521`.
    pub fn from_name(name: &str) -> Result<Self, JwkError> {
        match name {
            "P-256" => Ok(Self::P256),
            "P-384" => Ok(Self::P384),
            "P-521" => Ok(Self::P521),
            other => Err(JwkError::UnsupportedCurve {
                curve: other.to_string(),
            }),
        }
    }

    /// Name used in the `crv` member
    #[must_use]
    pub fn standard_name(self) -> &'static str {
        match self {
            Self::P256 => "P-256",
            Self::P384 => "P-384",
            Self::P521 => "P-521",
        }
    }

    /// Size of the underlying prime field in bits
    #[must_use]
    pub fn field_size_bits(self) -> usize {
        match self {
            Self::P256 => 256,
            Self::P384 => 384,
            Self::P521 => 521,
        }
    }

    /// Width of an encoded coordinate or scalar in octets
    #[must_use]
    pub fn coordinate_len(self) -> usize {
        crate::codec::field_size_bytes(self.field_size_bits())
    }

    /// ECDSA signature algorithm paired with this curve
    #[must_use]
    pub fn jws_algorithm(self) -> JwaAlgorithm {
        match self {
            Self::P256 => JwaAlgorithm::ES256,
            Self::P384 => JwaAlgorithm::ES384,
            Self::P521 => JwaAlgorithm::ES512,
        }
    }
}

impl FromStr for SupportedCurve {
    type Err = JwkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

impl fmt::Display for SupportedCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.standard_name())
    }
}
