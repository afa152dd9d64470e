//! Native key material reconstructed from, or exported to, JWKs
//!
//! RSA keys are backed by the `rsa` crate and EC keys by the RustCrypto curve
//! crates (`p256`, `p384`, `p521`).

use p256::elliptic_curve::sec1::ToEncodedPoint;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};

use crate::Result;
use crate::codec::{encode_coordinate, encode_unsigned, to_fixed_width_bytes};
use crate::curve::SupportedCurve;
use crate::error::JwkError;

/// SEC1 tag for an uncompressed point
const SEC1_UNCOMPRESSED: u8 = 0x04;

/// Public key usable for signature verification or key encryption
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    /// RSA public key
    Rsa(RsaPublicKey),
    /// Elliptic curve public key
    Ec(EcPublicKey),
}

/// Private key usable for signing or key decryption
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrivateKey {
    /// RSA private key
    Rsa(RsaPrivateKey),
    /// Elliptic curve private key
    Ec(EcPrivateKey),
}

/// Matching public and private halves of one JWK
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    /// Public half
    pub public: PublicKey,
    /// Private half
    pub private: PrivateKey,
}

/// EC public key on one of the supported curves
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EcPublicKey {
    /// NIST P-256 point
    P256(p256::PublicKey),
    /// NIST P-384 point
    P384(p384::PublicKey),
    /// NIST P-521 point
    P521(p521::PublicKey),
}

/// EC private scalar on one of the supported curves
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EcPrivateKey {
    /// NIST P-256 scalar
    P256(p256::SecretKey),
    /// NIST P-384 scalar
    P384(p384::SecretKey),
    /// NIST P-521 scalar
    P521(p521::SecretKey),
}

impl EcPublicKey {
    /// Curve the point lives on
    #[must_use]
    pub fn curve(&self) -> SupportedCurve {
        match self {
            Self::P256(_) => SupportedCurve::P256,
            Self::P384(_) => SupportedCurve::P384,
            Self::P521(_) => SupportedCurve::P521,
        }
    }

    /// Build a point from its affine coordinates
    ///
    /// # Errors
    ///
    /// Returns [`JwkError::MalformedKey`] if a coordinate is wider than the
    /// curve's field or the point is not on the curve.
    pub fn from_affine_coordinates(curve: SupportedCurve, x: &BigUint, y: &BigUint) -> Result<Self> {
        let width = curve.coordinate_len();
        let mut sec1 = Vec::with_capacity(1 + 2 * width);
        sec1.push(SEC1_UNCOMPRESSED);
        sec1.extend(to_fixed_width_bytes(x, width).map_err(|e| {
            JwkError::malformed_key(format!("x coordinate does not fit {curve}: {e}"))
        })?);
        sec1.extend(to_fixed_width_bytes(y, width).map_err(|e| {
            JwkError::malformed_key(format!("y coordinate does not fit {curve}: {e}"))
        })?);

        let invalid_point =
            |_| JwkError::malformed_key(format!("point is not a valid {curve} public key"));
        match curve {
            SupportedCurve::P256 => p256::PublicKey::from_sec1_bytes(&sec1)
                .map(Self::P256)
                .map_err(invalid_point),
            SupportedCurve::P384 => p384::PublicKey::from_sec1_bytes(&sec1)
                .map(Self::P384)
                .map_err(invalid_point),
            SupportedCurve::P521 => p521::PublicKey::from_sec1_bytes(&sec1)
                .map(Self::P521)
                .map_err(invalid_point),
        }
    }

    /// Affine `(x, y)` coordinates of the point
    ///
    /// # Errors
    ///
    /// Returns [`JwkError::MalformedKey`] if the point has no affine form.
    pub fn affine_coordinates(&self) -> Result<(BigUint, BigUint)> {
        let (x, y) = match self {
            Self::P256(key) => {
                let point = key.to_encoded_point(false);
                (point.x().map(|c| c.to_vec()), point.y().map(|c| c.to_vec()))
            }
            Self::P384(key) => {
                let point = key.to_encoded_point(false);
                (point.x().map(|c| c.to_vec()), point.y().map(|c| c.to_vec()))
            }
            Self::P521(key) => {
                let point = key.to_encoded_point(false);
                (point.x().map(|c| c.to_vec()), point.y().map(|c| c.to_vec()))
            }
        };

        match (x, y) {
            (Some(x), Some(y)) => Ok((BigUint::from_bytes_be(&x), BigUint::from_bytes_be(&y))),
            _ => Err(JwkError::malformed_key(format!(
                "{} public key has no affine coordinates",
                self.curve()
            ))),
        }
    }
}

impl EcPrivateKey {
    /// Curve the scalar belongs to
    #[must_use]
    pub fn curve(&self) -> SupportedCurve {
        match self {
            Self::P256(_) => SupportedCurve::P256,
            Self::P384(_) => SupportedCurve::P384,
            Self::P521(_) => SupportedCurve::P521,
        }
    }

    /// Build a private key from its scalar `d`
    ///
    /// # Errors
    ///
    /// Returns [`JwkError::MalformedKey`] if the scalar is zero or out of range.
    pub fn from_scalar(curve: SupportedCurve, d: &BigUint) -> Result<Self> {
        let bytes = to_fixed_width_bytes(d, curve.coordinate_len())
            .map_err(|e| JwkError::malformed_key(format!("d does not fit {curve}: {e}")))?;

        let invalid_scalar = |_| JwkError::malformed_key(format!("invalid {curve} private scalar"));
        match curve {
            SupportedCurve::P256 => p256::SecretKey::from_slice(&bytes)
                .map(Self::P256)
                .map_err(invalid_scalar),
            SupportedCurve::P384 => p384::SecretKey::from_slice(&bytes)
                .map(Self::P384)
                .map_err(invalid_scalar),
            SupportedCurve::P521 => p521::SecretKey::from_slice(&bytes)
                .map(Self::P521)
                .map_err(invalid_scalar),
        }
    }

    /// The private scalar `d`
    #[must_use]
    pub fn scalar(&self) -> BigUint {
        match self {
            Self::P256(key) => BigUint::from_bytes_be(&key.to_bytes()),
            Self::P384(key) => BigUint::from_bytes_be(&key.to_bytes()),
            Self::P521(key) => BigUint::from_bytes_be(&key.to_bytes()),
        }
    }

    /// Public point derived from the scalar
    #[must_use]
    pub fn public_key(&self) -> EcPublicKey {
        match self {
            Self::P256(key) => EcPublicKey::P256(key.public_key()),
            Self::P384(key) => EcPublicKey::P384(key.public_key()),
            Self::P521(key) => EcPublicKey::P521(key.public_key()),
        }
    }
}

/// Build an RSA public key from its modulus and public exponent
///
/// # Errors
///
/// Returns [`JwkError::MalformedKey`] if `rsa` rejects the components.
pub fn rsa_public_key(n: BigUint, e: BigUint) -> Result<RsaPublicKey> {
    RsaPublicKey::new(n, e).map_err(|e| JwkError::malformed_key(format!("invalid RSA public key: {e}")))
}

/// Build an RSA private key from `n`, `e`, `d` and, when published, the primes
///
/// Without primes the factorisation is recovered from `d`.
///
/// # Errors
///
/// Returns [`JwkError::MalformedKey`] if the components are inconsistent.
pub fn rsa_private_key(n: BigUint, e: BigUint, d: BigUint, primes: Vec<BigUint>) -> Result<RsaPrivateKey> {
    let key = RsaPrivateKey::from_components(n, e, d, primes)
        .map_err(|e| JwkError::malformed_key(format!("invalid RSA private key: {e}")))?;
    key.validate()
        .map_err(|e| JwkError::malformed_key(format!("inconsistent RSA private key: {e}")))?;
    Ok(key)
}

impl PublicKey {
    /// Whether this is an RSA key
    #[must_use]
    pub fn is_rsa(&self) -> bool {
        matches!(self, Self::Rsa(_))
    }

    /// Whether this is an EC key
    #[must_use]
    pub fn is_ec(&self) -> bool {
        matches!(self, Self::Ec(_))
    }

    /// Base64url members that publish this key: `(n, e)` for RSA, full-width
    /// `(x, y)` for EC
    ///
    /// # Errors
    ///
    /// Returns [`JwkError::MalformedKey`] for an EC point without affine form.
    pub fn jwk_members(&self) -> Result<(String, String)> {
        match self {
            Self::Rsa(key) => Ok((encode_unsigned(key.n()), encode_unsigned(key.e()))),
            Self::Ec(key) => {
                let (x, y) = key.affine_coordinates()?;
                let bits = key.curve().field_size_bits();
                Ok((encode_coordinate(bits, &x)?, encode_coordinate(bits, &y)?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn test_p256_coordinates_rebuild_the_same_point() {
        let secret = p256::SecretKey::random(&mut OsRng);
        let public = EcPublicKey::P256(secret.public_key());

        let (x, y) = public.affine_coordinates().unwrap();
        let rebuilt = EcPublicKey::from_affine_coordinates(SupportedCurve::P256, &x, &y).unwrap();

        assert_eq!(rebuilt, public);
    }

    #[test]
    fn test_off_curve_point_is_malformed() {
        let err = EcPublicKey::from_affine_coordinates(
            SupportedCurve::P256,
            &BigUint::from(1u8),
            &BigUint::from(1u8),
        )
        .unwrap_err();

        assert!(matches!(err, JwkError::MalformedKey { .. }));
    }

    #[test]
    fn test_oversized_coordinate_is_malformed() {
        let too_wide = BigUint::from(1u8) << 256usize;
        let err = EcPublicKey::from_affine_coordinates(
            SupportedCurve::P256,
            &too_wide,
            &BigUint::from(1u8),
        )
        .unwrap_err();

        assert!(matches!(err, JwkError::MalformedKey { .. }));
    }

    #[test]
    fn test_p384_scalar_round_trip() {
        let secret = p384::SecretKey::random(&mut OsRng);
        let private = EcPrivateKey::P384(secret);

        let rebuilt = EcPrivateKey::from_scalar(SupportedCurve::P384, &private.scalar()).unwrap();

        assert_eq!(rebuilt, private);
        assert_eq!(rebuilt.public_key(), private.public_key());
    }

    #[test]
    fn test_jwk_members_are_full_width() {
        let secret = p256::SecretKey::random(&mut OsRng);
        let (x, y) = PublicKey::Ec(EcPublicKey::P256(secret.public_key()))
            .jwk_members()
            .unwrap();

        assert_eq!(x.len(), 43);
        assert_eq!(y.len(), 43);
    }

    #[test]
    fn test_zero_scalar_is_rejected() {
        let err = EcPrivateKey::from_scalar(SupportedCurve::P521, &BigUint::from(0u8)).unwrap_err();
        assert!(matches!(err, JwkError::MalformedKey { .. }));
    }
}
