//! Single JSON Web Key records (RFC 7517)
//!
//! A [`Jwk`] is parsed from its wire object all at once: the key type decides
//! which members are required, and a record missing one of them is rejected
//! up front rather than when the key is first used. Conversion to native key
//! material happens lazily through [`Jwk::to_public_key`] and
//! [`Jwk::to_private_key`].

use std::fmt;
use std::str::FromStr;

use rsa::RsaPublicKey;
use rsa::traits::PublicKeyParts;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Result;
use crate::algorithm::JwaAlgorithm;
use crate::codec::{decode_coordinate, encode_coordinate, encode_unsigned};
use crate::curve::SupportedCurve;
use crate::error::JwkError;
use crate::keys::{
    EcPrivateKey, EcPublicKey, KeyPair, PrivateKey, PublicKey, rsa_private_key, rsa_public_key,
};

/// Intended use of a key, from the `use` member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyUse {
    /// Signature creation or verification
    #[serde(rename = "sig")]
    Signature,
    /// Key encryption
    #[serde(rename = "enc")]
    Encryption,
}

impl KeyUse {
    /// Wire name of the use
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Signature => "sig",
            Self::Encryption => "enc",
        }
    }
}

impl FromStr for KeyUse {
    type Err = JwkError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sig" => Ok(Self::Signature),
            "enc" => Ok(Self::Encryption),
            other => Err(JwkError::malformed_key(format!(
                "unrecognised key use '{other}'"
            ))),
        }
    }
}

impl fmt::Display for KeyUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key family, from the `kty` member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    /// RSA key
    Rsa,
    /// Elliptic curve key
    Ec,
}

impl KeyType {
    /// Wire name of the key type
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rsa => "RSA",
            Self::Ec => "EC",
        }
    }
}

impl FromStr for KeyType {
    type Err = JwkError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "RSA" => Ok(Self::Rsa),
            "EC" => Ok(Self::Ec),
            other => Err(JwkError::malformed_key(format!(
                "unrecognised key type '{other}'"
            ))),
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RSA members, all base64url unsigned big-endian integers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaParameters {
    /// Modulus
    pub n: String,
    /// Public exponent
    pub e: String,
    /// Private exponent
    pub d: Option<String>,
    /// First prime factor
    pub p: Option<String>,
    /// Second prime factor
    pub q: Option<String>,
}

/// EC members; coordinates and scalar are fixed-width base64url integers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcParameters {
    /// Curve name
    pub crv: String,
    /// Affine x coordinate
    pub x: String,
    /// Affine y coordinate
    pub y: String,
    /// Private scalar
    pub d: Option<String>,
}

/// Type-specific key members
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyParameters {
    /// RSA key members
    Rsa(RsaParameters),
    /// EC key members
    Ec(EcParameters),
}

/// One key record from a JWK set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "WireJwk", try_from = "WireJwk")]
pub struct Jwk {
    key_use: Option<KeyUse>,
    algorithm: Option<String>,
    key_id: Option<String>,
    x509_url: Option<String>,
    x509_thumbprint: Option<String>,
    x509_chain: Option<Vec<String>>,
    parameters: KeyParameters,
}

impl Jwk {
    /// Parse a key from its JSON object
    ///
    /// # Errors
    ///
    /// Returns [`JwkError::MalformedKey`] if `kty` is missing or unrecognised,
    /// `use` is neither `sig` nor `enc`, or a member the key type requires is
    /// missing or empty.
    pub fn parse(value: &Value) -> Result<Self> {
        let wire = WireJwk::deserialize(value)
            .map_err(|e| JwkError::malformed_key(format!("invalid JWK object: {e}")))?;
        Self::try_from(wire)
    }

    /// Parse a key from JSON text
    ///
    /// # Errors
    ///
    /// Same as [`Jwk::parse`], plus [`JwkError::MalformedKey`] for invalid JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| JwkError::malformed_key(format!("invalid JSON: {e}")))?;
        Self::parse(&value)
    }

    /// Build an EC key from native key material
    ///
    /// `alg` is set to the ECDSA algorithm of the curve and the coordinates are
    /// written at the full width of the curve's field.
    ///
    /// # Errors
    ///
    /// Returns [`JwkError::MalformedKey`] if the private key is on a different
    /// curve from the public key.
    pub fn from_ec_key_pair(
        public: &EcPublicKey,
        private: Option<&EcPrivateKey>,
        key_use: Option<KeyUse>,
        key_id: Option<String>,
    ) -> Result<Self> {
        let curve = public.curve();
        let (x, y) = public.affine_coordinates()?;
        let d = match private {
            Some(private) if private.curve() != curve => {
                return Err(JwkError::malformed_key(format!(
                    "private key is on {} but public key is on {curve}",
                    private.curve()
                )));
            }
            Some(private) => Some(encode_coordinate(curve.field_size_bits(), &private.scalar())?),
            None => None,
        };

        Ok(Self {
            key_use,
            algorithm: Some(curve.jws_algorithm().as_str().to_string()),
            key_id,
            x509_url: None,
            x509_thumbprint: None,
            x509_chain: None,
            parameters: KeyParameters::Ec(EcParameters {
                crv: curve.standard_name().to_string(),
                x: encode_coordinate(curve.field_size_bits(), &x)?,
                y: encode_coordinate(curve.field_size_bits(), &y)?,
                d,
            }),
        })
    }

    /// Build a public RSA key record
    #[must_use]
    pub fn from_rsa_public_key(
        key: &RsaPublicKey,
        key_use: Option<KeyUse>,
        algorithm: Option<JwaAlgorithm>,
        key_id: Option<String>,
    ) -> Self {
        Self {
            key_use,
            algorithm: algorithm.map(|alg| alg.as_str().to_string()),
            key_id,
            x509_url: None,
            x509_thumbprint: None,
            x509_chain: None,
            parameters: KeyParameters::Rsa(RsaParameters {
                n: encode_unsigned(key.n()),
                e: encode_unsigned(key.e()),
                d: None,
                p: None,
                q: None,
            }),
        }
    }

    /// Attach an X.509 URL (`x5u`)
    #[must_use]
    pub fn with_x509_url(mut self, url: impl Into<String>) -> Self {
        self.x509_url = Some(url.into());
        self
    }

    /// Attach an X.509 thumbprint (`x5t`)
    #[must_use]
    pub fn with_x509_thumbprint(mut self, thumbprint: impl Into<String>) -> Self {
        self.x509_thumbprint = Some(thumbprint.into());
        self
    }

    /// Attach an X.509 certificate chain (`x5c`)
    #[must_use]
    pub fn with_x509_chain(mut self, chain: Vec<String>) -> Self {
        self.x509_chain = Some(chain);
        self
    }

    /// Key family
    #[must_use]
    pub fn key_type(&self) -> KeyType {
        match self.parameters {
            KeyParameters::Rsa(_) => KeyType::Rsa,
            KeyParameters::Ec(_) => KeyType::Ec,
        }
    }

    /// Declared use, if any
    #[must_use]
    pub fn key_use(&self) -> Option<KeyUse> {
        self.key_use
    }

    /// `alg` exactly as published
    #[must_use]
    pub fn algorithm_name(&self) -> Option<&str> {
        self.algorithm.as_deref()
    }

    /// Declared algorithm, interpreted
    ///
    /// # Errors
    ///
    /// Returns [`JwkError::MalformedKey`] if `alg` names an unknown algorithm.
    pub fn algorithm(&self) -> Result<Option<JwaAlgorithm>> {
        self.algorithm.as_deref().map(str::parse).transpose()
    }

    /// Key id, if any
    #[must_use]
    pub fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    /// X.509 URL
    #[must_use]
    pub fn x509_url(&self) -> Option<&str> {
        self.x509_url.as_deref()
    }

    /// X.509 thumbprint
    #[must_use]
    pub fn x509_thumbprint(&self) -> Option<&str> {
        self.x509_thumbprint.as_deref()
    }

    /// X.509 certificate chain
    #[must_use]
    pub fn x509_chain(&self) -> Option<&[String]> {
        self.x509_chain.as_deref()
    }

    /// Type-specific members
    #[must_use]
    pub fn parameters(&self) -> &KeyParameters {
        &self.parameters
    }

    /// Whether the record carries private key material
    #[must_use]
    pub fn has_private_material(&self) -> bool {
        match &self.parameters {
            KeyParameters::Rsa(rsa) => rsa.d.is_some(),
            KeyParameters::Ec(ec) => ec.d.is_some(),
        }
    }

    /// True when `alg` equals `algorithm` ignoring case and, if a use is
    /// requested, the declared use is that use
    #[must_use]
    pub fn matches(&self, algorithm: JwaAlgorithm, key_use: Option<KeyUse>) -> bool {
        let same_algorithm = self
            .algorithm
            .as_deref()
            .is_some_and(|alg| alg.eq_ignore_ascii_case(algorithm.as_str()));
        same_algorithm && (key_use.is_none() || self.key_use == key_use)
    }

    /// Rebuild the native public key
    ///
    /// # Errors
    ///
    /// Returns [`JwkError::UnsupportedCurve`] for an unknown `crv`,
    /// [`JwkError::Encoding`] for undecodable members and
    /// [`JwkError::MalformedKey`] if the key material is invalid.
    pub fn to_public_key(&self) -> Result<PublicKey> {
        match &self.parameters {
            KeyParameters::Rsa(rsa) => {
                let n = decode_coordinate(&rsa.n)?;
                let e = decode_coordinate(&rsa.e)?;
                Ok(PublicKey::Rsa(rsa_public_key(n, e)?))
            }
            KeyParameters::Ec(ec) => {
                let curve = SupportedCurve::from_name(&ec.crv)?;
                let x = decode_coordinate(&ec.x)?;
                let y = decode_coordinate(&ec.y)?;
                Ok(PublicKey::Ec(EcPublicKey::from_affine_coordinates(curve, &x, &y)?))
            }
        }
    }

    /// Rebuild the native private key
    ///
    /// # Errors
    ///
    /// Returns [`JwkError::KeyMaterialAbsent`] when `d` is not published, and
    /// otherwise the same errors as [`Jwk::to_public_key`].
    pub fn to_private_key(&self) -> Result<PrivateKey> {
        match &self.parameters {
            KeyParameters::Rsa(rsa) => {
                let d = rsa.d.as_deref().ok_or_else(|| self.no_private_material())?;
                let primes = match (&rsa.p, &rsa.q) {
                    (Some(p), Some(q)) => vec![decode_coordinate(p)?, decode_coordinate(q)?],
                    _ => Vec::new(),
                };
                let key = rsa_private_key(
                    decode_coordinate(&rsa.n)?,
                    decode_coordinate(&rsa.e)?,
                    decode_coordinate(d)?,
                    primes,
                )?;
                Ok(PrivateKey::Rsa(key))
            }
            KeyParameters::Ec(ec) => {
                let d = ec.d.as_deref().ok_or_else(|| self.no_private_material())?;
                let curve = SupportedCurve::from_name(&ec.crv)?;
                let scalar = decode_coordinate(d)?;
                Ok(PrivateKey::Ec(EcPrivateKey::from_scalar(curve, &scalar)?))
            }
        }
    }

    /// Rebuild both halves
    ///
    /// # Errors
    ///
    /// Same as [`Jwk::to_private_key`], plus [`JwkError::MalformedKey`] when
    /// the published public members do not belong to the private key.
    pub fn to_key_pair(&self) -> Result<KeyPair> {
        let public = self.to_public_key()?;
        let private = self.to_private_key()?;

        let consistent = match (&public, &private) {
            (PublicKey::Rsa(public), PrivateKey::Rsa(private)) => *public == private.to_public_key(),
            (PublicKey::Ec(public), PrivateKey::Ec(private)) => *public == private.public_key(),
            _ => false,
        };
        if !consistent {
            return Err(JwkError::malformed_key(
                "public members do not match the private key",
            ));
        }

        Ok(KeyPair { public, private })
    }

    /// Wire form of the record
    #[must_use]
    pub fn to_json(&self) -> Value {
        WireJwk::from(self.clone()).into_json()
    }

    fn no_private_material(&self) -> JwkError {
        JwkError::KeyMaterialAbsent {
            reason: format!(
                "{} key {} has no private component",
                self.key_type(),
                self.key_id.as_deref().unwrap_or("<no kid>")
            ),
        }
    }
}

/// Flat wire shape shared by every key type
#[derive(Debug, Default, Serialize, Deserialize)]
struct WireJwk {
    #[serde(skip_serializing_if = "Option::is_none")]
    kty: Option<String>,
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    key_use: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    x5u: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    x5t: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    x5c: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    crv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    x: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    y: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    n: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    e: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    d: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    p: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    q: Option<String>,
}

impl WireJwk {
    fn into_json(self) -> Value {
        let mut members = Map::new();
        let strings = [
            ("kty", self.kty),
            ("use", self.key_use),
            ("alg", self.alg),
            ("kid", self.kid),
            ("x5u", self.x5u),
            ("x5t", self.x5t),
            ("crv", self.crv),
            ("x", self.x),
            ("y", self.y),
            ("n", self.n),
            ("e", self.e),
            ("d", self.d),
            ("p", self.p),
            ("q", self.q),
        ];
        for (name, value) in strings {
            if let Some(value) = value {
                members.insert(name.to_string(), Value::String(value));
            }
        }
        if let Some(chain) = self.x5c {
            members.insert(
                "x5c".to_string(),
                Value::Array(chain.into_iter().map(Value::String).collect()),
            );
        }
        Value::Object(members)
    }
}

fn required(value: Option<String>, member: &str, key_type: KeyType) -> Result<String> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        Some(_) => Err(JwkError::malformed_key(format!(
            "{key_type} key has an empty '{member}' member"
        ))),
        None => Err(JwkError::malformed_key(format!(
            "{key_type} key is missing the '{member}' member"
        ))),
    }
}

impl TryFrom<WireJwk> for Jwk {
    type Error = JwkError;

    fn try_from(wire: WireJwk) -> Result<Self> {
        let key_type: KeyType = wire
            .kty
            .as_deref()
            .ok_or_else(|| JwkError::malformed_key("missing 'kty' member"))?
            .parse()?;
        let key_use: Option<KeyUse> = wire.key_use.as_deref().map(str::parse).transpose()?;

        let parameters = match key_type {
            KeyType::Rsa => KeyParameters::Rsa(RsaParameters {
                n: required(wire.n, "n", key_type)?,
                e: required(wire.e, "e", key_type)?,
                d: wire.d,
                p: wire.p,
                q: wire.q,
            }),
            KeyType::Ec => KeyParameters::Ec(EcParameters {
                crv: required(wire.crv, "crv", key_type)?,
                x: required(wire.x, "x", key_type)?,
                y: required(wire.y, "y", key_type)?,
                d: wire.d,
            }),
        };

        Ok(Self {
            key_use,
            algorithm: wire.alg,
            key_id: wire.kid,
            x509_url: wire.x5u,
            x509_thumbprint: wire.x5t,
            x509_chain: wire.x5c,
            parameters,
        })
    }
}

impl From<Jwk> for WireJwk {
    fn from(jwk: Jwk) -> Self {
        let mut wire = Self {
            kty: Some(jwk.key_type().as_str().to_string()),
            key_use: jwk.key_use.map(|u| u.as_str().to_string()),
            alg: jwk.algorithm,
            kid: jwk.key_id,
            x5u: jwk.x509_url,
            x5t: jwk.x509_thumbprint,
            x5c: jwk.x509_chain,
            ..Self::default()
        };
        match jwk.parameters {
            KeyParameters::Rsa(rsa) => {
                wire.n = Some(rsa.n);
                wire.e = Some(rsa.e);
                wire.d = rsa.d;
                wire.p = rsa.p;
                wire.q = rsa.q;
            }
            KeyParameters::Ec(ec) => {
                wire.crv = Some(ec.crv);
                wire.x = Some(ec.x);
                wire.y = Some(ec.y);
                wire.d = ec.d;
            }
        }
        wire
    }
}
