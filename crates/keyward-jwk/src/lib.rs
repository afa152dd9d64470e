//! # Keyward JWK - JSON Web Keys and key sets
//!
//! Wire-format JSON Web Keys (RFC 7517) and the conversions between them and
//! native RSA / elliptic curve keys.
//!
//! ## Core Features
//!
//! - **Strict parsing** - a key set with one malformed entry is rejected whole
//! - **Fixed-width coordinates** - EC members are always written at the full
//!   width of the curve's field
//! - **Native keys** - RSA via `rsa`, P-256 / P-384 / P-521 via the RustCrypto
//!   curve crates
//! - **Key selection** - lookup by `kid`, or by algorithm and use with a
//!   fallback to keys that declare no use
//!
//! ## Architecture
//!
//! - `codec` - base64url big-endian integer encoding
//! - `curve` - supported named curves
//! - `algorithm` - JWA algorithm names
//! - `jwk` - single key records
//! - `set` - key set documents
//! - `keys` - native key material
//! - `error` - error types
//!
//! ## Example
//!
//! ```rust
//! use keyward_jwk::{JwaAlgorithm, JwkSet, KeyUse};
//!
//! let set = JwkSet::from_json_str(r#"{"keys": [{
//!     "kty": "EC", "kid": "k1", "use": "sig", "alg": "ES256", "crv": "P-256",
//!     "x": "f83OJ3D2xF1Bg8vub9tLe1gHMzV76e8Tus9uPHvRVEU",
//!     "y": "x_FEzRu9m36HLN_tue659LNpXW6pCyStikYjKIWI5a0"
//! }]}"#)?;
//!
//! let jwk = set
//!     .find_by_algorithm_and_use(JwaAlgorithm::ES256, Some(KeyUse::Signature))
//!     .expect("key is published");
//! let public_key = jwk.to_public_key()?;
//! assert!(public_key.is_ec());
//! # Ok::<(), keyward_jwk::JwkError>(())
//! ```

pub mod algorithm;
pub mod codec;
pub mod curve;
pub mod error;
pub mod jwk;
pub mod keys;
pub mod set;

pub use algorithm::JwaAlgorithm;
pub use curve::SupportedCurve;
pub use error::JwkError;
pub use jwk::{EcParameters, Jwk, KeyParameters, KeyType, KeyUse, RsaParameters};
pub use keys::{EcPrivateKey, EcPublicKey, KeyPair, PrivateKey, PublicKey};
pub use set::JwkSet;

/// Re-exported so callers can build and inspect key material without
/// depending on `rsa` directly
pub use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};

/// JWK result type
pub type Result<T> = std::result::Result<T, JwkError>;
