//! Signed ID token verification against a cached key set
//!
//! # Modules
//!
//! - `resolver` - [`OpenIdKeyResolver`], selects the key by `kid` and checks the signature

pub mod resolver;

pub use resolver::OpenIdKeyResolver;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// `aud` claim, which RFC 7519 allows as a single string or an array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    /// One audience
    Single(String),
    /// Several audiences
    Multiple(Vec<String>),
}

impl Audience {
    /// Whether `audience` is among the values
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Self::Single(value) => value == audience,
            Self::Multiple(values) => values.iter().any(|v| v == audience),
        }
    }
}

/// Claims of a verified ID token
///
/// The registered claims of RFC 7519 Section 4.1 plus `nonce`; everything else
/// lands in `additional`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct IdTokenClaims {
    /// Issuer (iss)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Subject (sub)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Audience (aud)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,

    /// Expiration Time (exp) - Unix timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,

    /// Not Before (nbf) - Unix timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<u64>,

    /// Issued At (iat) - Unix timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,

    /// JWT ID (jti)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// OpenID Connect nonce
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    /// Additional claims
    #[serde(flatten)]
    pub additional: HashMap<String, serde_json::Value>,
}
