//! JWK set documents (`{"keys": [...]}`)

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::warn;

use crate::Result;
use crate::algorithm::JwaAlgorithm;
use crate::error::JwkError;
use crate::jwk::{Jwk, KeyUse};
use crate::keys::PublicKey;

/// Ordered, immutable collection of keys
///
/// Document order is kept for serialization and decides which entry wins
/// when several share a key id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JwkSet {
    keys: Vec<Jwk>,
}

impl JwkSet {
    /// Wrap already-parsed keys
    #[must_use]
    pub fn new(keys: Vec<Jwk>) -> Self {
        Self { keys }
    }

    /// Parse a document from its JSON value
    ///
    /// A single bad entry fails the whole document.
    ///
    /// # Errors
    ///
    /// Returns [`JwkError::MalformedDocument`] if `keys` is missing or is not
    /// an array, and the entry's error if any entry fails to parse.
    pub fn parse(value: &Value) -> Result<Self> {
        let entries = value
            .get("keys")
            .ok_or_else(|| JwkError::malformed_document("missing 'keys' member"))?
            .as_array()
            .ok_or_else(|| JwkError::malformed_document("'keys' is not an array"))?;

        let keys = entries.iter().map(Jwk::parse).collect::<Result<Vec<_>>>()?;
        Ok(Self { keys })
    }

    /// Parse a document from JSON text
    ///
    /// # Errors
    ///
    /// Same as [`JwkSet::parse`], plus [`JwkError::MalformedDocument`] for
    /// invalid JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| JwkError::malformed_document(format!("invalid JSON: {e}")))?;
        Self::parse(&value)
    }

    /// First key, in document order, whose `kid` equals `kid`
    #[must_use]
    pub fn find_by_key_id(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|jwk| jwk.key_id() == Some(kid))
    }

    /// First key bound to `algorithm` with exactly the requested use
    ///
    /// When a use was requested and no key declares it, a second pass accepts
    /// keys that declare no use at all. Keys whose `alg` cannot be interpreted
    /// are logged and skipped.
    #[must_use]
    pub fn find_by_algorithm_and_use(
        &self,
        algorithm: JwaAlgorithm,
        key_use: Option<KeyUse>,
    ) -> Option<&Jwk> {
        let found = self.keys.iter().find(|jwk| match jwk.algorithm() {
            Ok(alg) => alg == Some(algorithm) && jwk.key_use() == key_use,
            Err(e) => {
                warn!(
                    kid = jwk.key_id().unwrap_or("<none>"),
                    error = %e,
                    "Skipping JWK with unreadable algorithm"
                );
                false
            }
        });

        match (found, key_use) {
            (None, Some(_)) => self.find_by_algorithm_and_use(algorithm, None),
            (found, _) => found,
        }
    }

    /// Native public keys indexed by key id
    ///
    /// Keys without a `kid` are left out; for duplicate ids the first key wins.
    ///
    /// # Errors
    ///
    /// Returns the conversion error of the first key that cannot be rebuilt.
    pub fn public_keys_by_id(&self) -> Result<HashMap<String, PublicKey>> {
        let mut map = HashMap::with_capacity(self.keys.len());
        for jwk in &self.keys {
            let Some(kid) = jwk.key_id() else {
                continue;
            };
            if let Entry::Vacant(slot) = map.entry(kid.to_string()) {
                slot.insert(jwk.to_public_key()?);
            }
        }
        Ok(map)
    }

    /// Wire form of the document
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut document = Map::new();
        document.insert(
            "keys".to_string(),
            Value::Array(self.keys.iter().map(Jwk::to_json).collect()),
        );
        Value::Object(document)
    }

    /// All keys in document order
    #[must_use]
    pub fn keys(&self) -> &[Jwk] {
        &self.keys
    }

    /// Iterate the keys in document order
    pub fn iter(&self) -> std::slice::Iter<'_, Jwk> {
        self.keys.iter()
    }

    /// Number of keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the document holds no keys
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl<'a> IntoIterator for &'a JwkSet {
    type Item = &'a Jwk;
    type IntoIter = std::slice::Iter<'a, Jwk>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}

impl Serialize for JwkSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for JwkSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::parse(&value).map_err(serde::de::Error::custom)
    }
}
