//! Well-known OpenID configuration document

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

use crate::Result;
use crate::error::JwksError;

/// The members of an OpenID provider configuration this crate reads
///
/// Everything else in the document is kept in `additional_fields` untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WellKnownConfiguration {
    /// Issuer identifier; tokens must carry it in `iss`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,

    /// URL of the issuer's JWK set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwks_uri: Option<String>,

    /// Additional metadata fields
    #[serde(flatten)]
    pub additional_fields: HashMap<String, serde_json::Value>,
}

/// A configuration whose issuer and key set URL have been checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedConfiguration {
    /// Non-empty issuer identifier
    pub issuer: String,
    /// Parsed key set URL
    pub jwks_uri: Url,
}

impl WellKnownConfiguration {
    /// Configuration with just the two members
    pub fn new(issuer: impl Into<String>, jwks_uri: impl Into<String>) -> Self {
        Self {
            issuer: Some(issuer.into()),
            jwks_uri: Some(jwks_uri.into()),
            additional_fields: HashMap::new(),
        }
    }

    /// Check that `issuer` is non-empty and `jwks_uri` is a well-formed URL
    ///
    /// # Errors
    ///
    /// Returns [`JwksError::InvalidConfiguration`] naming the offending member.
    pub fn validate(&self) -> Result<ValidatedConfiguration> {
        let issuer = non_empty(self.issuer.as_deref(), "issuer")?;
        let jwks_uri = non_empty(self.jwks_uri.as_deref(), "jwks_uri")?;

        let jwks_uri = Url::parse(jwks_uri).map_err(|e| {
            JwksError::invalid_configuration(format!("jwks_uri '{jwks_uri}' is not a valid URL: {e}"))
        })?;

        Ok(ValidatedConfiguration {
            issuer: issuer.to_string(),
            jwks_uri,
        })
    }
}

fn non_empty<'a>(value: Option<&'a str>, member: &str) -> Result<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(JwksError::invalid_configuration(format!(
            "well-known configuration has no {member}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extra_members_are_kept() {
        let config: WellKnownConfiguration = serde_json::from_str(
            r#"{
                "issuer": "https://idp.example.com",
                "jwks_uri": "https://idp.example.com/jwks",
                "token_endpoint": "https://idp.example.com/token"
            }"#,
        )
        .unwrap();

        assert!(config.additional_fields.contains_key("token_endpoint"));
        let validated = config.validate().unwrap();
        assert_eq!(validated.issuer, "https://idp.example.com");
        assert_eq!(validated.jwks_uri.path(), "/jwks");
    }

    #[test]
    fn test_missing_issuer() {
        let config: WellKnownConfiguration =
            serde_json::from_str(r#"{"jwks_uri": "https://idp.example.com/jwks"}"#).unwrap();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, JwksError::InvalidConfiguration { ref reason } if reason.contains("issuer")));
    }

    #[test]
    fn test_empty_issuer() {
        let config = WellKnownConfiguration::new("", "https://idp.example.com/jwks");
        assert!(matches!(
            config.validate(),
            Err(JwksError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_empty_jwks_uri() {
        let config = WellKnownConfiguration::new("https://idp.example.com", "");
        let err = config.validate().unwrap_err();
        assert!(matches!(err, JwksError::InvalidConfiguration { ref reason } if reason.contains("jwks_uri")));
    }

    #[test]
    fn test_malformed_jwks_uri() {
        let config = WellKnownConfiguration::new("https://idp.example.com", "not a url");
        assert!(matches!(
            config.validate(),
            Err(JwksError::InvalidConfiguration { .. })
        ));
    }
}
