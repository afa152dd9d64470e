//! ID token signature verification with keys from a [`JwksCache`]
//!
//! The key is selected by the token header's `kid` and looked up through the
//! cache, so a token signed with a freshly rotated key triggers at most one
//! refetch per miss backoff interval. Every failure rejects the token.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use keyward_jwk::{Jwk, PublicKey};
use tracing::{debug, error, warn};

use super::IdTokenClaims;
use crate::Result;
use crate::error::JwksError;
use crate::jwks::JwksCache;

/// Verifies tokens from one OpenID issuer
pub struct OpenIdKeyResolver {
    /// Expected issuer (iss claim)
    issuer: String,
    /// Key source
    cache: Arc<JwksCache>,
    /// Expected audience; not checked when `None`
    audience: Option<String>,
    /// Clock skew tolerance (default: 60 seconds)
    clock_skew_leeway: Duration,
    /// Accepted signature algorithms
    allowed_algorithms: Vec<Algorithm>,
}

impl std::fmt::Debug for OpenIdKeyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenIdKeyResolver")
            .field("issuer", &self.issuer)
            .field("source_id", &self.cache.source_id())
            .field("audience", &self.audience)
            .field("clock_skew_leeway", &self.clock_skew_leeway)
            .field("allowed_algorithms", &self.allowed_algorithms)
            .finish()
    }
}

impl OpenIdKeyResolver {
    /// Create a resolver for `issuer` backed by `cache`
    ///
    /// Defaults: 60 seconds of clock skew, no audience check, and the
    /// asymmetric algorithms RS256/384/512, PS256/384/512, ES256/384.
    pub fn new(issuer: impl Into<String>, cache: Arc<JwksCache>) -> Self {
        Self {
            issuer: issuer.into(),
            cache,
            audience: None,
            clock_skew_leeway: Duration::from_secs(60),
            allowed_algorithms: vec![
                Algorithm::RS256,
                Algorithm::RS384,
                Algorithm::RS512,
                Algorithm::PS256,
                Algorithm::PS384,
                Algorithm::PS512,
                Algorithm::ES256,
                Algorithm::ES384,
            ],
        }
    }

    /// Require `aud` to contain `audience`
    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Set custom clock skew tolerance
    #[must_use]
    pub fn with_clock_skew(mut self, leeway: Duration) -> Self {
        self.clock_skew_leeway = leeway;
        self
    }

    /// Set allowed algorithms
    ///
    /// Symmetric (HS*) algorithms are always rejected, whatever this list says.
    #[must_use]
    pub fn with_algorithms(mut self, algorithms: Vec<Algorithm>) -> Self {
        self.allowed_algorithms = algorithms;
        self
    }

    /// Expected issuer
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Cache the keys come from
    pub fn cache(&self) -> &Arc<JwksCache> {
        &self.cache
    }

    /// Verify `token`'s signature and standard claims, returning the claims
    ///
    /// # Errors
    ///
    /// - [`JwksError::InvalidSignature`] if the token is malformed, has no
    ///   `kid`, uses a disallowed algorithm, names a key the issuer does not
    ///   publish, or fails signature, issuer, expiry or audience checks
    /// - [`JwksError::KeySourceUnavailable`] if a triggered key set refresh fails
    /// - [`JwksError::Jwk`] if the published key cannot be reconstructed
    pub async fn verify_signature(&self, token: &str) -> Result<IdTokenClaims> {
        let header = decode_header(token).map_err(|e| {
            debug!(error = %e, "Failed to decode JWT header");
            JwksError::invalid_signature(format!("invalid JWT format: {e}"))
        })?;

        if is_symmetric(header.alg) || !self.allowed_algorithms.contains(&header.alg) {
            error!(
                algorithm = ?header.alg,
                allowed = ?self.allowed_algorithms,
                "JWT algorithm not allowed"
            );
            return Err(JwksError::invalid_signature(format!(
                "algorithm {:?} not allowed",
                header.alg
            )));
        }

        let key_id = header.kid.as_deref().ok_or_else(|| {
            error!("JWT missing kid (key ID) in header");
            JwksError::invalid_signature("JWT must include kid (key ID) in header")
        })?;

        let jwk = self.cache.find_by_key_id(key_id).await?.ok_or_else(|| {
            warn!(issuer = %self.issuer, key_id, "Key ID not found in JWK set");
            JwksError::invalid_signature(format!("no key with id '{key_id}'"))
        })?;

        let decoding_key = decoding_key(&jwk, header.alg)?;

        let mut validation = Validation::new(header.alg);
        validation.set_issuer(&[&self.issuer]);
        validation.leeway = self.clock_skew_leeway.as_secs();
        match &self.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        let token_data = decode::<IdTokenClaims>(token, &decoding_key, &validation).map_err(|e| {
            warn!(
                error = %e,
                issuer = %self.issuer,
                key_id,
                "JWT validation failed"
            );
            JwksError::invalid_signature(format!("JWT validation failed: {e}"))
        })?;

        debug!(
            issuer = %self.issuer,
            subject = ?token_data.claims.sub,
            algorithm = ?header.alg,
            key_id,
            "JWT validation successful"
        );

        Ok(token_data.claims)
    }
}

fn is_symmetric(algorithm: Algorithm) -> bool {
    matches!(
        algorithm,
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
    )
}

/// Build a [`DecodingKey`] for `jwk`, refusing keys declared for another algorithm
fn decoding_key(jwk: &Jwk, algorithm: Algorithm) -> Result<DecodingKey> {
    if let Some(declared) = jwk.algorithm_name()
        && Algorithm::from_str(&declared.to_ascii_uppercase()).ok() != Some(algorithm)
    {
        warn!(
            key_id = ?jwk.key_id(),
            declared,
            algorithm = ?algorithm,
            "Token algorithm does not match the key's declared algorithm"
        );
        return Err(JwksError::invalid_signature(format!(
            "key is declared for {declared}, token uses {algorithm:?}"
        )));
    }

    let public_key = jwk.to_public_key()?;
    let (first, second) = public_key.jwk_members()?;
    let built = match public_key {
        PublicKey::Rsa(_) => DecodingKey::from_rsa_components(&first, &second),
        PublicKey::Ec(_) => DecodingKey::from_ec_components(&first, &second),
    };

    built.map_err(|e| {
        error!(key_id = ?jwk.key_id(), error = %e, "Failed to create decoding key from JWK");
        JwksError::invalid_signature(format!("unusable key: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hmac_is_symmetric() {
        assert!(is_symmetric(Algorithm::HS256));
        assert!(!is_symmetric(Algorithm::ES256));
        assert!(!is_symmetric(Algorithm::RS256));
    }

    #[test]
    fn test_declared_algorithm_must_match() {
        let jwk = Jwk::parse(&serde_json::json!({
            "kty": "EC",
            "kid": "k1",
            "alg": "ES384",
            "crv": "P-256",
            "x": "f83OJ3D2xF1Bg8vub9tLe1gHMzV76e8Tus9uPHvRVEU",
            "y": "x_FEzRu9m36HLN_tue659LNpXW6pCyStikYjKIWI5a0"
        }))
        .unwrap();

        assert!(matches!(
            decoding_key(&jwk, Algorithm::ES256),
            Err(JwksError::InvalidSignature { .. })
        ));
    }

    #[test]
    fn test_undeclared_algorithm_builds_key() {
        let jwk = Jwk::parse(&serde_json::json!({
            "kty": "EC",
            "kid": "k1",
            "crv": "P-256",
            "x": "f83OJ3D2xF1Bg8vub9tLe1gHMzV76e8Tus9uPHvRVEU",
            "y": "x_FEzRu9m36HLN_tue659LNpXW6pCyStikYjKIWI5a0"
        }))
        .unwrap();

        assert!(decoding_key(&jwk, Algorithm::ES256).is_ok());
    }
}
