//! Common test utilities for integration tests
//!
//! Scriptable in-memory fetcher, a wiremock identity provider, and key / token
//! helpers.

#![allow(dead_code)]

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use keyward_jwk::{EcPublicKey, Jwk, JwkSet, KeyUse};
use keyward_jwks::{JwkSetFetcher, JwksError, Result};
use p256::pkcs8::EncodePrivateKey;
use rand::rngs::OsRng;
use serde_json::json;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

/// In-memory fetcher that serves whatever document it currently holds
///
/// Counts calls and records the URLs requested.
pub struct ScriptedFetcher {
    document: Mutex<JwkSet>,
    failing: AtomicBool,
    calls: AtomicUsize,
    urls: Mutex<Vec<Url>>,
}

impl ScriptedFetcher {
    pub fn serving(document: JwkSet) -> Self {
        Self {
            document: Mutex::new(document),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
        }
    }

    /// Replace the document served by subsequent fetches
    pub fn publish(&self, document: JwkSet) {
        *self.document.lock().unwrap() = document;
    }

    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested_urls(&self) -> Vec<Url> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl JwkSetFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &Url) -> Result<JwkSet> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url.clone());

        if self.failing.load(Ordering::SeqCst) {
            return Err(JwksError::KeySourceUnavailable {
                url: url.to_string(),
                reason: "HTTP 503 Service Unavailable".to_string(),
            });
        }
        Ok(self.document.lock().unwrap().clone())
    }
}

/// P-256 signing key with its published JWK
pub struct TestSigningKey {
    pub secret: p256::SecretKey,
    pub jwk: Jwk,
}

impl TestSigningKey {
    pub fn generate(kid: &str) -> Self {
        Self::generate_for(kid, Some(KeyUse::Signature))
    }

    pub fn generate_for(kid: &str, key_use: Option<KeyUse>) -> Self {
        let secret = p256::SecretKey::random(&mut OsRng);
        let jwk = Jwk::from_ec_key_pair(
            &EcPublicKey::P256(secret.public_key()),
            None,
            key_use,
            Some(kid.to_string()),
        )
        .expect("P-256 key converts to JWK");

        Self { secret, jwk }
    }

    /// Sign `claims` as an ES256 JWT carrying this key's kid
    pub fn sign(&self, claims: &serde_json::Value) -> String {
        self.sign_with_kid(claims, self.jwk.key_id())
    }

    pub fn sign_with_kid(&self, claims: &serde_json::Value, kid: Option<&str>) -> String {
        let pkcs8_der = self.secret.to_pkcs8_der().expect("PKCS#8 encoding");
        let key = EncodingKey::from_ec_der(pkcs8_der.as_bytes());

        let mut header = Header::new(Algorithm::ES256);
        header.typ = Some("JWT".to_string());
        header.kid = kid.map(str::to_string);

        encode(&header, claims, &key).expect("Failed to encode test JWT")
    }
}

/// Key set holding the given keys
pub fn key_set(keys: &[&Jwk]) -> JwkSet {
    JwkSet::new(keys.iter().map(|jwk| (*jwk).clone()).collect())
}

/// Mock identity provider serving a well-known configuration and a JWK set
pub struct MockIdentityProvider {
    pub server: MockServer,
    pub issuer: String,
    pub jwks_endpoint: String,
    pub configuration_endpoint: String,
}

impl MockIdentityProvider {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let base_url = server.uri();

        Self {
            issuer: base_url.clone(),
            jwks_endpoint: format!("{base_url}/jwks"),
            configuration_endpoint: format!("{base_url}/.well-known/openid-configuration"),
            server,
        }
    }

    pub fn jwks_url(&self) -> Url {
        Url::parse(&self.jwks_endpoint).unwrap()
    }

    pub fn configuration_url(&self) -> Url {
        Url::parse(&self.configuration_endpoint).unwrap()
    }

    /// Mock JWKS endpoint with the given document body
    pub async fn mock_jwks(&self, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Mock JWKS endpoint returning `status` with an empty body
    pub async fn mock_jwks_status(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Mock a well-known configuration pointing at this provider's JWKS endpoint
    pub async fn mock_configuration(&self) {
        self.mock_configuration_body(json!({
            "issuer": self.issuer,
            "jwks_uri": self.jwks_endpoint,
            "authorization_endpoint": format!("{}/authorize", self.issuer),
        }))
        .await;
    }

    pub async fn mock_configuration_body(&self, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/.well-known/openid-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }
}

/// Route library logs to the test output; `RUST_LOG` controls verbosity
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Get current Unix timestamp
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_secs()
}

/// Create ID token claims with standard fields
pub fn id_token_claims(sub: &str, iss: &str, aud: &str, exp_offset_secs: i64) -> serde_json::Value {
    let now = current_timestamp();
    json!({
        "sub": sub,
        "iss": iss,
        "aud": aud,
        "exp": (now as i64 + exp_offset_secs) as u64,
        "iat": now,
        "nbf": now,
    })
}
