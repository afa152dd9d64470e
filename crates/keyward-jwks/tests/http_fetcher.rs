//! `HttpJwkSetFetcher` against a mock JWKS endpoint

mod common;

use common::{MockIdentityProvider, TestSigningKey};
use keyward_jwk::{JwaAlgorithm, Jwk, KeyUse, PublicKey, RsaPrivateKey};
use keyward_jwks::{
    HttpFetcherConfig, HttpJwkSetFetcher, JwkSetFetcher, JwksCacheRegistry, JwksError,
};
use rand::rngs::OsRng;
use serde_json::json;
use std::sync::Arc;
use wiremock::{
    Mock, ResponseTemplate,
    matchers::{method, path},
};

/// Test: a well-formed document is fetched and parsed
#[tokio::test]
async fn test_fetch_parses_document() {
    // GIVEN: An endpoint publishing one EC and one RSA key
    let provider = MockIdentityProvider::start().await;
    let key = TestSigningKey::generate("ec-1");
    let rsa_key = RsaPrivateKey::new(&mut OsRng, 2048).unwrap();
    let rsa_jwk = Jwk::from_rsa_public_key(
        &rsa_key.to_public_key(),
        Some(KeyUse::Signature),
        Some(JwaAlgorithm::RS256),
        Some("rsa-1".to_string()),
    );
    provider
        .mock_jwks(json!({"keys": [key.jwk.to_json(), rsa_jwk.to_json()]}))
        .await;
    let fetcher = HttpJwkSetFetcher::new().unwrap();

    // WHEN: It is fetched
    let set = fetcher.fetch(&provider.jwks_url()).await.unwrap();

    // THEN: Both keys are present in document order
    assert_eq!(set.len(), 2);
    assert_eq!(set.keys()[0].key_id(), Some("ec-1"));
    assert_eq!(
        set.find_by_key_id("rsa-1").unwrap().to_public_key().unwrap(),
        PublicKey::Rsa(rsa_key.to_public_key())
    );
}

/// Test: a server error is reported as an unavailable source
#[tokio::test]
async fn test_error_status_is_unavailable() {
    let provider = MockIdentityProvider::start().await;
    provider.mock_jwks_status(500).await;
    let fetcher = HttpJwkSetFetcher::new().unwrap();

    let err = fetcher.fetch(&provider.jwks_url()).await.unwrap_err();

    match err {
        JwksError::KeySourceUnavailable { url, reason } => {
            assert_eq!(url, provider.jwks_endpoint);
            assert!(reason.contains("500"), "reason was {reason}");
        }
        other => panic!("expected KeySourceUnavailable, got {other:?}"),
    }
}

/// Test: redirects are not followed
#[tokio::test]
async fn test_redirect_is_not_followed() {
    let provider = MockIdentityProvider::start().await;
    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", "https://attacker.example/jwks"),
        )
        .mount(&provider.server)
        .await;
    let fetcher = HttpJwkSetFetcher::new().unwrap();

    let result = fetcher.fetch(&provider.jwks_url()).await;

    assert!(matches!(result, Err(JwksError::KeySourceUnavailable { .. })));
}

/// Test: oversized bodies are rejected
#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let provider = MockIdentityProvider::start().await;
    let padding = "x".repeat(4096);
    provider.mock_jwks(json!({"keys": [], "padding": padding})).await;
    let fetcher = HttpJwkSetFetcher::with_config(HttpFetcherConfig {
        max_response_size: 1024,
        ..HttpFetcherConfig::default()
    })
    .unwrap();

    let err = fetcher.fetch(&provider.jwks_url()).await.unwrap_err();

    assert!(matches!(err, JwksError::KeySourceUnavailable { ref reason, .. } if reason.contains("1024")));
}

/// Test: invalid JSON and documents without `keys` are unavailable sources
#[tokio::test]
async fn test_malformed_documents_are_unavailable() {
    let provider = MockIdentityProvider::start().await;
    Mock::given(method("GET"))
        .and(path("/not-json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&provider.server)
        .await;
    provider.mock_jwks(json!({"key": []})).await;
    let fetcher = HttpJwkSetFetcher::new().unwrap();

    let not_json = provider.jwks_url().join("/not-json").unwrap();
    assert!(matches!(
        fetcher.fetch(&not_json).await,
        Err(JwksError::KeySourceUnavailable { .. })
    ));
    assert!(matches!(
        fetcher.fetch(&provider.jwks_url()).await,
        Err(JwksError::KeySourceUnavailable { .. })
    ));
}

/// Test: one bad entry fails the whole fetch
#[tokio::test]
async fn test_one_bad_entry_fails_fetch() {
    let provider = MockIdentityProvider::start().await;
    let key = TestSigningKey::generate("ec-1");
    provider
        .mock_jwks(json!({"keys": [key.jwk.to_json(), {"kty": "EC", "crv": "P-256", "x": ""}]}))
        .await;
    let fetcher = HttpJwkSetFetcher::new().unwrap();

    let err = fetcher.fetch(&provider.jwks_url()).await.unwrap_err();

    assert!(matches!(err, JwksError::KeySourceUnavailable { .. }));
}

/// Test: the registry works end to end over HTTP
#[tokio::test]
async fn test_registry_over_http() {
    // GIVEN: A provider publishing "ec-1" and a registry using the HTTP fetcher
    let provider = MockIdentityProvider::start().await;
    let key = TestSigningKey::generate("ec-1");
    provider.mock_jwks(json!({"keys": [key.jwk.to_json()]})).await;
    let registry = Arc::new(JwksCacheRegistry::with_http_fetcher(HttpFetcherConfig::default()).unwrap());

    // WHEN: The source is configured and queried
    let cache = registry
        .configure_with_defaults("Mock-IdP", provider.jwks_url())
        .await
        .unwrap();
    let found = cache.find_by_key_id("ec-1").await.unwrap();

    // THEN: The key round-trips through the wire format unchanged
    assert_eq!(found, Some(key.jwk.clone()));
    assert_eq!(provider.server.received_requests().await.unwrap().len(), 1);
}
