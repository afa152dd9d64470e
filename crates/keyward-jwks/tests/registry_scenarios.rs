//! Multi-source scenarios for `JwksCacheRegistry`

mod common;

use common::{ScriptedFetcher, TestSigningKey, key_set};
use keyward_jwk::JwkSet;
use keyward_jwks::{JwksCacheRegistry, JwksError};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

fn url(path: &str) -> Url {
    Url::parse(&format!("https://idp.example.com{path}")).unwrap()
}

/// Test: source ids are case-insensitive and configuring twice reuses the cache
#[tokio::test]
async fn test_configure_is_case_insensitive() {
    // GIVEN: A registry with "Source1" configured
    let fetcher = Arc::new(ScriptedFetcher::serving(JwkSet::default()));
    let registry = JwksCacheRegistry::new(fetcher.clone());
    let first = registry
        .configure(
            "Source1",
            Duration::from_secs(3600),
            Duration::from_secs(60),
            url("/jwks"),
        )
        .await
        .unwrap();

    // WHEN: It is fetched with different case
    let found = registry.get("source1").await.expect("registered");

    // THEN: The same instance comes back
    assert!(Arc::ptr_eq(&first, &found));
    assert_eq!(found.source_id(), "source1");

    // WHEN: Reconfigured under another casing with a new URL
    let second = registry
        .configure(
            "SOURCE1",
            Duration::from_secs(1800),
            Duration::from_secs(30),
            url("/v2/jwks"),
        )
        .await
        .unwrap();

    // THEN: The existing instance was updated in place
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(registry.len().await, 1);
    assert_eq!(first.source_url().await, url("/v2/jwks"));
    assert_eq!(first.refresh_interval().await, Duration::from_secs(1800));
    assert_eq!(first.miss_backoff_interval().await, Duration::from_secs(30));

    // AND: Only the URL change fetched
    assert_eq!(fetcher.calls(), 2);
}

/// Test: reconfiguring with the same URL does not fetch
#[tokio::test]
async fn test_reconfigure_same_url_does_not_fetch() {
    let fetcher = Arc::new(ScriptedFetcher::serving(JwkSet::default()));
    let registry = JwksCacheRegistry::new(fetcher.clone());

    registry.configure_with_defaults("idp", url("/jwks")).await.unwrap();
    registry
        .configure("IDP", Duration::from_secs(10), Duration::from_secs(5), url("/jwks"))
        .await
        .unwrap();

    assert_eq!(fetcher.calls(), 1);
}

/// Test: a failed initial fetch registers nothing
#[tokio::test]
async fn test_failed_initial_fetch_is_not_registered() {
    let fetcher = Arc::new(ScriptedFetcher::serving(JwkSet::default()));
    fetcher.fail(true);
    let registry = JwksCacheRegistry::new(fetcher.clone());

    let result = registry.configure_with_defaults("idp", url("/jwks")).await;

    assert!(matches!(result, Err(JwksError::KeySourceUnavailable { .. })));
    assert!(registry.get("idp").await.is_none());
    assert!(registry.is_empty().await);

    // Once the source recovers, configuring succeeds
    fetcher.fail(false);
    registry.configure_with_defaults("idp", url("/jwks")).await.unwrap();
    assert_eq!(registry.len().await, 1);
}

/// Test: sources are independent
#[tokio::test]
async fn test_sources_are_isolated() {
    let key = TestSigningKey::generate("shared-kid");
    let fetcher = Arc::new(ScriptedFetcher::serving(key_set(&[&key.jwk])));
    let registry = JwksCacheRegistry::new(fetcher.clone());

    let a = registry.configure_with_defaults("tenant-a", url("/a/jwks")).await.unwrap();
    fetcher.publish(JwkSet::default());
    let b = registry.configure_with_defaults("tenant-b", url("/b/jwks")).await.unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
    assert!(a.find_by_key_id("shared-kid").await.unwrap().is_some());
    assert!(b.find_by_key_id("shared-kid").await.unwrap().is_none());

    // Removing one leaves the other registered
    registry.remove("Tenant-A").await;
    assert!(registry.get("tenant-a").await.is_none());
    assert!(registry.get("tenant-b").await.is_some());

    // A removed cache keeps serving its holders
    assert!(a.find_by_key_id("shared-kid").await.unwrap().is_some());
}
