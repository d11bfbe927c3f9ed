mod common;

use chrono::Duration as ChronoDuration;
use chrono::Utc;
use slink::prelude::*;
use std::time::Duration;

#[tokio::test]
async fn test_round_trip_counts_exactly_one_view() {
    let stack = common::memory_stack();
    let service = common::link_service(&stack);
    let resolver = common::resolver(&stack);

    let link = service
        .create(1, "https://example.com/target".to_string(), None, None)
        .await
        .unwrap();
    let code = link.short_code.unwrap();

    let destination = resolver.resolve(&code).await.unwrap();
    assert_eq!(destination, "https://example.com/target");

    let stats = service.stats(1, &code).await.unwrap();
    assert_eq!(stats.views, 1);
}

#[tokio::test]
async fn test_cached_hits_still_count_views() {
    let stack = common::memory_stack();
    let service = common::link_service(&stack);
    let resolver = common::resolver(&stack);

    let link = service
        .create(1, "https://example.com".to_string(), None, None)
        .await
        .unwrap();
    let code = link.short_code.unwrap();

    // First resolve misses and populates the cache; the rest are hits
    // (with a store re-validation once the click threshold is reached).
    for _ in 0..5 {
        assert!(resolver.resolve(&code).await.is_ok());
    }

    let stats = service.stats(1, &code).await.unwrap();
    assert_eq!(stats.views, 5);
}

#[tokio::test]
async fn test_alias_and_code_resolve_to_the_same_destination() {
    let stack = common::memory_stack();
    let service = common::link_service(&stack);
    let resolver = common::resolver(&stack);

    service
        .create(
            1,
            "https://example.com/campaign".to_string(),
            Some("promo1".to_string()),
            None,
        )
        .await
        .unwrap();

    assert_eq!(
        resolver.resolve("promo1").await.unwrap(),
        "https://example.com/campaign"
    );
}

#[tokio::test]
async fn test_unknown_key_is_not_found() {
    let stack = common::memory_stack();
    let resolver = common::resolver(&stack);

    let result = resolver.resolve("nosuchcode").await;
    assert!(matches!(result, Err(LinkError::NotFound(_))));
}

#[tokio::test]
async fn test_resolve_after_deadline_is_expired() {
    let stack = common::memory_stack();
    let service = common::link_service(&stack);
    let resolver = common::resolver(&stack);

    let link = service
        .create(
            1,
            "https://example.com".to_string(),
            None,
            Some(Utc::now() + ChronoDuration::milliseconds(50)),
        )
        .await
        .unwrap();
    let code = link.short_code.unwrap();

    tokio::time::sleep(Duration::from_millis(80)).await;

    let result = resolver.resolve(&code).await;
    assert!(matches!(result, Err(LinkError::Expired(_))));
}

#[tokio::test]
async fn test_expiry_while_cached_is_caught_at_revalidation() {
    let (repo, cache) = common::memory_stack();
    let resolver = Resolver::new(repo.clone(), cache.clone()).with_revalidate_threshold(2);

    // Insert directly so the record can expire shortly after caching.
    let link = repo
        .insert(NewLink {
            owner_id: 1,
            long_url: "https://example.com".to_string(),
            short_code: "soonGone0042".to_string(),
            custom_alias: None,
            expires_at: Some(Utc::now() + ChronoDuration::milliseconds(50)),
        })
        .await
        .unwrap();

    // Populate the cache while the link is live.
    assert!(resolver.resolve("soonGone0042").await.is_ok());

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert!(link.expires_at.unwrap() <= Utc::now());

    // The next lookup reaches the threshold, re-validates against the
    // store, and reports the expiry instead of serving the stale entry.
    let result = resolver.resolve("soonGone0042").await;
    assert!(matches!(result, Err(LinkError::Expired(_))));

    // The cache entry is gone as well.
    assert!(cache.get_url("soonGone0042").await.unwrap().is_none());
}

#[tokio::test]
async fn test_null_cache_degrades_to_store_only_resolution() {
    let (repo, _) = common::memory_stack();
    let cache = std::sync::Arc::new(NullCache::new());
    let service = LinkService::new(repo.clone(), cache.clone());
    let resolver = Resolver::new(repo, cache);

    let link = service
        .create(1, "https://example.com".to_string(), None, None)
        .await
        .unwrap();
    let code = link.short_code.unwrap();

    for _ in 0..3 {
        assert_eq!(resolver.resolve(&code).await.unwrap(), "https://example.com");
    }

    let stats = service.stats(1, &code).await.unwrap();
    assert_eq!(stats.views, 3);
}
